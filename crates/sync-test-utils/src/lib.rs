//! # Sync Test Utilities
//!
//! Shared test utilities for the sync service.
//!
//! This crate provides:
//! - Deterministic RSA keypairs and JWKS documents (`crypto_fixtures`)
//! - Identity token claim builders (`token_builders`)
//! - Server test harness (`TestSyncServer` for E2E tests)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sync_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<()> {
//!     let keypair = TestKeypair::primary();
//!     let server = TestSyncServer::spawn(
//!         key_set_for(&[&keypair])?,
//!         Arc::new(MockSyncTrigger::succeeding()),
//!     )
//!     .await?;
//!
//!     let token = keypair.sign(&IdTokenClaimsBuilder::new().build())?;
//!     let response = reqwest::Client::new()
//!         .get(server.url())
//!         .bearer_auth(token)
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod crypto_fixtures;
pub mod server_harness;
pub mod token_builders;

// Re-export commonly used items
pub use crypto_fixtures::*;
pub use server_harness::*;
pub use token_builders::*;
