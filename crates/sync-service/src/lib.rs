//! Sync Service Library
//!
//! An HTTP service that authenticates callers with Google-issued identity
//! tokens and, for each authenticated request, mirrors a source storage
//! location into a destination location.
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> middleware/auth.rs -> handlers/sync.rs -> services/sync_trigger.rs
//!                        |
//!                  auth/jwt.rs -> auth/jwks.rs (KeySetCache) <- tasks/jwks_refresh.rs
//! ```
//!
//! # Modules
//!
//! - `auth` - JWKS key set, token verification, claims
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Authentication gate and HTTP metrics
//! - `observability` - Prometheus metrics
//! - `routes` - Axum router setup
//! - `services` - Sync trigger
//! - `tasks` - Background JWKS refresh

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod routes;
pub mod services;
pub mod tasks;
