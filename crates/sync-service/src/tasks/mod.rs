//! Background tasks.
//!
//! - `jwks_refresh` - Periodic re-fetch of the signing-key set

pub mod jwks_refresh;

pub use jwks_refresh::start_jwks_refresh;
