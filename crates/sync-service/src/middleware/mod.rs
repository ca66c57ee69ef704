//! Middleware for the sync service.
//!
//! - `auth` - Bearer token verification for protected routes
//! - `http_metrics` - HTTP request metrics for all responses

pub mod auth;
pub mod http_metrics;

pub use auth::{require_auth, AuthState, IdentityExt};
pub use http_metrics::http_metrics_middleware;
