//! Identity token authentication.
//!
//! - `jwks` - Signing-key set fetching, caching and lookup
//! - `jwt` - Identity token verification
//! - `claims` - Verified claims and the request identity

pub mod claims;
pub mod jwks;
pub mod jwt;

pub use claims::{Audience, AuthenticatedIdentity, IdentityClaims};
pub use jwks::{JwksClient, JwksError, KeySetCache, SigningKey, SigningKeySet};
pub use jwt::{IdTokenVerifier, VerifierSettings};
