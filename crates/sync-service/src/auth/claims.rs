//! Identity token claims.
//!
//! `sub` and `email` identify a principal and are redacted in Debug output.
//! `aud` may be a single string or a list, as RFC 7519 allows.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Claims carried by a Google-issued identity token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Email of the calling service account or user - redacted in Debug output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Whether Google verified the email.
    #[serde(default)]
    pub email_verified: bool,

    /// Authorized party the token was issued to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azp: Option<String>,

    /// Issuer.
    pub iss: String,

    /// Audience the token was minted for.
    pub aud: Audience,

    /// Subject (stable principal ID) - redacted in Debug output.
    pub sub: String,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Issued-at timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Not-before timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
}

/// The `aud` claim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

impl Audience {
    /// Whether `audience` is one of the token's recipients (exact match).
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Self::Single(aud) => aud == audience,
            Self::Multiple(auds) => auds.iter().any(|aud| aud == audience),
        }
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(aud) => f.write_str(aud),
            Self::Multiple(auds) => write!(f, "[{}]", auds.join(", ")),
        }
    }
}

impl From<&str> for Audience {
    fn from(aud: &str) -> Self {
        Self::Single(aud.to_string())
    }
}

impl fmt::Debug for IdentityClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityClaims")
            .field("email", &self.email.as_ref().map(|_| "[REDACTED]"))
            .field("email_verified", &self.email_verified)
            .field("azp", &self.azp)
            .field("iss", &self.iss)
            .field("aud", &self.aud)
            .field("sub", &"[REDACTED]")
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .field("nbf", &self.nbf)
            .finish()
    }
}

/// The verified identity attached to an authenticated request.
///
/// Only the authentication middleware can create one, so its presence in
/// request extensions proves the request passed the gate.
#[derive(Clone, Debug)]
pub struct AuthenticatedIdentity(IdentityClaims);

impl AuthenticatedIdentity {
    pub(crate) fn new(claims: IdentityClaims) -> Self {
        Self(claims)
    }

    /// The verified claims.
    pub fn claims(&self) -> &IdentityClaims {
        &self.0
    }

    /// The caller's email, when the token carried one.
    pub fn email(&self) -> Option<&str> {
        self.0.email.as_deref()
    }
}
