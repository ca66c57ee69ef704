//! Builder patterns for test data construction
//!
//! Provides a fluent API for creating Google-style identity token claims.

use chrono::{Duration, Utc};
use serde_json::json;

/// Audience used by the harness and builders unless overridden.
pub const TEST_AUDIENCE: &str = "https://sync.example.run.app";

/// Issuer used by the builders unless overridden.
pub const TEST_ISSUER: &str = "https://accounts.google.com";

/// Builder for creating test identity token claims
///
/// # Example
/// ```rust,ignore
/// let claims = IdTokenClaimsBuilder::new()
///     .for_email("scheduler@project.iam.gserviceaccount.com")
///     .expires_in(3600)
///     .build();
/// let token = TestKeypair::primary().sign(&claims)?;
/// ```
pub struct IdTokenClaimsBuilder {
    email: Option<String>,
    email_verified: bool,
    azp: Option<String>,
    iss: String,
    aud: String,
    sub: String,
    exp: i64,
    iat: Option<i64>,
    nbf: Option<i64>,
}

impl IdTokenClaimsBuilder {
    /// Create a new claims builder with defaults valid for one hour
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            email: Some("scheduler@test-project.iam.gserviceaccount.com".to_string()),
            email_verified: true,
            azp: Some("112233445566778899000".to_string()),
            iss: TEST_ISSUER.to_string(),
            aud: TEST_AUDIENCE.to_string(),
            sub: "112233445566778899000".to_string(),
            exp: (now + Duration::seconds(3600)).timestamp(),
            iat: Some(now.timestamp()),
            nbf: None,
        }
    }

    /// Set the email claim
    pub fn for_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    /// Remove the email claim entirely
    pub fn without_email(mut self) -> Self {
        self.email = None;
        self.email_verified = false;
        self
    }

    /// Set the audience claim
    pub fn with_audience(mut self, aud: &str) -> Self {
        self.aud = aud.to_string();
        self
    }

    /// Set the issuer claim
    pub fn with_issuer(mut self, iss: &str) -> Self {
        self.iss = iss.to_string();
        self
    }

    /// Set the subject claim
    pub fn with_subject(mut self, sub: &str) -> Self {
        self.sub = sub.to_string();
        self
    }

    /// Set expiration in seconds from now (negative for already expired)
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self
    }

    /// Set issued-at timestamp
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = Some(timestamp);
        self
    }

    /// Remove the issued-at claim entirely
    pub fn without_issued_at(mut self) -> Self {
        self.iat = None;
        self
    }

    /// Set not-before in seconds from now
    pub fn not_before_in(mut self, seconds: i64) -> Self {
        self.nbf = Some((Utc::now() + Duration::seconds(seconds)).timestamp());
        self
    }

    /// Build the claims as a JSON value
    pub fn build(self) -> serde_json::Value {
        let mut claims = json!({
            "email_verified": self.email_verified,
            "iss": self.iss,
            "aud": self.aud,
            "sub": self.sub,
            "exp": self.exp,
        });

        if let Some(map) = claims.as_object_mut() {
            if let Some(email) = self.email {
                map.insert("email".to_string(), json!(email));
            }
            if let Some(azp) = self.azp {
                map.insert("azp".to_string(), json!(azp));
            }
            if let Some(iat) = self.iat {
                map.insert("iat".to_string(), json!(iat));
            }
            if let Some(nbf) = self.nbf {
                map.insert("nbf".to_string(), json!(nbf));
            }
        }

        claims
    }
}

impl Default for IdTokenClaimsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
