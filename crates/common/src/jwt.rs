//! Token-agnostic pieces of identity token validation.
//!
//! Covers the size limit, clock skew bounds, pre-verification `kid` lookup,
//! `iat` checking and the error taxonomy. Signature verification itself lives
//! with the service that owns the key set.
//!
//! # Security
//!
//! - The size limit is enforced before any decoding happens
//! - All error variants display the same text; only the variant (logged at
//!   debug, used as a metric label) says which check failed
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::{extract_kid, validate_iat, DEFAULT_CLOCK_SKEW};
//!
//! let kid = extract_kid(token)?;
//! // ... resolve key, verify signature ...
//! validate_iat(claims.iat, DEFAULT_CLOCK_SKEW)?;
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

/// Upper bound on an encoded token, in bytes.
///
/// Google identity tokens sit around 1KB.
pub const MAX_JWT_SIZE_BYTES: usize = 8 * 1024;

/// How far `iat` may run ahead of local time.
///
/// `exp` and `nbf` are checked against the current time with no leeway.
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(60);

/// Largest clock skew configuration will accept.
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(10 * 60);

/// The one message every validation failure displays.
pub const GENERIC_TOKEN_ERROR: &str = "The identity token is invalid or expired";

/// Why an identity token was rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Longer than [`MAX_JWT_SIZE_BYTES`].
    #[error("The identity token is invalid or expired")]
    TokenTooLarge,
    /// Not three base64url segments, or undecodable header/claims.
    #[error("The identity token is invalid or expired")]
    MalformedToken,
    /// Header has no usable `kid`.
    #[error("The identity token is invalid or expired")]
    MissingKid,
    /// No single published key carries the token's `kid`.
    #[error("The identity token is invalid or expired")]
    UnknownKey,
    /// Header `alg` cannot be used with the resolved key.
    #[error("The identity token is invalid or expired")]
    UnsupportedAlgorithm,
    #[error("The identity token is invalid or expired")]
    InvalidSignature,
    #[error("The identity token is invalid or expired")]
    Expired,
    #[error("The identity token is invalid or expired")]
    NotYetValid,
    #[error("The identity token is invalid or expired")]
    InvalidIssuer,
    #[error("The identity token is invalid or expired")]
    InvalidAudience,
    /// `iat` is beyond the clock skew allowance.
    #[error("The identity token is invalid or expired")]
    IatTooFarInFuture,
}

impl JwtValidationError {
    /// Snake-case name used in logs and as the `outcome` metric label.
    #[must_use]
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::TokenTooLarge => "token_too_large",
            Self::MalformedToken => "malformed_token",
            Self::MissingKid => "missing_kid",
            Self::UnknownKey => "unknown_key",
            Self::UnsupportedAlgorithm => "unsupported_algorithm",
            Self::InvalidSignature => "invalid_signature",
            Self::Expired => "expired",
            Self::NotYetValid => "not_yet_valid",
            Self::InvalidIssuer => "invalid_issuer",
            Self::InvalidAudience => "invalid_audience",
            Self::IatTooFarInFuture => "iat_too_far_in_future",
        }
    }
}

/// Read the `kid` header parameter of an unverified token.
///
/// The result is only a lookup key into a trusted key set; nothing about the
/// token is authenticated yet.
///
/// # Errors
///
/// - `TokenTooLarge` when over the size limit
/// - `MalformedToken` when the token is not `header.payload.signature` with
///   a base64url JSON object header
/// - `MissingKid` when `kid` is absent, empty or not a string
pub fn extract_kid(token: &str) -> Result<String, JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            "Rejecting oversized token"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }

    let header = decode_header_object(token)?;

    match header.get("kid") {
        Some(Value::String(kid)) if !kid.is_empty() => Ok(kid.clone()),
        _ => {
            tracing::debug!(target: "common.jwt", "Token header carries no usable kid");
            Err(JwtValidationError::MissingKid)
        }
    }
}

fn split_segments(token: &str) -> Result<(&str, &str, &str), JwtValidationError> {
    let mut segments = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        tracing::debug!(target: "common.jwt", "Token is not three dot-separated segments");
        return Err(JwtValidationError::MalformedToken);
    };

    if header.is_empty() || payload.is_empty() || signature.is_empty() {
        tracing::debug!(target: "common.jwt", "Token has an empty segment");
        return Err(JwtValidationError::MalformedToken);
    }

    Ok((header, payload, signature))
}

fn decode_json_object(
    segment: &str,
    part: &'static str,
) -> Result<Map<String, Value>, JwtValidationError> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).map_err(|e| {
        tracing::debug!(target: "common.jwt", part, error = %e, "Token segment is not base64url");
        JwtValidationError::MalformedToken
    })?;

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => {
            tracing::debug!(target: "common.jwt", part, "Token segment is not a JSON object");
            Err(JwtValidationError::MalformedToken)
        }
        Err(e) => {
            tracing::debug!(target: "common.jwt", part, error = %e, "Token segment is not JSON");
            Err(JwtValidationError::MalformedToken)
        }
    }
}

fn decode_header_object(token: &str) -> Result<Map<String, Value>, JwtValidationError> {
    let (header, _, _) = split_segments(token)?;
    decode_json_object(header, "header")
}

/// Decode the claims of an unverified token.
///
/// Diagnostics only. Nothing in the result is trustworthy until the
/// signature has been checked.
///
/// # Errors
///
/// `MalformedToken` when the payload is not a base64url JSON object.
pub fn decode_unverified_claims(token: &str) -> Result<Map<String, Value>, JwtValidationError> {
    let (_, payload, _) = split_segments(token)?;
    decode_json_object(payload, "payload")
}

/// Reject an `iat` more than `clock_skew` ahead of now.
///
/// # Errors
///
/// `IatTooFarInFuture` when the issue time is beyond the allowance.
pub fn validate_iat(iat: i64, clock_skew: Duration) -> Result<(), JwtValidationError> {
    validate_iat_at(iat, clock_skew, chrono::Utc::now().timestamp())
}

pub(crate) fn validate_iat_at(
    iat: i64,
    clock_skew: Duration,
    now: i64,
) -> Result<(), JwtValidationError> {
    let skew = i64::try_from(clock_skew.as_secs()).unwrap_or(i64::MAX);
    let latest = now.saturating_add(skew);

    if iat > latest {
        tracing::debug!(
            target: "common.jwt",
            iat,
            now,
            skew_secs = skew,
            "Token issued in the future"
        );
        return Err(JwtValidationError::IatTooFarInFuture);
    }
    Ok(())
}

/// Raw Ed25519 public key bytes from a JWK `x` member.
///
/// # Errors
///
/// Fails when `x` is not unpadded base64url.
pub fn decode_ed25519_public_key_jwk(x_b64url: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(x_b64url)
}
