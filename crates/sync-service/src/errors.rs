//! Sync service error types.
//!
//! Responses carry only the canonical status text. Actual causes are
//! logged server-side.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use common::jwt::JwtValidationError;
use thiserror::Error;

/// HTTP-facing error type.
///
/// Maps to HTTP status codes:
/// - Unauthorized: 401 Unauthorized
/// - SyncFailed, Internal: 500 Internal Server Error
#[derive(Debug, Error)]
pub enum SyncServiceError {
    /// Authentication failed. The kind is kept for logging only.
    #[error("Unauthorized: {0:?}")]
    Unauthorized(AuthFailure),

    #[error("Sync failed: {0}")]
    SyncFailed(String),

    #[error("Internal server error")]
    Internal,
}

/// Why a request was rejected by the authentication gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// No usable `Authorization` header.
    MissingHeader,
    /// Header present but not a single `Bearer <token>`.
    InvalidScheme,
    /// The verifier rejected the token.
    Token(JwtValidationError),
}

impl AuthFailure {
    /// Bounded label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            AuthFailure::MissingHeader => "missing_header",
            AuthFailure::InvalidScheme => "invalid_scheme",
            AuthFailure::Token(e) => e.as_label(),
        }
    }
}

impl SyncServiceError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            SyncServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            SyncServiceError::SyncFailed(_) | SyncServiceError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for SyncServiceError {
    fn into_response(self) -> Response {
        if let SyncServiceError::SyncFailed(reason) = &self {
            tracing::error!(target: "sync.errors", reason = %reason, "Sync failed");
        }
        let status = self.status_code();

        let body = status.canonical_reason().unwrap_or("Error");
        let mut response = (status, body).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer error=\"invalid_token\""),
            );
        }

        response
    }
}
