//! Authentication middleware for protected routes.
//!
//! Extracts the Bearer token from the Authorization header, verifies it,
//! and injects the resulting identity into request extensions.

use crate::auth::{AuthenticatedIdentity, IdTokenVerifier};
use crate::errors::{AuthFailure, SyncServiceError};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::instrument;

/// State for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    /// Token verifier backed by the shared key set.
    pub verifier: Arc<IdTokenVerifier>,

    /// Audience inbound tokens must be issued for.
    pub expected_audience: Arc<str>,
}

/// Authentication middleware that verifies identity tokens.
///
/// # Authorization Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// # Response
///
/// - Returns 401 Unauthorized with WWW-Authenticate header if the token is missing or invalid
/// - Continues to next handler with `AuthenticatedIdentity` in extensions if the token is valid
#[instrument(skip(state, req, next), name = "sync.middleware.auth")]
pub async fn require_auth(
    State(state): State<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, SyncServiceError> {
    let result = authenticate(&state, req.headers()).await;

    let identity = result.map_err(|failure| {
        tracing::info!(
            target: "sync.middleware.auth",
            reason = failure.as_label(),
            "Request rejected"
        );
        SyncServiceError::Unauthorized(failure)
    })?;

    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

async fn authenticate(
    state: &AuthState,
    headers: &HeaderMap,
) -> Result<AuthenticatedIdentity, AuthFailure> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthFailure::MissingHeader)?;

    let token = parse_bearer(auth_header).ok_or(AuthFailure::InvalidScheme)?;

    let claims = state
        .verifier
        .verify(token, &state.expected_audience)
        .await
        .map_err(AuthFailure::Token)?;

    Ok(AuthenticatedIdentity::new(claims))
}

/// Extract the token from a `Bearer <token>` header value.
///
/// The value must contain the `Bearer` marker exactly once, at the start.
/// Returns `None` for other schemes or an empty token.
fn parse_bearer(value: &str) -> Option<&str> {
    if value.matches("Bearer").count() != 1 {
        return None;
    }

    let token = value.trim_start().strip_prefix("Bearer")?;
    // "Bearertoken" is not the Bearer scheme
    if !token.is_empty() && !token.starts_with(char::is_whitespace) {
        return None;
    }

    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    Some(token)
}

/// Extension trait for reading the identity from a request.
pub trait IdentityExt {
    /// Returns `None` if the auth middleware was not applied to this request.
    fn identity(&self) -> Option<&AuthenticatedIdentity>;
}

impl<B> IdentityExt for axum::extract::Request<B> {
    fn identity(&self) -> Option<&AuthenticatedIdentity> {
        self.extensions().get::<AuthenticatedIdentity>()
    }
}
