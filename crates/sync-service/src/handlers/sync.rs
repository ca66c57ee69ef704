//! Sync handler.
//!
//! Runs one synchronization from the configured source to the configured
//! destination for an authenticated caller.

use crate::errors::SyncServiceError;
use crate::middleware::IdentityExt;
use crate::observability::metrics::record_sync_operation;
use crate::routes::AppState;
use axum::extract::{Request, State};
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Handler for GET /
///
/// # Response
///
/// - 200 with body `ok` when the sync completed
/// - 500 when the sync failed
#[instrument(skip_all, name = "sync.handlers.sync")]
pub async fn trigger_sync(
    State(state): State<Arc<AppState>>,
    req: Request,
) -> Result<&'static str, SyncServiceError> {
    // Only reachable behind require_auth
    let identity = req.identity().ok_or_else(|| {
        tracing::error!(target: "sync.handlers.sync", "Sync handler reached without identity");
        SyncServiceError::Internal
    })?;

    tracing::info!(
        target: "sync.handlers.sync",
        caller = identity.email().unwrap_or("<none>"),
        email_verified = identity.claims().email_verified,
        "Sync requested"
    );

    let start = Instant::now();
    let result = state
        .sync_trigger
        .sync(&state.config.destination, &state.config.source)
        .await;
    record_sync_operation(result.is_ok(), start.elapsed());

    result.map_err(|e| SyncServiceError::SyncFailed(e.to_string()))?;

    tracing::info!(
        target: "sync.handlers.sync",
        duration_ms = start.elapsed().as_millis() as u64,
        "Sync completed"
    );

    Ok("ok")
}
