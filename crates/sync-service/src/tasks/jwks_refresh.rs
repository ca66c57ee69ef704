//! JWKS refresh background task.
//!
//! Periodically re-fetches the JWKS document and swaps the new key set into
//! the shared cache, so rotated Google signing keys are picked up without a
//! restart. A failed refresh keeps the previous key set.
//!
//! # Graceful Shutdown
//!
//! The task exits when the cancellation token is cancelled.

use crate::auth::{JwksClient, KeySetCache};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Instrument};

/// Run the JWKS refresh loop until cancelled.
///
/// The first fetch happens one `interval` after start; the initial key set
/// is expected to have been loaded before the server began serving.
pub async fn start_jwks_refresh(
    client: Arc<JwksClient>,
    cache: Arc<KeySetCache>,
    interval: Duration,
    cancel_token: CancellationToken,
) {
    async move {
        info!(
            target: "sync.task.jwks_refresh",
            interval_seconds = interval.as_secs(),
            "Starting JWKS refresh task"
        );

        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    refresh_once(&client, &cache).await;
                }
                _ = cancel_token.cancelled() => {
                    info!(
                        target: "sync.task.jwks_refresh",
                        "JWKS refresh task received shutdown signal, exiting"
                    );
                    break;
                }
            }
        }
    }
    .instrument(tracing::info_span!("sync.task.jwks_refresh"))
    .await;
}

/// Fetch once and swap on success.
///
/// Returns whether the key set was replaced.
pub async fn refresh_once(client: &JwksClient, cache: &KeySetCache) -> bool {
    match client.fetch().await {
        Ok(keys) => {
            info!(
                target: "sync.task.jwks_refresh",
                key_count = keys.len(),
                "JWKS refreshed"
            );
            cache.replace(keys).await;
            true
        }
        Err(e) => {
            error!(
                target: "sync.task.jwks_refresh",
                error = %e,
                "JWKS refresh failed, keeping previous key set"
            );
            false
        }
    }
}
