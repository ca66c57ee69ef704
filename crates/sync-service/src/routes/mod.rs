//! HTTP routes for the sync service.
//!
//! Defines the Axum router and application state.

use crate::auth::{IdTokenVerifier, KeySetCache, VerifierSettings};
use crate::config::Config;
use crate::handlers;
use crate::middleware::{http_metrics_middleware, require_auth, AuthState};
use crate::services::SyncTrigger;
use axum::{http::StatusCode, middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Active signing-key set, replaced by the refresh task.
    pub key_cache: Arc<KeySetCache>,

    /// Sync implementation invoked by the sync handler.
    pub sync_trigger: Arc<dyn SyncTrigger>,
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/health` - Liveness probe (simple "OK") - public
/// - `/metrics` - Prometheus metrics endpoint - public
/// - `/` - Trigger a sync - requires authentication
/// - Every other path - requires authentication, then 404
/// - TraceLayer for request logging
/// - HTTP metrics middleware
/// - Request timeout from `REQUEST_TIMEOUT_SECONDS`
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let verifier = Arc::new(IdTokenVerifier::new(
        Arc::clone(&state.key_cache),
        VerifierSettings::from_config(&state.config),
    ));
    let auth_state = Arc::new(AuthState {
        verifier,
        expected_audience: Arc::from(state.config.audience.as_str()),
    });
    let request_timeout = Duration::from_secs(state.config.request_timeout_seconds);

    // Public routes (no authentication required)
    let public_routes = Router::new().route("/health", get(handlers::health_check));

    // Metrics route with its own state
    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Protected routes. The fallback is layered too, so unknown paths are
    // rejected with 401 before they can 404.
    let protected_routes = Router::new()
        .route("/", get(handlers::trigger_sync))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(auth_state, require_auth))
        .with_state(state);

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    // 3. http_metrics_middleware - Record ALL responses (outermost)
    public_routes
        .merge(metrics_routes)
        .merge(protected_routes)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(http_metrics_middleware))
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}
