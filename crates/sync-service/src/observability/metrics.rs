//! Metrics definitions for the sync service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `sync_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `method`: HTTP methods
//! - `endpoint`: `/`, `/health`, `/metrics`, or `/other`
//! - `status`: 3 values (success, error, timeout)
//! - `outcome`: `success` or a `JwtValidationError` label
//! - `result`: `success` or `error`

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("sync_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 5.000, 30.000, 120.000,
                600.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        // Verification is CPU-only; sub-millisecond resolution matters here
        .set_buckets_for_metric(
            Matcher::Prefix("sync_token_validation".to_string()),
            &[0.0001, 0.0005, 0.001, 0.002, 0.005, 0.010, 0.025, 0.050],
        )
        .map_err(|e| format!("Failed to set token validation buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("sync_operation".to_string()),
            &[
                0.100, 0.500, 1.000, 5.000, 15.000, 30.000, 60.000, 120.000, 300.000, 600.000,
                900.000,
            ],
        )
        .map_err(|e| format!("Failed to set sync operation buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `sync_http_requests_total`, `sync_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("sync_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("sync_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Normalize endpoint path to prevent label cardinality explosion.
///
/// Unknown paths are still answered (with 401) and must not mint new series.
fn normalize_endpoint(path: &str) -> &'static str {
    match path {
        "/" => "/",
        "/health" => "/health",
        "/metrics" => "/metrics",
        _ => "/other",
    }
}

// ============================================================================
// Token Validation Metrics
// ============================================================================

/// Record one token verification.
///
/// Metric: `sync_token_validations_total`, `sync_token_validation_duration_seconds`
/// Labels: `outcome`
pub fn record_token_validation(outcome: &'static str, duration: Duration) {
    histogram!("sync_token_validation_duration_seconds",
        "outcome" => outcome
    )
    .record(duration.as_secs_f64());

    counter!("sync_token_validations_total",
        "outcome" => outcome
    )
    .increment(1);
}

// ============================================================================
// JWKS Metrics
// ============================================================================

/// Record a JWKS fetch attempt.
///
/// Metric: `sync_jwks_refresh_total`
/// Labels: `result`
pub fn record_jwks_refresh(success: bool) {
    let result = if success { "success" } else { "error" };
    counter!("sync_jwks_refresh_total", "result" => result).increment(1);
}

/// Set the number of keys in the active key set.
///
/// Metric: `sync_jwks_keys`
pub fn set_jwks_keys(count: usize) {
    gauge!("sync_jwks_keys").set(count as f64);
}

// ============================================================================
// Sync Operation Metrics
// ============================================================================

/// Record a completed sync run.
///
/// Metric: `sync_operations_total`, `sync_operation_duration_seconds`
/// Labels: `result`
pub fn record_sync_operation(success: bool, duration: Duration) {
    let result = if success { "success" } else { "error" };

    histogram!("sync_operation_duration_seconds",
        "result" => result
    )
    .record(duration.as_secs_f64());

    counter!("sync_operations_total",
        "result" => result
    )
    .increment(1);
}
