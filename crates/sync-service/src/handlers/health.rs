//! Liveness probe handler.

/// Returns "OK" while the process is serving.
///
/// Does not check dependencies: the key set is loaded before the server
/// binds, and sync targets are only touched on demand.
pub async fn health_check() -> &'static str {
    "OK"
}
