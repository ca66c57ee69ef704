//! Test server harness for E2E testing
//!
//! Provides `TestSyncServer` for spawning real sync service instances in
//! tests, plus helpers to build configuration and key sets from fixtures.

use crate::crypto_fixtures::{jwks_json, TestKeypair};
use crate::token_builders::TEST_AUDIENCE;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use sync_service::auth::jwks::JwksResponse;
use sync_service::auth::{KeySetCache, SigningKeySet};
use sync_service::config::Config;
use sync_service::observability::metrics::init_metrics_recorder;
use sync_service::routes::{self, AppState};
use sync_service::services::SyncTrigger;
use tokio::task::JoinHandle;

/// Source location used by test configuration.
pub const TEST_SOURCE: &str = "test-source-bucket";

/// Destination location used by test configuration.
pub const TEST_DESTINATION: &str = "test-dest-bucket/mirror";

/// Global metrics handle for test servers
static TEST_METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics handle shared by every test server in the process.
///
/// The global recorder can only be installed once, so later callers get a
/// standalone handle if installation already happened elsewhere.
pub fn test_metrics_handle() -> PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            init_metrics_recorder()
                .unwrap_or_else(|_| PrometheusBuilder::new().build_recorder().handle())
        })
        .clone()
}

/// Environment for a test configuration. Refresh is disabled.
pub fn test_config_vars() -> HashMap<String, String> {
    HashMap::from([
        ("GCS_SRC".to_string(), TEST_SOURCE.to_string()),
        ("GCS_DEST".to_string(), TEST_DESTINATION.to_string()),
        ("AUDIENCE".to_string(), TEST_AUDIENCE.to_string()),
        ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
        ("JWKS_REFRESH_SECONDS".to_string(), "0".to_string()),
    ])
}

/// Test configuration with `overrides` applied on top of [`test_config_vars`].
pub fn test_config(overrides: &[(&str, &str)]) -> Result<Config, anyhow::Error> {
    let mut vars = test_config_vars();
    for (name, value) in overrides {
        vars.insert((*name).to_string(), (*value).to_string());
    }
    Config::from_vars(&vars).map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))
}

/// Key set publishing the given fixture keypairs, built through the same
/// JWKS parsing path the service uses.
pub fn key_set_for(keypairs: &[&TestKeypair]) -> Result<SigningKeySet, anyhow::Error> {
    let jwks: JwksResponse = serde_json::from_value(jwks_json(keypairs))?;
    SigningKeySet::from_jwks(&jwks).map_err(|e| anyhow::anyhow!("Failed to build key set: {}", e))
}

/// Application state around a fixed key set.
pub fn test_app_state(
    config: Config,
    keys: SigningKeySet,
    sync_trigger: Arc<dyn SyncTrigger>,
) -> Arc<AppState> {
    Arc::new(AppState {
        config,
        key_cache: Arc::new(KeySetCache::new(keys)),
        sync_trigger,
    })
}

/// Test harness for spawning the sync service in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health() -> Result<()> {
///     let keys = key_set_for(&[&TestKeypair::primary()])?;
///     let server = TestSyncServer::spawn(keys, Arc::new(MockSyncTrigger::succeeding())).await?;
///
///     let response = reqwest::get(format!("{}/health", server.url())).await?;
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestSyncServer {
    addr: SocketAddr,
    state: Arc<AppState>,
    _handle: JoinHandle<()>,
}

impl TestSyncServer {
    /// Spawn a server with the default test configuration.
    pub async fn spawn(
        keys: SigningKeySet,
        sync_trigger: Arc<dyn SyncTrigger>,
    ) -> Result<Self, anyhow::Error> {
        Self::spawn_with_config(test_config(&[])?, keys, sync_trigger).await
    }

    /// Spawn a server with an explicit configuration.
    ///
    /// The server binds to a random available port on 127.0.0.1 regardless of
    /// `BIND_ADDRESS`.
    pub async fn spawn_with_config(
        config: Config,
        keys: SigningKeySet,
        sync_trigger: Arc<dyn SyncTrigger>,
    ) -> Result<Self, anyhow::Error> {
        let state = test_app_state(config, keys, sync_trigger);
        let app = routes::build_routes(Arc::clone(&state), test_metrics_handle());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            state,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The key cache the server verifies against.
    pub fn key_cache(&self) -> &Arc<KeySetCache> {
        &self.state.key_cache
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.state.config
    }
}

impl Drop for TestSyncServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
