//! Sync Service
//!
//! Entry point. Loads configuration, fetches the signing-key set, starts the
//! refresh task and serves HTTP/1.1 and HTTP/2 until SIGINT/SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use sync_service::auth::{JwksClient, KeySetCache};
use sync_service::config::Config;
use sync_service::observability::metrics::init_metrics_recorder;
use sync_service::routes::{self, AppState};
use sync_service::services::RcloneSync;
use sync_service::tasks::start_jwks_refresh;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sync_service=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Sync Service");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        source = %config.source,
        destination = %config.destination,
        jwks_url = %config.jwks_url,
        jwt_clock_skew_seconds = config.jwt_clock_skew_seconds,
        enforce_audience = config.enforce_audience,
        jwks_refresh_seconds = config.jwks_refresh_seconds,
        "Configuration loaded successfully"
    );

    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics recorder: {}", e);
        e
    })?;

    // The key set must be loaded before serving; failure is fatal
    let jwks_client = Arc::new(JwksClient::new(config.jwks_url.clone()));
    let initial_keys = jwks_client.fetch().await.map_err(|e| {
        error!("Failed to load JWKS: {}", e);
        e
    })?;
    let key_cache = Arc::new(KeySetCache::new(initial_keys));

    let cancel_token = CancellationToken::new();
    let refresh_handle = if config.jwks_refresh_seconds > 0 {
        Some(tokio::spawn(start_jwks_refresh(
            Arc::clone(&jwks_client),
            Arc::clone(&key_cache),
            Duration::from_secs(config.jwks_refresh_seconds),
            cancel_token.clone(),
        )))
    } else {
        info!("JWKS refresh disabled (JWKS_REFRESH_SECONDS=0)");
        None
    };

    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;
    let drain_seconds = config.drain_seconds;

    let state = Arc::new(AppState {
        sync_trigger: Arc::new(RcloneSync::from_config(&config)),
        config,
        key_cache,
    });

    let app = routes::build_routes(state, metrics_handle);

    // axum::serve speaks HTTP/1.1 and, with the http2 feature, h2c
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Sync Service listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(drain_seconds))
        .await?;

    cancel_token.cancel();
    if let Some(handle) = refresh_handle {
        if let Err(e) = handle.await {
            warn!("JWKS refresh task ended abnormally: {}", e);
        }
    }

    info!("Sync Service shutdown complete");

    Ok(())
}

/// Listens for shutdown signals (SIGTERM, SIGINT).
/// Returns when a shutdown signal is received and drain period is complete.
async fn shutdown_signal(drain_seconds: u64) {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    if drain_seconds > 0 {
        warn!("Draining connections for {} seconds...", drain_seconds);
        tokio::time::sleep(Duration::from_secs(drain_seconds)).await;
        info!("Drain period complete");
    } else {
        info!("Skipping drain period (DRAIN_SECONDS=0)");
    }
}
