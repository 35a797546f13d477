//! Imaging Cache Gateway
//!
//! Serves the patient portal's imaging-study lookups through the cache.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use imaging_cache::api::{create_router, AppState};
use imaging_cache::fetch::{HttpStudyFetcher, StaticTokenProvider};
use imaging_cache::{spawn_cleanup_task, Config, ImagingCacheService};

/// Main entry point for the imaging cache gateway.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the upstream client and the cache service
/// 4. Start background TTL cleanup task
/// 5. Serve the Axum router until SIGINT/SIGTERM, then drain prefetches
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "imaging_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Imaging Cache Gateway");

    let config = Config::from_env();
    info!(
        "Configuration loaded: upstream={}, max_cache_size={}MB, max_study_age={}min, prefetch={} (limit {}), port={}",
        config.api_base_url,
        config.cache.max_cache_size,
        config.cache.max_study_age,
        config.cache.prefetch_enabled,
        config.cache.prefetch_limit,
        config.server_port
    );
    if config.api_token.is_empty() {
        warn!("IMAGING_API_TOKEN is not set; upstream requests will carry an empty bearer token");
    }

    let fetcher = HttpStudyFetcher::new(
        &config.api_base_url,
        Duration::from_secs(config.api_timeout),
    )
    .context("failed to build imaging API client")?;

    let service = ImagingCacheService::new(
        config.cache.clone().into(),
        Arc::new(fetcher),
        Arc::new(StaticTokenProvider::new(config.api_token.clone())),
    );

    let cleanup_handle = spawn_cleanup_task(service.clone(), config.cleanup_interval);
    info!("Background cleanup task started");

    let app = create_router(AppState::new(service.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("server error")?;

    service.drain_prefetch().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then stops the cleanup task.
async fn shutdown_signal(cleanup_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    cleanup_handle.abort();
    warn!("Cleanup task aborted");
}
