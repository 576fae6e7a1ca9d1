//! Offline Cache - A caching reverse proxy for offline-capable web portals
//!
//! Keeps a static and a runtime cache store, serves stale-while-revalidate
//! static assets and network-first pages, falls back to locale offline pages
//! and evicts stale runtime entries on a 24-hour / 30-day schedule.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use offline_cache::api::create_router;
use offline_cache::cache::MemoryStorage;
use offline_cache::clock::SystemClock;
use offline_cache::fetch::HttpFetcher;
use offline_cache::worker::ManagerConfig;
use offline_cache::{AppState, CacheManager, Config};

/// Main entry point for the offline cache proxy.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache manager over in-memory storage and the upstream client
/// 4. Install (precache) and activate the manager
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "offline_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Offline Cache Proxy");

    let config = Config::from_env();
    info!(
        "Configuration loaded: upstream={}, port={}, cache_version={}, sweep_interval={}s",
        config.upstream_url, config.server_port, config.cache_version, config.sweep_interval
    );

    let manager_config = ManagerConfig::from_config(&config)?;
    let fetcher = HttpFetcher::new(
        manager_config.origin.clone(),
        Duration::from_secs(config.fetch_timeout),
    )?;
    let manager = CacheManager::new(
        manager_config,
        Arc::new(MemoryStorage::new()),
        Arc::new(fetcher),
        Arc::new(SystemClock),
    );

    // A failed install leaves the manager redundant; requests still pass through
    match manager.install().await {
        Ok(()) => {
            manager.activate().await?;
            info!("Cache manager active");
        }
        Err(e) => error!(error = %e, "Install failed, serving without cache"),
    }

    let app = create_router(AppState::new(manager.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Proxy listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(manager))
        .await
        .context("Server error")?;

    info!("Proxy shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, stops the periodic sweep and allows graceful shutdown.
async fn shutdown_signal(manager: CacheManager) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
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

    manager.shutdown().await;
    warn!("Periodic sweep stopped");
}
