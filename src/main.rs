//! Offline Cache - a service worker host for an offline-capable web game
//!
//! Runs one worker version in front of the configured origin.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use offline_cache::api::{create_router, AppState};
use offline_cache::config::Config;
use offline_cache::tasks::spawn_sync_task;

/// Main entry point for the worker host.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the worker with a network fetcher for the scope
/// 4. Install and, if nothing holds it back, activate the worker
/// 5. Start background sync task
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

    info!("Starting offline cache worker host");

    let config = Config::from_env();
    info!(
        "Configuration loaded: cache={}, scope={}, manifest={} entries, port={}, sync_interval={}s",
        config.cache_name,
        config.scope,
        config.manifest.len(),
        config.server_port,
        config.sync_interval
    );

    let state = AppState::from_config(&config).context("failed to create network fetcher")?;

    match state.worker.start().await {
        Ok(worker_state) => info!("Worker is {}", worker_state),
        Err(e) => error!("Worker failed to start: {}", e),
    }

    let sync_handle = spawn_sync_task(
        state.worker.clone(),
        state.sync.clone(),
        config.sync_interval,
        config.max_sync_attempts,
    );
    info!("Background sync task started");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sync_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the sync task and allows graceful shutdown.
async fn shutdown_signal(sync_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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

    sync_handle.abort();
    warn!("Sync task aborted");
}
