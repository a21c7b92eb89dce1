//! Cloudio Server: hierarchical file storage behind a JSON API.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{EnvFilter, fmt};

use cloudio_api::{AppState, build_router, run_server};
use cloudio_auth::JwtDecoder;
use cloudio_core::config::AppConfig;
use cloudio_database::{DatabasePool, EntityStore, MemoryEntityStore, PgEntityStore};
use cloudio_storage::build_blob_store;

#[tokio::main]
async fn main() {
    let env = std::env::var("CLOUDIO_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e:#}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!("Starting Cloudio v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Entity store ─────────────────────────────────────
    let (store, db): (Arc<dyn EntityStore>, Option<DatabasePool>) =
        if config.database.is_configured() {
            tracing::info!("Connecting to database...");
            let db = DatabasePool::open(&config.database)
                .await
                .context("database connection failed")?;
            (Arc::new(PgEntityStore::new(db.clone())), Some(db))
        } else {
            tracing::warn!("database.url is empty, using the in-memory entity store");
            (Arc::new(MemoryEntityStore::new()), None)
        };
    tracing::info!(backend = store.backend(), "Entity store ready");

    // ── Step 2: Blob store ───────────────────────────────────────
    let blobs = build_blob_store(&config.storage, &config.server.public_url)
        .await
        .context("blob store initialization failed")?;

    // ── Step 3: Auth ─────────────────────────────────────────────
    let jwt_decoder = JwtDecoder::new(&config.auth).context("invalid auth configuration")?;

    // ── Step 4: Build and start HTTP server ──────────────────────
    let server_config = config.server.clone();
    let grace = Duration::from_secs(server_config.shutdown_grace_seconds);
    let state = AppState::new(config, store, blobs, jwt_decoder);
    let app = build_router(state);

    run_server(&server_config, app, shutdown_signal())
        .await
        .context("HTTP server failed")?;

    // ── Step 5: Release connections ──────────────────────────────
    if let Some(db) = db {
        tracing::info!("Closing database connections...");
        if tokio::time::timeout(grace, db.close()).await.is_err() {
            tracing::warn!("Database pool did not close within the grace period");
        }
    }

    tracing::info!("Cloudio server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
