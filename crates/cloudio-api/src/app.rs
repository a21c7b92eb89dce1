//! HTTP server lifecycle: bind, serve, and shut down gracefully.

use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use cloudio_core::config::ServerConfig;
use cloudio_core::error::{AppError, ErrorKind};

/// Serve `app` on the configured address until `shutdown` resolves.
pub async fn run_server<F>(config: &ServerConfig, app: Router, shutdown: F) -> Result<(), AppError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        AppError::with_source(ErrorKind::Configuration, format!("Failed to bind {addr}"), e)
    })?;

    info!(address = %addr, "Cloudio server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Server error", e))?;

    info!("HTTP server stopped");
    Ok(())
}
