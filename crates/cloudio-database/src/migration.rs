//! Embedded schema migrations for the `folders` and `files` tables.
//!
//! The SQL lives in the workspace `migrations/` directory and is compiled
//! into the binary, so a deployed server can bring an empty database up to
//! the schema the entity store expects.

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::info;

use cloudio_core::error::{AppError, ErrorKind};

/// Schema migrations, in version order.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Bring the schema up to date, logging how many embedded versions exist.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    let latest = MIGRATOR.iter().map(|m| m.version).max().unwrap_or_default();
    info!(
        embedded = MIGRATOR.iter().count(),
        latest_version = latest,
        "Applying entity store migrations"
    );

    MIGRATOR.run(pool).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Configuration,
            format!("Entity store schema migration failed: {e}"),
            e,
        )
    })?;

    info!(latest_version = latest, "Entity store schema is current");
    Ok(())
}
