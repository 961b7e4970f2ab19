//! Database migration runner.

use sqlx::SqlitePool;
use sqlx::migrate::Migrator;
use tracing::info;

use datarepo_core::error::{AppError, ErrorKind};

/// Run all pending migrations of `migrator` against the pool.
///
/// Already-applied migrations are skipped, so calling this repeatedly is
/// safe.
pub async fn run_migrations(pool: &SqlitePool, migrator: &Migrator) -> Result<(), AppError> {
    info!(
        migrations = migrator.iter().count(),
        "Running database migrations..."
    );

    migrator.run(pool).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Migration,
            format!("Failed to run migrations: {e}"),
            e,
        )
    })?;

    info!("Database migrations completed successfully");
    Ok(())
}
