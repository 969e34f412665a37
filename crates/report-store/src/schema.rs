//! Schema definitions and migration utilities.

use sqlx::PgPool;

use crate::error::{StoreError, StoreResult};

/// Embedded migration SQL for the reports table (001_reports.sql).
pub const REPORTS_MIGRATION: &str = include_str!("../../../migrations/001_reports.sql");

/// Notification channel announcing report updates.
pub const CHANGE_CHANNEL: &str = "report_changes";

/// Run all migrations against the database.
///
/// Idempotent: every statement checks for existing objects first.
pub async fn run_migrations(pool: &PgPool) -> StoreResult<()> {
    tracing::info!("Running database migrations...");

    tracing::debug!("Running reports migration (001_reports.sql)...");
    sqlx::raw_sql(REPORTS_MIGRATION)
        .execute(pool)
        .await
        .map_err(|e| StoreError::MigrationError(format!("Reports migration failed: {}", e)))?;

    tracing::info!("Migrations completed successfully");
    Ok(())
}

/// Check if the schema has been initialized.
///
/// Returns true if the `reports` table exists.
pub async fn is_schema_initialized(pool: &PgPool) -> StoreResult<bool> {
    let result: (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = 'public'
            AND table_name = 'reports'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(result.0)
}
