//! Database schema migrations.
//!
//! Applies the operation log schema and tracks applied versions in
//! `schema_migrations`.

use rusqlite::Connection;
use tracing::info;

use smartops_core::error::SmartOpsError;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), SmartOpsError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| SmartOpsError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| SmartOpsError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: operation_log");
    }

    Ok(())
}

/// Version 1: operation log.
fn apply_v1(conn: &Connection) -> Result<(), SmartOpsError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS operations (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            command         TEXT NOT NULL,
            intent          TEXT NOT NULL,
            status          TEXT NOT NULL,
            response_data   TEXT NOT NULL DEFAULT '{}',
            created_at      INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_operations_created_at
            ON operations (created_at DESC, id DESC);

        INSERT INTO schema_migrations (version, name) VALUES (1, 'operation_log');
        ",
    )
    .map_err(|e| SmartOpsError::Storage(format!("Migration v1 failed: {}", e)))?;
    Ok(())
}
