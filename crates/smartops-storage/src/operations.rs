//! Append-only operation log.
//!
//! Every analyzed command and every confirmed execution outcome becomes one
//! row. Rows are never updated; they can only be deleted by id.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use smartops_core::error::SmartOpsError;

use crate::db::Database;

/// A persisted operation log row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRow {
    pub id: i64,
    pub command: String,
    pub intent: String,
    pub status: String,
    pub response_data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when appending a row; id and timestamp are assigned here.
#[derive(Debug, Clone)]
pub struct NewOperation<'a> {
    pub command: &'a str,
    pub intent: &'a str,
    pub status: &'a str,
    pub response_data: &'a serde_json::Value,
}

/// Repository over the `operations` table.
#[derive(Clone)]
pub struct OperationLog {
    db: Arc<Database>,
}

impl OperationLog {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Append a row inside its own transaction and return it as stored.
    ///
    /// Serialization happens before the transaction opens, so a payload that
    /// cannot be encoded never touches the database.
    pub fn append(&self, op: &NewOperation<'_>) -> Result<OperationRow, SmartOpsError> {
        let payload = serde_json::to_string(op.response_data)?;
        let created_at = Utc::now();

        let id = self.db.with_transaction(|tx| {
            tx.execute(
                "INSERT INTO operations (command, intent, status, response_data, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    op.command,
                    op.intent,
                    op.status,
                    payload,
                    created_at.timestamp()
                ],
            )
            .map_err(|e| SmartOpsError::Storage(format!("Failed to append operation: {}", e)))?;
            Ok(tx.last_insert_rowid())
        })?;

        Ok(OperationRow {
            id,
            command: op.command.to_string(),
            intent: op.intent.to_string(),
            status: op.status.to_string(),
            response_data: op.response_data.clone(),
            created_at: Utc
                .timestamp_opt(created_at.timestamp(), 0)
                .single()
                .unwrap_or_default(),
        })
    }

    /// The most recent `limit` rows, newest first.
    pub fn recent(&self, limit: u64) -> Result<Vec<OperationRow>, SmartOpsError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, command, intent, status, response_data, created_at
                     FROM operations
                     ORDER BY created_at DESC, id DESC
                     LIMIT ?1",
                )
                .map_err(|e| SmartOpsError::Storage(format!("History query prepare: {}", e)))?;

            let rows = stmt
                .query_map(rusqlite::params![limit as i64], |row| Ok(map_operation_row(row)))
                .map_err(|e| SmartOpsError::Storage(format!("History query: {}", e)))?;

            let mut results = Vec::new();
            for row in rows {
                let r = row.map_err(|e| SmartOpsError::Storage(e.to_string()))??;
                results.push(r);
            }
            Ok(results)
        })
    }

    /// Delete one row. Returns `false` if no row had that id.
    pub fn delete(&self, id: i64) -> Result<bool, SmartOpsError> {
        self.db.with_conn(|conn| {
            let affected = conn
                .execute("DELETE FROM operations WHERE id = ?1", rusqlite::params![id])
                .map_err(|e| SmartOpsError::Storage(format!("Failed to delete operation: {}", e)))?;
            Ok(affected > 0)
        })
    }
}

fn map_operation_row(row: &rusqlite::Row<'_>) -> Result<OperationRow, SmartOpsError> {
    let read = |e: rusqlite::Error| SmartOpsError::Storage(e.to_string());

    let payload: String = row.get(4).map_err(read)?;
    let created_at: i64 = row.get(5).map_err(read)?;

    Ok(OperationRow {
        id: row.get(0).map_err(read)?,
        command: row.get(1).map_err(read)?,
        intent: row.get(2).map_err(read)?,
        status: row.get(3).map_err(read)?,
        response_data: serde_json::from_str(&payload)?,
        created_at: Utc
            .timestamp_opt(created_at, 0)
            .single()
            .unwrap_or_default(),
    })
}
