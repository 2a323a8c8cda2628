// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;
use std::time::Duration;

use leasesign_core::LeasesignError;
use tokio_rusqlite::Connection;
use tracing::debug;

/// How long a statement waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the service database.
///
/// Wraps the single `tokio_rusqlite::Connection` every query goes through.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at `path` in WAL mode and run migrations.
    pub async fn open(path: &str) -> Result<Self, LeasesignError> {
        Self::open_with(path, true).await
    }

    /// Open the database with an explicit journal mode choice.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, LeasesignError> {
        ensure_parent_dir(path)?;

        let conn = Connection::open(path).await.map_err(storage_err)?;
        conn.call(move |conn| -> Result<Result<(), LeasesignError>, rusqlite::Error> {
            apply_pragmas(conn, wal_mode)?;
            Ok(crate::migrations::run_migrations(conn))
        })
        .await
        .map_err(map_tr_err)??;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The shared connection all queries run through.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), LeasesignError> {
        checkpoint(&self.conn).await?;
        self.conn.close().await.map_err(storage_err)
    }
}

/// Truncate the WAL into the main database file.
pub async fn checkpoint(conn: &Connection) -> Result<(), LeasesignError> {
    conn.call(|conn| -> Result<(), rusqlite::Error> {
        conn.query_row("PRAGMA wal_checkpoint(TRUNCATE);", [], |_| Ok(()))?;
        Ok(())
    })
    .await
    .map_err(map_tr_err)?;
    debug!("WAL checkpoint complete");
    Ok(())
}

fn ensure_parent_dir(path: &str) -> Result<(), LeasesignError> {
    if path == ":memory:" {
        return Ok(());
    }
    match Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|e| LeasesignError::Storage {
                source: Box::new(e),
            })
        }
        _ => Ok(()),
    }
}

fn apply_pragmas(conn: &rusqlite::Connection, wal_mode: bool) -> Result<(), rusqlite::Error> {
    if wal_mode {
        let mode: String = conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
        debug!(journal_mode = %mode, "journal mode set");
    }
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA synchronous = NORMAL;")?;
    Ok(())
}

/// Wrap any connection-level failure as `LeasesignError::Storage`.
fn storage_err<E>(e: E) -> LeasesignError
where
    E: std::error::Error + Send + Sync + 'static,
{
    LeasesignError::Storage {
        source: Box::new(e),
    }
}

/// Convert a tokio-rusqlite error into `LeasesignError::Storage`.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> LeasesignError {
    LeasesignError::Storage {
        source: Box::new(e),
    }
}

/// Classify a failed write as a schema rejection.
///
/// Returns `None` for failures that are not caused by the shape of the
/// write; those stay plain storage errors.
pub(crate) fn classify_write_error(table: &str, err: &rusqlite::Error) -> Option<LeasesignError> {
    let message = err.to_string();
    if let Some(field) = missing_column(&message) {
        return Some(LeasesignError::UnsupportedField {
            table: table.to_string(),
            field,
        });
    }
    if err.sqlite_error_code() == Some(rusqlite::ErrorCode::ConstraintViolation) {
        return Some(LeasesignError::ConstraintViolation {
            table: table.to_string(),
            detail: message,
        });
    }
    None
}

/// Extracts the column name from SQLite's missing-column messages.
///
/// INSERT reports `table t has no column named c`, UPDATE reports
/// `no such column: c`.
fn missing_column(message: &str) -> Option<String> {
    let rest = message
        .split_once("has no column named ")
        .or_else(|| message.split_once("no such column: "))
        .map(|(_, rest)| rest)?;
    let column = rest
        .split(|c: char| c.is_whitespace() || c == ',' || c == ')')
        .next()?
        .trim_matches('"');
    // `no such column: t.c` names a qualified column.
    let column = column.rsplit('.').next().unwrap_or(column);
    (!column.is_empty()).then(|| column.to_string())
}
