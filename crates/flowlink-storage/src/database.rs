// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements run on tokio-rusqlite's single background thread, which
//! makes [`Database`] the only writer. Do NOT open additional connections for
//! writes; clone the handle instead.

use flowlink_core::FlowlinkError;
use tracing::debug;

use crate::migrations;

/// Convert a tokio-rusqlite error into [`FlowlinkError::Storage`].
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> FlowlinkError {
    FlowlinkError::Storage {
        source: Box::new(e),
    }
}

/// Handle to the migrated SQLite database.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Opens (creating if needed) the database at `path` with WAL enabled,
    /// applies PRAGMAs and runs pending migrations.
    pub async fn open(path: &str) -> Result<Self, FlowlinkError> {
        Self::open_with(path, true).await
    }

    /// Like [`Database::open`] with explicit control over WAL mode.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, FlowlinkError> {
        if let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| FlowlinkError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| FlowlinkError::Storage {
                source: Box::new(e),
            })?;
        let db = Self { conn };
        db.prepare(wal_mode).await?;
        debug!(path, wal_mode, "database opened");
        Ok(db)
    }

    /// Opens a private in-memory database. Used by tests and one-shot tools.
    pub async fn open_in_memory() -> Result<Self, FlowlinkError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|e| FlowlinkError::Storage {
                source: Box::new(e),
            })?;
        let db = Self { conn };
        db.prepare(false).await?;
        Ok(db)
    }

    async fn prepare(&self, wal_mode: bool) -> Result<(), FlowlinkError> {
        self.conn
            .call(move |conn| -> Result<Result<(), FlowlinkError>, rusqlite::Error> {
                if wal_mode {
                    let mode: String = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                        row.get(0)
                    })?;
                    debug!(journal_mode = %mode, "journal mode set");
                    conn.pragma_update(None, "synchronous", "NORMAL")?;
                }
                conn.pragma_update(None, "foreign_keys", "ON")?;
                conn.busy_timeout(std::time::Duration::from_secs(5))?;
                Ok(migrations::run_migrations(conn))
            })
            .await
            .map_err(map_tr_err)?
    }

    /// The shared connection handle. Every query module goes through this.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoints the WAL so the main database file is self-contained.
    pub async fn checkpoint(&self) -> Result<(), FlowlinkError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Checkpoints and closes the connection.
    pub async fn close(self) -> Result<(), FlowlinkError> {
        self.checkpoint().await?;
        self.conn.close().await.map_err(map_tr_err)
    }
}
