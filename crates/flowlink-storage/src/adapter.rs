// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementations of the [`IntegrationStore`] and [`TaskBackend`] traits.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use flowlink_config::model::{QueueConfig, StorageConfig};
use flowlink_core::{
    Connection, ConnectionUpdate, ExchangeLog, FlowlinkError, IntegrationStore, NewConnection,
    NewExchangeLog, TaskBackend, TaskRecord,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed connection and exchange log store.
///
/// Wraps a [`Database`] handle and delegates to the typed query modules.
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    /// Wrap an already opened database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open the database named by `config` and wrap it.
    pub async fn open(config: &StorageConfig) -> Result<Self, FlowlinkError> {
        let db = Database::open_with(&config.database_path, config.wal_mode).await?;
        debug!(path = %config.database_path, "SQLite store initialized");
        Ok(Self { db })
    }

    /// The underlying database handle, shared with [`SqliteTaskBackend`].
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Round-trips a trivial statement through the writer thread.
    pub async fn health_check(&self) -> Result<(), FlowlinkError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

#[async_trait]
impl IntegrationStore for SqliteStore {
    async fn create_connection(&self, new: &NewConnection) -> Result<Connection, FlowlinkError> {
        queries::connections::create_connection(&self.db, new).await
    }

    async fn get_connection(&self, id: i64) -> Result<Option<Connection>, FlowlinkError> {
        queries::connections::get_connection(&self.db, id).await
    }

    async fn list_connections(&self) -> Result<Vec<Connection>, FlowlinkError> {
        queries::connections::list_connections(&self.db).await
    }

    async fn update_connection(
        &self,
        id: i64,
        update: &ConnectionUpdate,
    ) -> Result<Option<Connection>, FlowlinkError> {
        queries::connections::update_connection(&self.db, id, update).await
    }

    async fn delete_connection(&self, id: i64) -> Result<bool, FlowlinkError> {
        queries::connections::delete_connection(&self.db, id).await
    }

    async fn record_exchange(
        &self,
        log: &NewExchangeLog,
        last_sync_status: &str,
    ) -> Result<(ExchangeLog, Connection), FlowlinkError> {
        queries::exchange_logs::record_exchange(&self.db, log, last_sync_status).await
    }

    async fn list_logs(
        &self,
        connection_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<ExchangeLog>, FlowlinkError> {
        queries::exchange_logs::list_logs(&self.db, connection_id, limit).await
    }

    async fn count_logs(&self, connection_id: i64) -> Result<i64, FlowlinkError> {
        queries::exchange_logs::count_logs(&self.db, connection_id).await
    }
}

/// Durable task backend stored in the `tasks` table.
///
/// Tasks survive restarts; a worker pool started later picks up whatever is
/// still queued or retrying, and any running task whose lease expired.
#[derive(Clone)]
pub struct SqliteTaskBackend {
    db: Database,
    lease: Duration,
}

impl SqliteTaskBackend {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            lease: QueueConfig::default().lease(),
        }
    }

    /// How long a claim locks a task before another worker may take it over.
    pub fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = lease;
        self
    }
}

#[async_trait]
impl TaskBackend for SqliteTaskBackend {
    async fn enqueue(
        &self,
        connection_id: i64,
        payload: &Value,
    ) -> Result<TaskRecord, FlowlinkError> {
        queries::tasks::enqueue(&self.db, connection_id, payload).await
    }

    async fn claim_next(&self) -> Result<Option<TaskRecord>, FlowlinkError> {
        queries::tasks::claim_next(&self.db, self.lease).await
    }

    async fn claim(&self, id: &str) -> Result<Option<TaskRecord>, FlowlinkError> {
        queries::tasks::claim(&self.db, id, self.lease).await
    }

    async fn complete(&self, id: &str, result: &Value) -> Result<TaskRecord, FlowlinkError> {
        queries::tasks::complete(&self.db, id, result).await
    }

    async fn schedule_retry(
        &self,
        id: &str,
        error: &str,
        delay_ms: u64,
    ) -> Result<TaskRecord, FlowlinkError> {
        queries::tasks::schedule_retry(&self.db, id, error, delay_ms).await
    }

    async fn fail(&self, id: &str, error: &str) -> Result<TaskRecord, FlowlinkError> {
        queries::tasks::fail(&self.db, id, error).await
    }

    async fn get(&self, id: &str) -> Result<Option<TaskRecord>, FlowlinkError> {
        queries::tasks::get(&self.db, id).await
    }

    async fn cancel(&self, id: &str) -> Result<bool, FlowlinkError> {
        queries::tasks::cancel(&self.db, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowlink_core::PartnerType;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_from_config_and_health_check() {
        let dir = tempdir().unwrap();
        let config = StorageConfig {
            database_path: dir.path().join("store.db").to_string_lossy().to_string(),
            wal_mode: true,
        };
        let store = SqliteStore::open(&config).await.unwrap();
        store.health_check().await.unwrap();
    }

    #[tokio::test]
    async fn store_and_backend_share_one_database() {
        let db = Database::open_in_memory().await.unwrap();
        let store = SqliteStore::new(db.clone());
        let backend = SqliteTaskBackend::new(db);

        let conn = store
            .create_connection(&NewConnection {
                name: "procurement".into(),
                description: "tenders".into(),
                partner_type: PartnerType::Procurement,
                settings: json!({"dry_run": true}),
                is_active: true,
            })
            .await
            .unwrap();
        let task = backend.enqueue(conn.id, &json!({"q": "fuel"})).await.unwrap();

        let fetched = backend.get(&task.id).await.unwrap().unwrap();
        assert_eq!(fetched.connection_id, conn.id);
        assert_eq!(store.list_connections().await.unwrap().len(), 1);
    }
}
