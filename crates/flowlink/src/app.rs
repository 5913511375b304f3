// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring of store, connectors, runner and queue from configuration.

use std::sync::Arc;

use flowlink_config::FlowlinkConfig;
use flowlink_config::model::QueueBackendKind;
use flowlink_connectors::PartnerConnectorFactory;
use flowlink_core::{FlowlinkError, TaskBackend};
use flowlink_engine::{ConnectionService, ExchangeRunner};
use flowlink_queue::{MemoryTaskBackend, TaskQueue};
use flowlink_storage::{Database, SqliteStore, SqliteTaskBackend};
use tracing::debug;

/// Everything a command needs, built once per process.
pub struct App {
    pub config: FlowlinkConfig,
    pub connections: ConnectionService,
    pub queue: TaskQueue,
    pub factory: Arc<PartnerConnectorFactory>,
    database: Database,
}

impl App {
    /// Opens the configured database and assembles the engine.
    pub async fn open(config: FlowlinkConfig) -> Result<Self, FlowlinkError> {
        let database =
            Database::open_with(&config.storage.database_path, config.storage.wal_mode).await?;
        Self::with_database(config, database)
    }

    pub fn with_database(config: FlowlinkConfig, database: Database) -> Result<Self, FlowlinkError> {
        let factory = Arc::new(PartnerConnectorFactory::new(&config.http)?);
        let store = Arc::new(SqliteStore::new(database.clone()));
        let runner = ExchangeRunner::new(store, factory.clone(), &config.exchange);

        let backend: Arc<dyn TaskBackend> = match config.queue.backend {
            QueueBackendKind::Sqlite => Arc::new(
                SqliteTaskBackend::new(database.clone()).with_lease(config.queue.lease()),
            ),
            QueueBackendKind::Memory => Arc::new(MemoryTaskBackend::new()),
        };
        let queue = TaskQueue::new(backend, runner.clone(), &config.queue);
        debug!(
            backend = ?config.queue.backend,
            eager = config.queue.eager,
            "engine assembled"
        );

        Ok(Self {
            connections: ConnectionService::new(runner),
            queue,
            factory,
            database,
            config,
        })
    }

    /// Flushes the WAL and closes the database.
    pub async fn shutdown(self) -> Result<(), FlowlinkError> {
        self.database.close().await
    }
}
