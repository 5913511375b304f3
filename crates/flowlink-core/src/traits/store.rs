// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence boundary for connections and their exchange logs.

use async_trait::async_trait;

use crate::error::FlowlinkError;
use crate::types::{Connection, ConnectionUpdate, ExchangeLog, NewConnection, NewExchangeLog};

/// Transactional store for connections and exchange logs.
///
/// Every method maps failures to [`FlowlinkError::Storage`].
#[async_trait]
pub trait IntegrationStore: Send + Sync {
    async fn create_connection(&self, new: &NewConnection) -> Result<Connection, FlowlinkError>;

    async fn get_connection(&self, id: i64) -> Result<Option<Connection>, FlowlinkError>;

    /// All connections ordered by name.
    async fn list_connections(&self) -> Result<Vec<Connection>, FlowlinkError>;

    /// Applies a partial update. Returns `None` when the connection is gone.
    async fn update_connection(
        &self,
        id: i64,
        update: &ConnectionUpdate,
    ) -> Result<Option<Connection>, FlowlinkError>;

    /// Deletes a connection and, by cascade, its logs. Returns whether a row
    /// was removed.
    async fn delete_connection(&self, id: i64) -> Result<bool, FlowlinkError>;

    /// Inserts the log entry and stamps `last_synced_at` / `last_sync_status`
    /// on the owning connection in one transaction. Either both land or
    /// neither does.
    async fn record_exchange(
        &self,
        log: &NewExchangeLog,
        last_sync_status: &str,
    ) -> Result<(ExchangeLog, Connection), FlowlinkError>;

    /// Logs of one connection, newest first.
    async fn list_logs(
        &self,
        connection_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<ExchangeLog>, FlowlinkError>;

    async fn count_logs(&self, connection_id: i64) -> Result<i64, FlowlinkError>;
}
