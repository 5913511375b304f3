// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory [`IntegrationStore`] for fast, deterministic tests.
//!
//! Mirrors the SQLite store's semantics (name ordering, newest-first logs,
//! cascade delete, atomic exchange recording) and can be told to fail every
//! write to exercise storage fault paths.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use flowlink_core::types::{NEVER_SYNCED, now_timestamp};
use flowlink_core::{
    Connection, ConnectionUpdate, ExchangeLog, FlowlinkError, IntegrationStore, NewConnection,
    NewExchangeLog,
};

#[derive(Default)]
struct State {
    next_connection_id: i64,
    next_log_id: i64,
    connections: BTreeMap<i64, Connection>,
    logs: Vec<ExchangeLog>,
}

/// Connections and logs kept in process memory.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail with [`FlowlinkError::Storage`].
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Every log entry across all connections, oldest first.
    pub async fn all_logs(&self) -> Vec<ExchangeLog> {
        self.state.lock().await.logs.clone()
    }

    fn check_writable(&self) -> Result<(), FlowlinkError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(FlowlinkError::storage("simulated write failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl IntegrationStore for MemoryStore {
    async fn create_connection(&self, new: &NewConnection) -> Result<Connection, FlowlinkError> {
        self.check_writable()?;
        let mut state = self.state.lock().await;
        state.next_connection_id += 1;
        let now = now_timestamp();
        let connection = Connection {
            id: state.next_connection_id,
            name: new.name.clone(),
            description: new.description.clone(),
            partner_type: new.partner_type,
            settings: new.settings.clone(),
            is_active: new.is_active,
            created_at: now.clone(),
            updated_at: now,
            last_synced_at: None,
            last_sync_status: NEVER_SYNCED.to_string(),
        };
        state.connections.insert(connection.id, connection.clone());
        Ok(connection)
    }

    async fn get_connection(&self, id: i64) -> Result<Option<Connection>, FlowlinkError> {
        Ok(self.state.lock().await.connections.get(&id).cloned())
    }

    async fn list_connections(&self) -> Result<Vec<Connection>, FlowlinkError> {
        let mut all: Vec<Connection> =
            self.state.lock().await.connections.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn update_connection(
        &self,
        id: i64,
        update: &ConnectionUpdate,
    ) -> Result<Option<Connection>, FlowlinkError> {
        self.check_writable()?;
        let mut state = self.state.lock().await;
        let Some(conn) = state.connections.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &update.name {
            conn.name = name.clone();
        }
        if let Some(description) = &update.description {
            conn.description = description.clone();
        }
        if let Some(settings) = &update.settings {
            conn.settings = settings.clone();
        }
        if let Some(is_active) = update.is_active {
            conn.is_active = is_active;
        }
        conn.updated_at = now_timestamp();
        Ok(Some(conn.clone()))
    }

    async fn delete_connection(&self, id: i64) -> Result<bool, FlowlinkError> {
        self.check_writable()?;
        let mut state = self.state.lock().await;
        let removed = state.connections.remove(&id).is_some();
        if removed {
            state.logs.retain(|log| log.connection_id != id);
        }
        Ok(removed)
    }

    async fn record_exchange(
        &self,
        log: &NewExchangeLog,
        last_sync_status: &str,
    ) -> Result<(ExchangeLog, Connection), FlowlinkError> {
        self.check_writable()?;
        let mut state = self.state.lock().await;
        state.next_log_id += 1;
        let log_id = state.next_log_id;

        let Some(conn) = state.connections.get_mut(&log.connection_id) else {
            return Err(FlowlinkError::storage(format!(
                "connection {} does not exist",
                log.connection_id
            )));
        };
        conn.last_synced_at = Some(log.created_at.clone());
        conn.last_sync_status = last_sync_status.to_string();
        conn.updated_at = log.created_at.clone();
        let connection = conn.clone();

        let stored = ExchangeLog {
            id: log_id,
            connection_id: log.connection_id,
            direction: log.direction,
            status: log.status,
            payload: log.payload.clone(),
            response_code: log.response_code,
            created_at: log.created_at.clone(),
        };
        state.logs.push(stored.clone());
        Ok((stored, connection))
    }

    async fn list_logs(
        &self,
        connection_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<ExchangeLog>, FlowlinkError> {
        let state = self.state.lock().await;
        let mut logs: Vec<ExchangeLog> = state
            .logs
            .iter()
            .filter(|log| log.connection_id == connection_id)
            .cloned()
            .collect();
        logs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        if let Some(limit) = limit.filter(|l| *l >= 0) {
            logs.truncate(limit as usize);
        }
        Ok(logs)
    }

    async fn count_logs(&self, connection_id: i64) -> Result<i64, FlowlinkError> {
        let state = self.state.lock().await;
        Ok(state
            .logs
            .iter()
            .filter(|log| log.connection_id == connection_id)
            .count() as i64)
    }
}
