// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection management on top of the store.
//!
//! Settings are validated through the connector factory whenever they are
//! written, so a stored connection always builds.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use flowlink_core::{
    Connection, ConnectionUpdate, ConnectorFactory, ExchangeContext, ExchangeLog, FlowlinkError,
    IntegrationStore, NewConnection,
};

use crate::runner::{ExchangeOutcome, ExchangeRunner};

/// CRUD over connections plus id-based ping/sync entry points.
#[derive(Clone)]
pub struct ConnectionService {
    runner: ExchangeRunner,
}

impl ConnectionService {
    pub fn new(runner: ExchangeRunner) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &ExchangeRunner {
        &self.runner
    }

    fn store(&self) -> &Arc<dyn IntegrationStore> {
        self.runner.store()
    }

    fn factory(&self) -> &Arc<dyn ConnectorFactory> {
        self.runner.factory()
    }

    pub async fn create(&self, new: NewConnection) -> Result<Connection, FlowlinkError> {
        if new.name.trim().is_empty() {
            return Err(FlowlinkError::Config(
                "connection name must not be empty".into(),
            ));
        }
        self.factory().validate(new.partner_type, &new.settings)?;
        let connection = self.store().create_connection(&new).await?;
        info!(
            connection_id = connection.id,
            partner_type = %connection.partner_type,
            "connection created"
        );
        Ok(connection)
    }

    pub async fn get(&self, id: i64) -> Result<Connection, FlowlinkError> {
        self.store()
            .get_connection(id)
            .await?
            .ok_or_else(|| FlowlinkError::not_found("connection", id))
    }

    pub async fn list(&self) -> Result<Vec<Connection>, FlowlinkError> {
        self.store().list_connections().await
    }

    /// Applies a partial update. New settings are checked against the
    /// connection's existing partner type.
    pub async fn update(
        &self,
        id: i64,
        update: ConnectionUpdate,
    ) -> Result<Connection, FlowlinkError> {
        let existing = self.get(id).await?;
        if let Some(name) = &update.name
            && name.trim().is_empty()
        {
            return Err(FlowlinkError::Config(
                "connection name must not be empty".into(),
            ));
        }
        if let Some(settings) = &update.settings {
            self.factory().validate(existing.partner_type, settings)?;
        }
        let updated = self
            .store()
            .update_connection(id, &update)
            .await?
            .ok_or_else(|| FlowlinkError::not_found("connection", id))?;
        info!(connection_id = id, "connection updated");
        Ok(updated)
    }

    pub async fn set_active(&self, id: i64, active: bool) -> Result<Connection, FlowlinkError> {
        self.update(
            id,
            ConnectionUpdate {
                is_active: Some(active),
                ..Default::default()
            },
        )
        .await
    }

    /// Deletes a connection together with its logs.
    pub async fn delete(&self, id: i64) -> Result<(), FlowlinkError> {
        if !self.store().delete_connection(id).await? {
            return Err(FlowlinkError::not_found("connection", id));
        }
        info!(connection_id = id, "connection deleted");
        Ok(())
    }

    /// Newest-first logs of an existing connection.
    pub async fn logs(&self, id: i64, limit: Option<i64>) -> Result<Vec<ExchangeLog>, FlowlinkError> {
        self.get(id).await?;
        self.store().list_logs(id, limit).await
    }

    pub async fn ping(
        &self,
        id: i64,
        context: ExchangeContext,
    ) -> Result<ExchangeOutcome, FlowlinkError> {
        let connection = self.get(id).await?;
        self.runner.run_ping(&connection, context).await
    }

    pub async fn sync(
        &self,
        id: i64,
        payload: &Value,
        context: ExchangeContext,
    ) -> Result<ExchangeOutcome, FlowlinkError> {
        let connection = self.get(id).await?;
        self.runner.run_sync(&connection, payload, context).await
    }
}
