// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exchange runner: one connector call plus its audit trail.
//!
//! Every call that reaches a connector leaves exactly one log entry and
//! stamps the owning connection, whether the partner answered or not. Faults
//! raised before the connector is invoked (disabled connection, bad
//! settings) leave no trace in the log.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, info, warn};

use flowlink_config::model::ExchangeConfig;
use flowlink_core::types::now_timestamp;
use flowlink_core::{
    Connection, ConnectorFactory, Direction, ExchangeContext, ExchangeLog, ExchangeResult,
    ExchangeStatus, FlowlinkError, IntegrationActionResult, IntegrationStore, NewExchangeLog,
};

use crate::summary::{ExchangeAction, SummaryOutcome, build_summary, render_summary};

/// A finished exchange: what the partner answered and what was recorded.
#[derive(Debug, Clone)]
pub struct ExchangeOutcome {
    pub log: ExchangeLog,
    /// The connection as stamped by this exchange.
    pub connection: Connection,
    pub status_code: u16,
    pub body: Value,
}

impl ExchangeOutcome {
    /// Shape returned by a synchronous sync.
    pub fn sync_result(&self) -> IntegrationActionResult {
        IntegrationActionResult {
            status: "success".into(),
            details: json!({
                "status_code": self.status_code,
                "response": self.body,
            }),
        }
    }

    /// Shape returned by a connection test.
    pub fn ping_result(&self) -> IntegrationActionResult {
        IntegrationActionResult {
            status: "ok".into(),
            details: json!({ "response": self.body }),
        }
    }

    /// Result stored on a queued task that succeeded.
    pub fn task_result(&self) -> Value {
        json!({
            "connection_id": self.connection.id,
            "log_id": self.log.id,
            "status_code": self.status_code,
            "response": self.body,
        })
    }
}

/// Runs connector calls against connections and records their outcome.
#[derive(Clone)]
pub struct ExchangeRunner {
    store: Arc<dyn IntegrationStore>,
    factory: Arc<dyn ConnectorFactory>,
    payload_budget: usize,
}

impl ExchangeRunner {
    pub fn new(
        store: Arc<dyn IntegrationStore>,
        factory: Arc<dyn ConnectorFactory>,
        config: &ExchangeConfig,
    ) -> Self {
        Self {
            store,
            factory,
            payload_budget: config.log_payload_budget,
        }
    }

    pub fn store(&self) -> &Arc<dyn IntegrationStore> {
        &self.store
    }

    pub fn factory(&self) -> &Arc<dyn ConnectorFactory> {
        &self.factory
    }

    /// Sends `payload` to the partner behind `connection`.
    ///
    /// A disabled connection fails with [`FlowlinkError::Inactive`] before
    /// any connector is built. A `null` payload is sent as `{}`.
    pub async fn run_sync(
        &self,
        connection: &Connection,
        payload: &Value,
        context: ExchangeContext,
    ) -> Result<ExchangeOutcome, FlowlinkError> {
        if !connection.is_active {
            debug!(connection_id = connection.id, "sync refused: connection disabled");
            return Err(FlowlinkError::Inactive {
                connection_id: connection.id,
            });
        }
        let payload = if payload.is_null() {
            json!({})
        } else {
            payload.clone()
        };
        self.execute(connection, ExchangeAction::Sync, Some(&payload), context)
            .await
    }

    /// Checks that the partner is reachable. Works on disabled connections.
    pub async fn run_ping(
        &self,
        connection: &Connection,
        context: ExchangeContext,
    ) -> Result<ExchangeOutcome, FlowlinkError> {
        self.execute(connection, ExchangeAction::Test, None, context)
            .await
    }

    async fn execute(
        &self,
        connection: &Connection,
        action: ExchangeAction,
        payload: Option<&Value>,
        context: ExchangeContext,
    ) -> Result<ExchangeOutcome, FlowlinkError> {
        let connector = self
            .factory
            .build(connection.partner_type, &connection.settings)?;

        let called = match (action, payload) {
            (ExchangeAction::Sync, Some(payload)) => connector.sync(payload).await,
            _ => connector.ping().await,
        };

        match called {
            Ok(ExchangeResult {
                status_code, body, ..
            }) => {
                let summary =
                    build_summary(action, payload, context, SummaryOutcome::Response(&body));
                let (log, connection) = self
                    .record(
                        connection.id,
                        ExchangeStatus::Success,
                        &summary,
                        i64::from(status_code),
                    )
                    .await?;
                info!(
                    connection_id = connection.id,
                    partner_type = %connection.partner_type,
                    action = action.as_str(),
                    context = %context,
                    status_code,
                    log_id = log.id,
                    "exchange succeeded"
                );
                Ok(ExchangeOutcome {
                    log,
                    connection,
                    status_code,
                    body,
                })
            }
            Err(err @ FlowlinkError::Storage { .. }) => Err(err),
            Err(err) => {
                let detail = error_detail(&err);
                warn!(
                    connection_id = connection.id,
                    partner_type = %connection.partner_type,
                    action = action.as_str(),
                    context = %context,
                    error = %detail,
                    "exchange failed"
                );
                let summary =
                    build_summary(action, payload, context, SummaryOutcome::Error(&detail));
                if let Err(store_err) = self
                    .record(connection.id, ExchangeStatus::Error, &summary, 0)
                    .await
                {
                    warn!(
                        connection_id = connection.id,
                        error = %store_err,
                        "could not record failed exchange"
                    );
                    return Err(store_err);
                }
                Err(err)
            }
        }
    }

    async fn record(
        &self,
        connection_id: i64,
        status: ExchangeStatus,
        summary: &Value,
        response_code: i64,
    ) -> Result<(ExchangeLog, Connection), FlowlinkError> {
        let entry = NewExchangeLog {
            connection_id,
            direction: Direction::Outbound,
            status,
            payload: render_summary(summary, self.payload_budget),
            response_code,
            created_at: now_timestamp(),
        };
        self.store
            .record_exchange(&entry, &status.connection_status_text())
            .await
    }
}

/// Text recorded in the log for a failed call.
fn error_detail(err: &FlowlinkError) -> String {
    match err {
        FlowlinkError::Integration { message, .. } => message.clone(),
        FlowlinkError::Config(message) => message.clone(),
        other => other.to_string(),
    }
}
