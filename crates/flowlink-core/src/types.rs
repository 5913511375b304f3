// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the connector, storage, runner, and queue crates.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

/// Timestamp format used for every persisted timestamp.
///
/// Fixed-width UTC so that lexicographic order equals chronological order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Status text of a connection that has never exchanged anything.
pub const NEVER_SYNCED: &str = "Never synced";

/// Returns the current UTC time in [`TIMESTAMP_FORMAT`].
pub fn now_timestamp() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Returns the UTC time `delay` from now in [`TIMESTAMP_FORMAT`].
pub fn timestamp_after(delay: std::time::Duration) -> String {
    let delay = chrono::Duration::from_std(delay).unwrap_or(chrono::Duration::MAX);
    chrono::Utc::now()
        .checked_add_signed(delay)
        .unwrap_or(chrono::DateTime::<chrono::Utc>::MAX_UTC)
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

/// The kind of partner system a connection talks to.
///
/// Fixed at connection creation; switching partners means a new connection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PartnerType {
    /// OData/REST accounting gateway (catalogs, documents, accounts).
    AccountingOdata,
    /// SOAP-style electronic document exchange with base64 XML payloads.
    #[serde(rename = "e-doc-soap")]
    #[strum(serialize = "e-doc-soap")]
    EdocSoap,
    /// Tax authority REST endpoints.
    TaxRest,
    /// Digital signature / government identity partner.
    DigitalSignature,
    /// Public procurement search API.
    Procurement,
    /// Arbitrary HTTP webhook receiver.
    GenericWebhook,
}

impl PartnerType {
    /// Every supported partner type, in declaration order.
    pub const ALL: [PartnerType; 6] = [
        PartnerType::AccountingOdata,
        PartnerType::EdocSoap,
        PartnerType::TaxRest,
        PartnerType::DigitalSignature,
        PartnerType::Procurement,
        PartnerType::GenericWebhook,
    ];
}

/// A configured link to one partner integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub partner_type: PartnerType,
    /// Partner-specific settings. Only the connector layer interprets them.
    pub settings: Value,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
    pub last_synced_at: Option<String>,
    pub last_sync_status: String,
}

/// Input for creating a connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewConnection {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub partner_type: PartnerType,
    #[serde(default = "empty_settings")]
    pub settings: Value,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Partial update of a connection. The partner type is deliberately absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub settings: Option<Value>,
    pub is_active: Option<bool>,
}

fn empty_settings() -> Value {
    Value::Object(serde_json::Map::new())
}

fn default_true() -> bool {
    true
}

/// Direction of an exchange relative to this system.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Outbound,
    Inbound,
}

/// Outcome of an exchange as recorded in the log.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExchangeStatus {
    Success,
    Error,
}

impl ExchangeStatus {
    /// The rolling `last_sync_status` text written to the owning connection.
    pub fn connection_status_text(&self) -> String {
        match self {
            ExchangeStatus::Success => "Success".to_string(),
            ExchangeStatus::Error => format!("Failed ({self})"),
        }
    }
}

/// Immutable audit record of one attempted exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeLog {
    pub id: i64,
    pub connection_id: i64,
    pub direction: Direction,
    pub status: ExchangeStatus,
    /// Serialized exchange summary, already truncated to the byte budget.
    pub payload: String,
    /// Remote status code, or 0 when the remote side was never reached.
    pub response_code: i64,
    pub created_at: String,
}

/// A log entry about to be written together with its connection status update.
#[derive(Debug, Clone)]
pub struct NewExchangeLog {
    pub connection_id: i64,
    pub direction: Direction,
    pub status: ExchangeStatus,
    pub payload: String,
    pub response_code: i64,
    pub created_at: String,
}

/// Generic response of a connector call.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeResult {
    pub status_code: u16,
    pub body: Value,
    pub request_payload: Value,
}

/// Where an exchange was initiated from. Recorded in every log summary.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExchangeContext {
    Api,
    Worker,
    Cli,
}

/// Lifecycle state of a queued sync task.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TaskState {
    Queued,
    Running,
    Retrying,
    Succeeded,
    Failed,
}

impl TaskState {
    /// Succeeded and failed tasks never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed)
    }
}

/// A queued sync exchange with its own retry lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub connection_id: i64,
    pub payload: Value,
    pub state: TaskState,
    /// Number of attempts started so far.
    pub attempts: u32,
    /// Number of retries scheduled so far (attempts after the first).
    pub retry_count: u32,
    pub last_error: Option<String>,
    pub result: Option<Value>,
    /// Earliest time the next attempt may start.
    pub next_attempt_at: String,
    /// Set when the task was revoked while an attempt was in flight.
    pub revoked: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// An authenticated caller. The engine carries it but never checks it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: i64,
    pub role: String,
}

/// Result of a synchronous ping or sync, as returned to the API layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationActionResult {
    pub status: String,
    pub details: Value,
}

/// Polled view of a queued task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationTaskStatus {
    pub task_id: String,
    pub state: TaskState,
    pub retries: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&TaskRecord> for IntegrationTaskStatus {
    fn from(task: &TaskRecord) -> Self {
        Self {
            task_id: task.id.clone(),
            state: task.state,
            retries: task.retry_count,
            details: task.result.clone(),
            error: task.last_error.clone(),
        }
    }
}

/// Response of a sandbox simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationSandboxExchange {
    pub sandbox: String,
    pub echo: Value,
    pub response: Value,
    pub notes: Vec<String>,
}
