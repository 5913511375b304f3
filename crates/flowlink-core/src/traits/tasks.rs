// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Task queue backend: owns task records and their state transitions.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::FlowlinkError;
use crate::types::TaskRecord;

/// Storage of queued sync tasks.
///
/// State transitions are driven by the worker; readers only ever call
/// [`TaskBackend::get`], which must not mutate anything.
#[async_trait]
pub trait TaskBackend: Send + Sync {
    /// Creates a task in the `queued` state, eligible immediately.
    async fn enqueue(&self, connection_id: i64, payload: &Value)
    -> Result<TaskRecord, FlowlinkError>;

    /// Atomically picks the oldest eligible queued/retrying task whose
    /// next-attempt time has passed, moves it to `running` and bumps its
    /// attempt counter. Durable backends also hand out `running` tasks whose
    /// claim lease expired, as a new attempt.
    async fn claim_next(&self) -> Result<Option<TaskRecord>, FlowlinkError>;

    /// Claims one specific task if it is eligible. Used by eager execution.
    async fn claim(&self, id: &str) -> Result<Option<TaskRecord>, FlowlinkError>;

    /// Marks a running task as succeeded. A task revoked mid-flight ends as
    /// failed instead and the result is dropped. Returns the final record.
    async fn complete(&self, id: &str, result: &Value) -> Result<TaskRecord, FlowlinkError>;

    /// Moves a running task to `retrying`, increments its retry count and
    /// sets the next eligible time `delay_ms` from now.
    async fn schedule_retry(
        &self,
        id: &str,
        error: &str,
        delay_ms: u64,
    ) -> Result<TaskRecord, FlowlinkError>;

    /// Marks a task as failed for good.
    async fn fail(&self, id: &str, error: &str) -> Result<TaskRecord, FlowlinkError>;

    /// Read-only lookup.
    async fn get(&self, id: &str) -> Result<Option<TaskRecord>, FlowlinkError>;

    /// Revokes a task. Queued or retrying tasks fail immediately; running
    /// tasks are flagged so their result is discarded. Returns `false` when
    /// the task is unknown or already terminal.
    async fn cancel(&self, id: &str) -> Result<bool, FlowlinkError>;
}
