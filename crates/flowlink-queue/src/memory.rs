// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process task backend.
//!
//! Tasks vanish with the process. Eligibility is tracked on the tokio clock,
//! so paused-time tests drive retries deterministically.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::Instant;

use flowlink_core::types::{now_timestamp, timestamp_after};
use flowlink_core::{FlowlinkError, TaskBackend, TaskRecord, TaskState};

/// Error text recorded on revoked tasks.
pub const REVOKED_ERROR: &str = "revoked";

struct Entry {
    record: TaskRecord,
    eligible_at: Instant,
    /// Insertion order, used to break ties between equally eligible tasks.
    seq: u64,
}

#[derive(Default)]
struct Inner {
    next_seq: u64,
    tasks: HashMap<String, Entry>,
}

impl Inner {
    fn entry_mut(&mut self, id: &str) -> Result<&mut Entry, FlowlinkError> {
        self.tasks
            .get_mut(id)
            .ok_or_else(|| FlowlinkError::not_found("task", id))
    }
}

/// Task records held in a mutex-guarded map.
#[derive(Default)]
pub struct MemoryTaskBackend {
    inner: Mutex<Inner>,
}

impl MemoryTaskBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

fn is_pending(record: &TaskRecord) -> bool {
    matches!(record.state, TaskState::Queued | TaskState::Retrying) && !record.revoked
}

fn mark_running(entry: &mut Entry) -> TaskRecord {
    entry.record.state = TaskState::Running;
    entry.record.attempts += 1;
    entry.record.updated_at = now_timestamp();
    entry.record.clone()
}

#[async_trait]
impl TaskBackend for MemoryTaskBackend {
    async fn enqueue(
        &self,
        connection_id: i64,
        payload: &Value,
    ) -> Result<TaskRecord, FlowlinkError> {
        let now = now_timestamp();
        let record = TaskRecord {
            id: uuid::Uuid::new_v4().to_string(),
            connection_id,
            payload: payload.clone(),
            state: TaskState::Queued,
            attempts: 0,
            retry_count: 0,
            last_error: None,
            result: None,
            next_attempt_at: now.clone(),
            revoked: false,
            created_at: now.clone(),
            updated_at: now,
        };
        let mut inner = self.inner.lock().await;
        inner.next_seq += 1;
        let seq = inner.next_seq;
        inner.tasks.insert(
            record.id.clone(),
            Entry {
                record: record.clone(),
                eligible_at: Instant::now(),
                seq,
            },
        );
        Ok(record)
    }

    async fn claim_next(&self) -> Result<Option<TaskRecord>, FlowlinkError> {
        let now = Instant::now();
        let mut inner = self.inner.lock().await;
        let candidate = inner
            .tasks
            .values_mut()
            .filter(|e| is_pending(&e.record) && e.eligible_at <= now)
            .min_by_key(|e| (e.eligible_at, e.seq));
        Ok(candidate.map(mark_running))
    }

    async fn claim(&self, id: &str) -> Result<Option<TaskRecord>, FlowlinkError> {
        let mut inner = self.inner.lock().await;
        Ok(inner
            .tasks
            .get_mut(id)
            .filter(|e| is_pending(&e.record))
            .map(mark_running))
    }

    async fn complete(&self, id: &str, result: &Value) -> Result<TaskRecord, FlowlinkError> {
        let mut inner = self.inner.lock().await;
        let entry = inner.entry_mut(id)?;
        let record = &mut entry.record;
        if record.state == TaskState::Running {
            if record.revoked {
                record.state = TaskState::Failed;
                record.result = None;
                record.last_error = Some(REVOKED_ERROR.into());
            } else {
                record.state = TaskState::Succeeded;
                record.result = Some(result.clone());
                record.last_error = None;
            }
            record.updated_at = now_timestamp();
        }
        Ok(record.clone())
    }

    async fn schedule_retry(
        &self,
        id: &str,
        error: &str,
        delay_ms: u64,
    ) -> Result<TaskRecord, FlowlinkError> {
        let mut inner = self.inner.lock().await;
        let entry = inner.entry_mut(id)?;
        if entry.record.state == TaskState::Running {
            let delay = Duration::from_millis(delay_ms);
            let record = &mut entry.record;
            if record.revoked {
                record.state = TaskState::Failed;
                record.last_error = Some(REVOKED_ERROR.into());
            } else {
                record.state = TaskState::Retrying;
                record.retry_count += 1;
                record.last_error = Some(error.into());
            }
            record.next_attempt_at = timestamp_after(delay);
            record.updated_at = now_timestamp();
            entry.eligible_at = Instant::now() + delay;
        }
        Ok(entry.record.clone())
    }

    async fn fail(&self, id: &str, error: &str) -> Result<TaskRecord, FlowlinkError> {
        let mut inner = self.inner.lock().await;
        let record = &mut inner.entry_mut(id)?.record;
        if !record.state.is_terminal() {
            record.state = TaskState::Failed;
            record.last_error = Some(error.into());
            record.updated_at = now_timestamp();
        }
        Ok(record.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<TaskRecord>, FlowlinkError> {
        let inner = self.inner.lock().await;
        Ok(inner.tasks.get(id).map(|e| e.record.clone()))
    }

    async fn cancel(&self, id: &str) -> Result<bool, FlowlinkError> {
        let mut inner = self.inner.lock().await;
        let Some(entry) = inner.tasks.get_mut(id) else {
            return Ok(false);
        };
        let record = &mut entry.record;
        match record.state {
            TaskState::Queued | TaskState::Retrying => {
                record.state = TaskState::Failed;
                record.revoked = true;
                record.last_error = Some(REVOKED_ERROR.into());
            }
            TaskState::Running => record.revoked = true,
            TaskState::Succeeded | TaskState::Failed => return Ok(false),
        }
        record.updated_at = now_timestamp();
        Ok(true)
    }
}
