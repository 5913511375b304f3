// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Task queue adapter: enqueue syncs, run attempts, report status.
//!
//! One attempt loads the connection fresh, runs it through the
//! [`ExchangeRunner`] and then moves the task to `succeeded`, `retrying` or
//! `failed` according to the [`RetryPolicy`].

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use flowlink_config::model::QueueConfig;
use flowlink_core::{
    ExchangeContext, FlowlinkError, IntegrationTaskStatus, TaskBackend, TaskRecord, TaskState,
};
use flowlink_engine::ExchangeRunner;

use crate::retry::RetryPolicy;

/// How often [`TaskQueue::wait`] re-reads a task.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Front door of the asynchronous sync path.
#[derive(Clone)]
pub struct TaskQueue {
    backend: Arc<dyn TaskBackend>,
    runner: ExchangeRunner,
    policy: RetryPolicy,
    eager: bool,
    wakeup: Arc<Notify>,
}

impl TaskQueue {
    pub fn new(backend: Arc<dyn TaskBackend>, runner: ExchangeRunner, config: &QueueConfig) -> Self {
        Self {
            backend,
            runner,
            policy: RetryPolicy::from_config(config),
            eager: config.eager,
            wakeup: Arc::new(Notify::new()),
        }
    }

    /// Replaces the retry policy derived from configuration.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn is_eager(&self) -> bool {
        self.eager
    }

    /// Signalled whenever a task becomes claimable.
    pub(crate) fn wakeup(&self) -> &Arc<Notify> {
        &self.wakeup
    }

    /// Queues a sync of `connection_id`.
    ///
    /// In eager mode the task runs to completion, retries included, before
    /// this returns, and the status is terminal.
    pub async fn enqueue_sync(
        &self,
        connection_id: i64,
        payload: &Value,
    ) -> Result<IntegrationTaskStatus, FlowlinkError> {
        let task = self.backend.enqueue(connection_id, payload).await?;
        info!(task_id = %task.id, connection_id, eager = self.eager, "sync task enqueued");

        if !self.eager {
            self.wakeup.notify_one();
            return Ok(IntegrationTaskStatus::from(&task));
        }
        let finished = self.run_inline(&task.id).await?;
        Ok(IntegrationTaskStatus::from(&finished))
    }

    /// Read-only status lookup.
    pub async fn get_task_status(
        &self,
        task_id: &str,
    ) -> Result<IntegrationTaskStatus, FlowlinkError> {
        self.backend
            .get(task_id)
            .await?
            .map(|task| IntegrationTaskStatus::from(&task))
            .ok_or_else(|| FlowlinkError::not_found("task", task_id))
    }

    /// Polls until the task is terminal or `timeout` elapses, then returns
    /// whatever status it has.
    pub async fn wait(
        &self,
        task_id: &str,
        timeout: Duration,
    ) -> Result<IntegrationTaskStatus, FlowlinkError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let status = self.get_task_status(task_id).await?;
            if status.state.is_terminal() || tokio::time::Instant::now() >= deadline {
                return Ok(status);
            }
            tokio::time::sleep_until(deadline.min(tokio::time::Instant::now() + WAIT_POLL_INTERVAL))
                .await;
        }
    }

    /// Revokes a task. Unknown ids are [`FlowlinkError::NotFound`]; a task
    /// that already finished is returned unchanged.
    pub async fn cancel(&self, task_id: &str) -> Result<IntegrationTaskStatus, FlowlinkError> {
        if self.backend.cancel(task_id).await? {
            info!(task_id, "task revoked");
        }
        self.get_task_status(task_id).await
    }

    /// Claims the next due task and runs one attempt of it.
    ///
    /// Returns `false` when nothing was due.
    pub async fn run_next(&self) -> Result<bool, FlowlinkError> {
        match self.backend.claim_next().await? {
            Some(task) => {
                self.run_attempt(task).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn run_inline(&self, task_id: &str) -> Result<TaskRecord, FlowlinkError> {
        loop {
            let Some(task) = self.backend.claim(task_id).await? else {
                return self
                    .backend
                    .get(task_id)
                    .await?
                    .ok_or_else(|| FlowlinkError::not_found("task", task_id));
            };
            match self.run_attempt(task).await? {
                (after, Some(delay)) if after.state == TaskState::Retrying => {
                    tokio::time::sleep(delay).await;
                }
                (after, _) => return Ok(after),
            }
        }
    }

    /// Runs one claimed attempt and records the resulting transition.
    ///
    /// Returns the updated record and, when a retry was scheduled, its delay.
    async fn run_attempt(
        &self,
        task: TaskRecord,
    ) -> Result<(TaskRecord, Option<Duration>), FlowlinkError> {
        let attempt = task.attempts;
        debug!(task_id = %task.id, connection_id = task.connection_id, attempt, "running sync attempt");

        let outcome = match self.runner.store().get_connection(task.connection_id).await {
            Ok(Some(connection)) => {
                self.runner
                    .run_sync(&connection, &task.payload, ExchangeContext::Worker)
                    .await
            }
            Ok(None) => Err(FlowlinkError::not_found("connection", task.connection_id)),
            Err(err) => Err(err),
        };

        match outcome {
            Ok(outcome) => {
                let written = self.backend.complete(&task.id, &outcome.task_result()).await;
                let done = self.settle(&task, written).await?;
                info!(
                    task_id = %task.id,
                    connection_id = task.connection_id,
                    attempt,
                    state = %done.state,
                    "sync task finished"
                );
                Ok((done, None))
            }
            Err(err) if self.policy.should_retry(&err, attempt) => {
                let delay = self.policy.delay_for(attempt);
                warn!(
                    task_id = %task.id,
                    connection_id = task.connection_id,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "sync attempt failed, retrying"
                );
                let written = self
                    .backend
                    .schedule_retry(&task.id, &err.to_string(), delay.as_millis() as u64)
                    .await;
                let scheduled = self.settle(&task, written).await?;
                Ok((scheduled, Some(delay)))
            }
            Err(err) => {
                warn!(
                    task_id = %task.id,
                    connection_id = task.connection_id,
                    attempt,
                    kind = err.kind(),
                    error = %err,
                    "sync task failed"
                );
                let failed = self.backend.fail(&task.id, &err.to_string()).await?;
                Ok((failed, None))
            }
        }
    }

    /// Passes a successful state write through. When the write failed the
    /// task is still `running`; try once to fail it so readers see a final
    /// state. If that fails too, the claim lease releases the task later.
    async fn settle(
        &self,
        task: &TaskRecord,
        written: Result<TaskRecord, FlowlinkError>,
    ) -> Result<TaskRecord, FlowlinkError> {
        let err = match written {
            Ok(record) => return Ok(record),
            Err(err) => err,
        };
        warn!(task_id = %task.id, error = %err, "could not record task outcome");
        let reason = format!("could not record outcome: {err}");
        if let Err(fallback) = self.backend.fail(&task.id, &reason).await {
            warn!(
                task_id = %task.id,
                error = %fallback,
                "could not fail task, leaving it to lease expiry"
            );
        }
        Err(err)
    }
}
