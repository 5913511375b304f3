// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue lifecycle: retries, terminal states, cancellation, worker pool.

use std::sync::Arc;
use std::time::Duration;

use flowlink_config::model::{ExchangeConfig, QueueConfig};
use async_trait::async_trait;
use flowlink_core::{
    ExchangeStatus, FlowlinkError, IntegrationStore, NewConnection, PartnerType, TaskBackend,
    TaskRecord, TaskState,
};
use flowlink_engine::ExchangeRunner;
use flowlink_queue::{MemoryTaskBackend, RetryPolicy, TaskQueue, WorkerPool};
use flowlink_test_utils::{MemoryStore, ScriptedConnectorFactory, Step};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

struct Fixture {
    store: Arc<MemoryStore>,
    factory: ScriptedConnectorFactory,
    queue: TaskQueue,
    connection_id: i64,
}

async fn fixture(steps: Vec<Step>, config: QueueConfig) -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let factory = ScriptedConnectorFactory::with_steps(steps);
    let connection = store
        .create_connection(&NewConnection {
            name: "prozorro".into(),
            description: String::new(),
            partner_type: PartnerType::Procurement,
            settings: json!({}),
            is_active: true,
        })
        .await
        .unwrap();
    let runner = ExchangeRunner::new(
        store.clone(),
        Arc::new(factory.clone()),
        &ExchangeConfig::default(),
    );
    let queue = TaskQueue::new(Arc::new(MemoryTaskBackend::new()), runner, &config);
    Fixture {
        store,
        factory,
        queue,
        connection_id: connection.id,
    }
}

fn eager() -> QueueConfig {
    QueueConfig {
        eager: true,
        ..QueueConfig::default()
    }
}

fn failures(n: usize) -> Vec<Step> {
    (0..n).map(|i| Step::Fail(format!("503: busy #{i}"))).collect()
}

#[tokio::test(start_paused = true)]
async fn persistent_failure_exhausts_attempts_with_growing_delays() {
    let fx = fixture(failures(5), eager()).await;

    let status = fx
        .queue
        .enqueue_sync(fx.connection_id, &json!({"q": "tenders"}))
        .await
        .unwrap();

    assert_eq!(status.state, TaskState::Failed);
    assert_eq!(status.retries, 4);
    assert!(status.error.unwrap().contains("503: busy #4"));

    let calls = fx.factory.calls().await;
    assert_eq!(calls.len(), 5);
    let gaps: Vec<Duration> = calls.windows(2).map(|w| w[1].at - w[0].at).collect();
    assert!(gaps.windows(2).all(|g| g[1] > g[0]), "gaps: {gaps:?}");
    assert!(gaps[0] >= Duration::from_secs(1));

    let logs = fx.store.all_logs().await;
    assert_eq!(logs.len(), 5);
    assert!(logs.iter().all(|l| l.status == ExchangeStatus::Error));
}

#[tokio::test(start_paused = true)]
async fn recovers_after_two_failures() {
    let mut steps = failures(2);
    steps.push(Step::Respond(200, json!({"data": [1, 2]})));
    let fx = fixture(steps, eager()).await;

    let status = fx
        .queue
        .enqueue_sync(fx.connection_id, &json!({}))
        .await
        .unwrap();

    assert_eq!(status.state, TaskState::Succeeded);
    assert_eq!(status.retries, 2);
    let details = status.details.unwrap();
    assert_eq!(details["status_code"], 200);
    assert_eq!(details["connection_id"], fx.connection_id);

    let logs = fx.store.all_logs().await;
    assert_eq!(logs.len(), 3);
    let errors = logs
        .iter()
        .filter(|l| l.status == ExchangeStatus::Error)
        .count();
    assert_eq!(errors, 2);
    let connection = fx
        .store
        .get_connection(fx.connection_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(connection.last_sync_status, "Success");
}

#[tokio::test]
async fn missing_connection_fails_without_retry() {
    let fx = fixture(vec![], eager()).await;

    let status = fx.queue.enqueue_sync(4242, &json!({})).await.unwrap();

    assert_eq!(status.state, TaskState::Failed);
    assert_eq!(status.retries, 0);
    assert!(status.error.unwrap().contains("not found"));
    assert!(fx.factory.calls().await.is_empty());
}

#[tokio::test]
async fn inactive_connection_fails_without_retry_or_log() {
    let fx = fixture(vec![], eager()).await;
    fx.store
        .update_connection(
            fx.connection_id,
            &flowlink_core::ConnectionUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let status = fx
        .queue
        .enqueue_sync(fx.connection_id, &json!({}))
        .await
        .unwrap();

    assert_eq!(status.state, TaskState::Failed);
    assert_eq!(status.retries, 0);
    assert!(status.error.unwrap().contains("disabled"));
    assert!(fx.store.all_logs().await.is_empty());
}

#[tokio::test]
async fn configuration_fault_is_not_retried() {
    let fx = fixture(vec![Step::Misconfigured("bad method".into())], eager()).await;

    let status = fx
        .queue
        .enqueue_sync(fx.connection_id, &json!({}))
        .await
        .unwrap();

    assert_eq!(status.state, TaskState::Failed);
    assert_eq!(fx.factory.calls().await.len(), 1);
}

#[tokio::test]
async fn status_reads_are_stable_and_unknown_ids_are_not_found() {
    let fx = fixture(vec![], QueueConfig::default()).await;
    let queued = fx
        .queue
        .enqueue_sync(fx.connection_id, &json!({}))
        .await
        .unwrap();
    assert_eq!(queued.state, TaskState::Queued);

    let first = fx.queue.get_task_status(&queued.task_id).await.unwrap();
    let second = fx.queue.get_task_status(&queued.task_id).await.unwrap();
    assert_eq!(first, second);

    assert!(matches!(
        fx.queue.get_task_status("no-such-task").await,
        Err(FlowlinkError::NotFound { .. })
    ));
}

#[tokio::test]
async fn cancelling_a_queued_task_fails_it() {
    let fx = fixture(vec![], QueueConfig::default()).await;
    let queued = fx
        .queue
        .enqueue_sync(fx.connection_id, &json!({}))
        .await
        .unwrap();

    let cancelled = fx.queue.cancel(&queued.task_id).await.unwrap();
    assert_eq!(cancelled.state, TaskState::Failed);
    assert_eq!(cancelled.error.as_deref(), Some("revoked"));

    assert!(!fx.queue.run_next().await.unwrap());
    assert!(fx.factory.calls().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn worker_pool_drains_and_retries() {
    let mut steps = failures(1);
    steps.push(Step::Respond(201, json!({"accepted": true})));
    let config = QueueConfig {
        workers: 2,
        ..QueueConfig::default()
    };
    let fx = fixture(steps, config.clone()).await;

    let shutdown = CancellationToken::new();
    let pool = tokio::spawn(WorkerPool::new(fx.queue.clone(), &config).run(shutdown.clone()));

    let queued = fx
        .queue
        .enqueue_sync(fx.connection_id, &json!({}))
        .await
        .unwrap();
    let done = fx
        .queue
        .wait(&queued.task_id, Duration::from_secs(60))
        .await
        .unwrap();

    assert_eq!(done.state, TaskState::Succeeded);
    assert_eq!(done.retries, 1);

    shutdown.cancel();
    pool.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn wait_times_out_on_pending_task() {
    let fx = fixture(vec![], QueueConfig::default()).await;
    let queued = fx
        .queue
        .enqueue_sync(fx.connection_id, &json!({}))
        .await
        .unwrap();

    let status = fx
        .queue
        .wait(&queued.task_id, Duration::from_secs(2))
        .await
        .unwrap();
    assert_eq!(status.state, TaskState::Queued);
}

#[tokio::test]
async fn sqlite_backend_runs_eager_retries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.db");
    let db = flowlink_storage::Database::open(&path.to_string_lossy())
        .await
        .unwrap();
    let store = Arc::new(flowlink_storage::SqliteStore::new(db.clone()));
    let connection = store
        .create_connection(&NewConnection {
            name: "medoc".into(),
            description: String::new(),
            partner_type: PartnerType::EdocSoap,
            settings: json!({}),
            is_active: true,
        })
        .await
        .unwrap();
    let mut steps = failures(1);
    steps.push(Step::Respond(200, json!({"ok": true})));
    let runner = ExchangeRunner::new(
        store.clone(),
        Arc::new(ScriptedConnectorFactory::with_steps(steps)),
        &ExchangeConfig::default(),
    );
    let queue = TaskQueue::new(
        Arc::new(flowlink_storage::SqliteTaskBackend::new(db)),
        runner,
        &eager(),
    )
    .with_policy(RetryPolicy {
        base_delay: Duration::from_millis(5),
        ..RetryPolicy::default()
    });

    let status = queue.enqueue_sync(connection.id, &json!({})).await.unwrap();

    assert_eq!(status.state, TaskState::Succeeded);
    assert_eq!(status.retries, 1);
    assert_eq!(store.count_logs(connection.id).await.unwrap(), 2);
}

/// Memory backend whose `complete` always hits a storage fault.
struct BrokenCompletion(MemoryTaskBackend);

#[async_trait]
impl TaskBackend for BrokenCompletion {
    async fn enqueue(
        &self,
        connection_id: i64,
        payload: &Value,
    ) -> Result<TaskRecord, FlowlinkError> {
        self.0.enqueue(connection_id, payload).await
    }
    async fn claim_next(&self) -> Result<Option<TaskRecord>, FlowlinkError> {
        self.0.claim_next().await
    }
    async fn claim(&self, id: &str) -> Result<Option<TaskRecord>, FlowlinkError> {
        self.0.claim(id).await
    }
    async fn complete(&self, _id: &str, _result: &Value) -> Result<TaskRecord, FlowlinkError> {
        Err(FlowlinkError::storage("disk I/O error"))
    }
    async fn schedule_retry(
        &self,
        id: &str,
        error: &str,
        delay_ms: u64,
    ) -> Result<TaskRecord, FlowlinkError> {
        self.0.schedule_retry(id, error, delay_ms).await
    }
    async fn fail(&self, id: &str, error: &str) -> Result<TaskRecord, FlowlinkError> {
        self.0.fail(id, error).await
    }
    async fn get(&self, id: &str) -> Result<Option<TaskRecord>, FlowlinkError> {
        self.0.get(id).await
    }
    async fn cancel(&self, id: &str) -> Result<bool, FlowlinkError> {
        self.0.cancel(id).await
    }
}

#[tokio::test]
async fn unrecordable_outcome_does_not_strand_task_in_running() {
    let fx = fixture(vec![Step::Respond(200, json!({"ok": true}))], QueueConfig::default()).await;
    let runner = ExchangeRunner::new(
        fx.store.clone(),
        Arc::new(fx.factory.clone()),
        &ExchangeConfig::default(),
    );
    let queue = TaskQueue::new(
        Arc::new(BrokenCompletion(MemoryTaskBackend::new())),
        runner,
        &QueueConfig::default(),
    );

    let queued = queue.enqueue_sync(fx.connection_id, &json!({})).await.unwrap();
    let err = queue.run_next().await.unwrap_err();
    assert!(matches!(err, FlowlinkError::Storage { .. }));

    let status = queue.get_task_status(&queued.task_id).await.unwrap();
    assert_eq!(status.state, TaskState::Failed);
    assert!(
        status
            .error
            .as_deref()
            .unwrap()
            .starts_with("could not record outcome")
    );
    assert!(!queue.run_next().await.unwrap());
    assert_eq!(fx.factory.calls().await.len(), 1);
}
