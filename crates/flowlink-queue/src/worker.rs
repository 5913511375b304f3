// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Worker pool draining the task queue.
//!
//! Each worker claims due tasks independently. When nothing is due it sleeps
//! for the poll interval or until a new task is enqueued. Cancelling the
//! token stops workers from claiming; an attempt already in flight finishes.

use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use flowlink_config::model::QueueConfig;

use crate::queue::TaskQueue;

/// A fixed set of workers sharing one [`TaskQueue`].
pub struct WorkerPool {
    queue: TaskQueue,
    workers: usize,
    poll_interval: Duration,
}

impl WorkerPool {
    pub fn new(queue: TaskQueue, config: &QueueConfig) -> Self {
        Self {
            queue,
            workers: config.workers.max(1),
            poll_interval: config.poll_interval(),
        }
    }

    /// Runs until `shutdown` is cancelled and every worker has stopped.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(workers = self.workers, "worker pool started");
        let mut set = JoinSet::new();
        for worker in 0..self.workers {
            set.spawn(worker_loop(
                worker,
                self.queue.clone(),
                self.poll_interval,
                shutdown.clone(),
            ));
        }
        while let Some(joined) = set.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "worker task panicked");
            }
        }
        info!("worker pool stopped");
    }
}

async fn worker_loop(
    worker: usize,
    queue: TaskQueue,
    poll_interval: Duration,
    shutdown: CancellationToken,
) {
    debug!(worker, "worker started");
    while !shutdown.is_cancelled() {
        match queue.run_next().await {
            Ok(true) => continue,
            Ok(false) => {}
            Err(e) => error!(worker, error = %e, "worker could not process task"),
        }
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = queue.wakeup().notified() => {}
            _ = tokio::time::sleep(poll_interval) => {}
        }
    }
    debug!(worker, "worker stopped");
}
