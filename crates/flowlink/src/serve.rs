// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `flowlink serve`: run the worker pool until SIGINT/SIGTERM.
//!
//! Workers stop claiming new tasks once a signal arrives; attempts already
//! in flight finish and record their outcome before the database closes.

use flowlink_config::model::QueueBackendKind;
use flowlink_core::FlowlinkError;
use flowlink_queue::WorkerPool;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::app::App;

/// Returns a token cancelled on the first SIGINT or SIGTERM.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT, shutting down"),
                        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "SIGTERM handler unavailable, waiting for Ctrl+C only");
                    let _ = ctrl_c.await;
                    info!("received SIGINT, shutting down");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, shutting down");
        }

        trigger.cancel();
        debug!("signal handler completed");
    });

    token
}

pub async fn run_serve(app: App) -> Result<(), FlowlinkError> {
    let queue_config = app.config.queue.clone();
    info!(
        service = %app.config.service.name,
        workers = queue_config.workers,
        backend = ?queue_config.backend,
        "starting flowlink serve"
    );
    if queue_config.backend == QueueBackendKind::Memory {
        warn!("memory queue backend: tasks enqueued by other processes are not visible");
    }

    let shutdown = install_signal_handler();
    WorkerPool::new(app.queue.clone(), &queue_config)
        .run(shutdown)
        .await;

    app.shutdown().await?;
    info!("flowlink serve stopped");
    Ok(())
}
