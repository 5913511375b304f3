// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot CLI commands.
//!
//! Each command returns the JSON document printed on stdout, so the same
//! functions back both the binary and its tests.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::{Value, json};
use tracing::warn;

use flowlink_config::model::QueueBackendKind;
use flowlink_connectors::parse_partner_type;
use flowlink_connectors::signing::SIGNATURE_HEADER;
use flowlink_core::{ConnectionUpdate, ExchangeContext, FlowlinkError, NewConnection};
use flowlink_queue::{MemoryTaskBackend, TaskQueue};

use crate::app::App;

fn to_json<T: Serialize>(value: &T) -> Result<Value, FlowlinkError> {
    serde_json::to_value(value).map_err(|e| FlowlinkError::Internal(format!("serialize output: {e}")))
}

/// Parses a JSON command-line argument. A missing argument is `{}`.
pub fn parse_json_arg(flag: &str, raw: Option<&str>) -> Result<Value, FlowlinkError> {
    match raw {
        None => Ok(json!({})),
        Some(text) => serde_json::from_str(text)
            .map_err(|e| FlowlinkError::Config(format!("invalid JSON for --{flag}: {e}"))),
    }
}

pub async fn list_connections(app: &App) -> Result<Value, FlowlinkError> {
    to_json(&app.connections.list().await?)
}

pub async fn show_connection(app: &App, id: i64) -> Result<Value, FlowlinkError> {
    to_json(&app.connections.get(id).await?)
}

pub struct CreateArgs<'a> {
    pub name: &'a str,
    pub partner_type: &'a str,
    pub description: Option<&'a str>,
    pub settings: Option<&'a str>,
    pub disabled: bool,
}

pub async fn create_connection(app: &App, args: CreateArgs<'_>) -> Result<Value, FlowlinkError> {
    let new = NewConnection {
        name: args.name.to_string(),
        description: args.description.unwrap_or_default().to_string(),
        partner_type: parse_partner_type(args.partner_type)?,
        settings: parse_json_arg("settings", args.settings)?,
        is_active: !args.disabled,
    };
    to_json(&app.connections.create(new).await?)
}

pub async fn update_connection(
    app: &App,
    id: i64,
    name: Option<&str>,
    description: Option<&str>,
    settings: Option<&str>,
) -> Result<Value, FlowlinkError> {
    let update = ConnectionUpdate {
        name: name.map(str::to_string),
        description: description.map(str::to_string),
        settings: settings
            .map(|raw| parse_json_arg("settings", Some(raw)))
            .transpose()?,
        is_active: None,
    };
    to_json(&app.connections.update(id, update).await?)
}

pub async fn set_active(app: &App, id: i64, active: bool) -> Result<Value, FlowlinkError> {
    to_json(&app.connections.set_active(id, active).await?)
}

pub async fn delete_connection(app: &App, id: i64) -> Result<Value, FlowlinkError> {
    app.connections.delete(id).await?;
    Ok(json!({ "deleted": id }))
}

pub async fn ping(app: &App, id: i64) -> Result<Value, FlowlinkError> {
    let outcome = app.connections.ping(id, ExchangeContext::Cli).await?;
    to_json(&outcome.ping_result())
}

pub async fn sync(app: &App, id: i64, payload: Option<&str>) -> Result<Value, FlowlinkError> {
    let payload = parse_json_arg("payload", payload)?;
    let outcome = app
        .connections
        .sync(id, &payload, ExchangeContext::Cli)
        .await?;
    to_json(&outcome.sync_result())
}

/// Enqueues a sync. A process-local backend has no worker to drain it, so
/// the task runs inline there.
pub async fn enqueue(
    app: &App,
    id: i64,
    payload: Option<&str>,
    wait: Option<Duration>,
) -> Result<Value, FlowlinkError> {
    let payload = parse_json_arg("payload", payload)?;
    app.connections.get(id).await?;

    let queue = if app.config.queue.backend == QueueBackendKind::Memory && !app.queue.is_eager() {
        warn!("memory queue backend has no workers outside `serve`; running task inline");
        let mut eager = app.config.queue.clone();
        eager.eager = true;
        TaskQueue::new(
            Arc::new(MemoryTaskBackend::new()),
            app.connections.runner().clone(),
            &eager,
        )
    } else {
        app.queue.clone()
    };

    let mut status = queue.enqueue_sync(id, &payload).await?;
    if let Some(timeout) = wait
        && !status.state.is_terminal()
    {
        status = queue.wait(&status.task_id, timeout).await?;
    }
    to_json(&status)
}

pub async fn task_status(app: &App, task_id: &str) -> Result<Value, FlowlinkError> {
    to_json(&app.queue.get_task_status(task_id).await?)
}

pub async fn cancel_task(app: &App, task_id: &str) -> Result<Value, FlowlinkError> {
    to_json(&app.queue.cancel(task_id).await?)
}

pub async fn logs(app: &App, id: i64, limit: Option<i64>) -> Result<Value, FlowlinkError> {
    to_json(&app.connections.logs(id, limit).await?)
}

pub fn sandbox_list() -> Result<Value, FlowlinkError> {
    to_json(&flowlink_sandbox::list_profiles())
}

pub fn sandbox_simulate(slug: &str, payload: Option<&str>) -> Result<Value, FlowlinkError> {
    let payload = parse_json_arg("payload", payload)?;
    to_json(&flowlink_sandbox::simulate(slug, &payload)?)
}

/// Shows what a webhook connection with `settings` would send for `payload`,
/// signature included, without sending anything.
pub fn webhook_preview(
    app: &App,
    settings: Option<&str>,
    payload: Option<&str>,
) -> Result<Value, FlowlinkError> {
    let settings = parse_json_arg("settings", settings)?;
    let payload = parse_json_arg("payload", payload)?;
    let request = app.factory.webhook(&settings)?.preview(&payload)?;

    let body = request
        .body
        .as_deref()
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned());
    let mut headers = serde_json::Map::new();
    headers.insert("Content-Type".into(), json!("application/json"));
    if let Some(signature) = &request.signature {
        headers.insert(SIGNATURE_HEADER.into(), json!(signature));
    }
    Ok(json!({
        "method": request.method.as_str(),
        "path": request.path,
        "url": request.url.map(|u| u.to_string()),
        "body": body,
        "signature": request.signature,
        "headers": headers,
    }))
}
