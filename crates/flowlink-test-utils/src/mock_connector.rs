// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted connector factory for deterministic exchange tests.
//!
//! Every connector built by a [`ScriptedConnectorFactory`] shares one FIFO
//! script of outcomes and one call journal, so a test can queue failures
//! and then inspect exactly when and with what each attempt ran.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tokio::time::Instant;

use flowlink_core::{Connector, ConnectorFactory, ExchangeResult, FlowlinkError, PartnerType};

/// One scripted connector outcome.
#[derive(Debug, Clone)]
pub enum Step {
    /// Remote answered with this status and body.
    Respond(u16, Value),
    /// Remote failed with an integration error carrying this message.
    Fail(String),
    /// A non-retryable configuration fault raised during the call.
    Misconfigured(String),
}

/// A recorded connector invocation.
#[derive(Debug, Clone)]
pub struct ConnectorCall {
    /// `"ping"` or `"sync"`.
    pub operation: &'static str,
    pub partner_type: PartnerType,
    pub payload: Value,
    pub at: Instant,
}

#[derive(Default)]
struct Shared {
    script: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<ConnectorCall>>,
    builds: AtomicUsize,
}

/// Factory whose connectors replay a shared script.
///
/// When the script runs dry every call succeeds with `200 {"ok": true}`.
#[derive(Clone, Default)]
pub struct ScriptedConnectorFactory {
    shared: Arc<Shared>,
}

impl ScriptedConnectorFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a factory pre-loaded with the given steps.
    pub fn with_steps(steps: Vec<Step>) -> Self {
        Self {
            shared: Arc::new(Shared {
                script: Mutex::new(steps.into()),
                ..Default::default()
            }),
        }
    }

    /// Append a step to the end of the script.
    pub async fn push(&self, step: Step) {
        self.shared.script.lock().await.push_back(step);
    }

    /// Every call made so far, in order.
    pub async fn calls(&self) -> Vec<ConnectorCall> {
        self.shared.calls.lock().await.clone()
    }

    /// How many connectors were built.
    pub fn builds(&self) -> usize {
        self.shared.builds.load(Ordering::SeqCst)
    }
}

impl ConnectorFactory for ScriptedConnectorFactory {
    fn build(
        &self,
        partner_type: PartnerType,
        settings: &Value,
    ) -> Result<Box<dyn Connector>, FlowlinkError> {
        if !settings.is_object() {
            return Err(FlowlinkError::Config(
                "connection settings must be a JSON object".into(),
            ));
        }
        self.shared.builds.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedConnector {
            partner_type,
            shared: Arc::clone(&self.shared),
        }))
    }
}

struct ScriptedConnector {
    partner_type: PartnerType,
    shared: Arc<Shared>,
}

impl ScriptedConnector {
    async fn play(
        &self,
        operation: &'static str,
        payload: &Value,
    ) -> Result<ExchangeResult, FlowlinkError> {
        self.shared.calls.lock().await.push(ConnectorCall {
            operation,
            partner_type: self.partner_type,
            payload: payload.clone(),
            at: Instant::now(),
        });
        let step = self.shared.script.lock().await.pop_front();
        match step.unwrap_or_else(|| Step::Respond(200, json!({"ok": true}))) {
            Step::Respond(status_code, body) => Ok(ExchangeResult {
                status_code,
                body,
                request_payload: payload.clone(),
            }),
            Step::Fail(message) => Err(FlowlinkError::integration(message)),
            Step::Misconfigured(message) => Err(FlowlinkError::Config(message)),
        }
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    fn partner_type(&self) -> PartnerType {
        self.partner_type
    }

    async fn ping(&self) -> Result<ExchangeResult, FlowlinkError> {
        self.play("ping", &json!({})).await
    }

    async fn sync(&self, payload: &Value) -> Result<ExchangeResult, FlowlinkError> {
        self.play("sync", payload).await
    }
}
