// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generic webhook dispatcher.

use async_trait::async_trait;
use flowlink_core::{Connector, ExchangeResult, FlowlinkError, PartnerType};
use serde_json::{Value, json};

use crate::payload::str_field;
use crate::settings::ConnectorSettings;
use crate::transport::{HttpTransport, PreparedRequest};

/// Body of the `ping` handshake.
pub fn handshake() -> Value {
    json!({
        "event": "handshake",
        "timestamp": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
    })
}

pub struct WebhookConnector {
    transport: HttpTransport,
    path: String,
}

impl WebhookConnector {
    pub fn new(transport: HttpTransport, settings: &ConnectorSettings) -> Self {
        let path = settings
            .sync_path
            .clone()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| "/".to_string());
        Self { transport, path }
    }

    /// Method and body a sync payload resolves to. The nested `payload` is
    /// delivered when present, otherwise the whole payload is.
    fn outgoing(payload: &Value) -> (&str, &Value) {
        let method = str_field(payload, "method", "POST");
        let body = payload.get("payload").unwrap_or(payload);
        (method, body)
    }

    /// Resolves what `sync` would send, including its signature.
    pub fn preview(&self, payload: &Value) -> Result<PreparedRequest, FlowlinkError> {
        let (method, body) = Self::outgoing(payload);
        self.transport.prepare(method, &self.path, body)
    }
}

#[async_trait]
impl Connector for WebhookConnector {
    fn partner_type(&self) -> PartnerType {
        PartnerType::GenericWebhook
    }

    async fn ping(&self) -> Result<ExchangeResult, FlowlinkError> {
        self.transport.execute("POST", &self.path, &handshake()).await
    }

    async fn sync(&self, payload: &Value) -> Result<ExchangeResult, FlowlinkError> {
        let (method, body) = Self::outgoing(payload);
        self.transport.execute(method, &self.path, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn connector(settings: Value) -> WebhookConnector {
        let settings = ConnectorSettings::parse(&settings).unwrap();
        let transport =
            HttpTransport::new(reqwest::Client::new(), &settings, Duration::from_secs(5));
        WebhookConnector::new(transport, &settings)
    }

    #[tokio::test]
    async fn sync_sends_nested_payload_when_present() {
        let c = connector(json!({}));
        let result = c
            .sync(&json!({"method": "put", "payload": {"invoice": 42}}))
            .await
            .unwrap();
        assert_eq!(result.body["method"], "PUT");
        assert_eq!(result.body["path"], "/");
        assert_eq!(result.request_payload, json!({"invoice": 42}));
    }

    #[tokio::test]
    async fn sync_sends_whole_payload_otherwise() {
        let c = connector(json!({"sync_path": "/hooks/in"}));
        let result = c.sync(&json!({"event": "paid"})).await.unwrap();
        assert_eq!(result.body["path"], "/hooks/in");
        assert_eq!(result.request_payload, json!({"event": "paid"}));
    }

    #[tokio::test]
    async fn ping_posts_handshake() {
        let result = connector(json!({})).ping().await.unwrap();
        assert_eq!(result.body["method"], "POST");
        assert_eq!(result.request_payload["event"], "handshake");
        assert!(result.request_payload["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn preview_includes_signature() {
        let c = connector(json!({
            "base_url": "https://hooks.example",
            "signing_secret": "s3cret",
        }));
        let preview = c.preview(&json!({"payload": {"id": 1}})).unwrap();
        assert_eq!(preview.url.unwrap().as_str(), "https://hooks.example/");
        assert_eq!(preview.body.as_deref(), Some(br#"{"id":1}"#.as_slice()));
        assert!(preview.signature.unwrap().starts_with("sha256="));
    }
}
