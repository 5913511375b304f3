// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Electronic document exchange connector.
//!
//! The partner takes SOAP-style envelopes: an action name plus the XML
//! document encoded as base64.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use flowlink_core::{Connector, ExchangeResult, FlowlinkError, PartnerType};
use serde_json::{Value, json};

use crate::payload::str_field;
use crate::settings::ConnectorSettings;
use crate::transport::{DEFAULT_PING_PATH, HttpTransport};

pub const DEFAULT_DOCUMENT: &str = "<Document/>";
pub const DEFAULT_ACTION: &str = "SendDocument";
pub const DEFAULT_XML_PATH: &str = "/api/xml";

/// Builds the envelope sent for a sync payload.
pub fn envelope(payload: &Value) -> Value {
    let document = str_field(payload, "document", DEFAULT_DOCUMENT);
    json!({
        "action": str_field(payload, "action", DEFAULT_ACTION),
        "document": STANDARD.encode(document.as_bytes()),
    })
}

pub struct EdocConnector {
    transport: HttpTransport,
    ping_path: String,
    sync_path: String,
}

impl EdocConnector {
    pub fn new(transport: HttpTransport, settings: &ConnectorSettings) -> Self {
        Self {
            transport,
            ping_path: settings
                .ping_path
                .clone()
                .unwrap_or_else(|| DEFAULT_PING_PATH.to_string()),
            sync_path: settings
                .sync_path
                .clone()
                .unwrap_or_else(|| DEFAULT_XML_PATH.to_string()),
        }
    }
}

#[async_trait]
impl Connector for EdocConnector {
    fn partner_type(&self) -> PartnerType {
        PartnerType::EdocSoap
    }

    async fn ping(&self) -> Result<ExchangeResult, FlowlinkError> {
        self.transport
            .execute("GET", &self.ping_path, &Value::Object(Default::default()))
            .await
    }

    async fn sync(&self, payload: &Value) -> Result<ExchangeResult, FlowlinkError> {
        self.transport
            .execute("POST", &self.sync_path, &envelope(payload))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_encodes_document() {
        let env = envelope(&json!({"document": "<Invoice/>", "action": "Sign"}));
        assert_eq!(env["action"], "Sign");
        assert_eq!(env["document"], "PEludm9pY2UvPg==");
    }

    #[test]
    fn envelope_defaults() {
        let env = envelope(&json!({}));
        assert_eq!(env["action"], DEFAULT_ACTION);
        assert_eq!(env["document"], STANDARD.encode(DEFAULT_DOCUMENT));
    }
}
