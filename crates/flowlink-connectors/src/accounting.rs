// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OData accounting gateway connector.
//!
//! A sync payload names an `operation` that is routed to an OData entity
//! set. Filters and documents travel in the nested `payload` field.

use std::collections::BTreeMap;

use async_trait::async_trait;
use flowlink_core::{Connector, ExchangeResult, FlowlinkError, PartnerType};
use serde_json::Value;

use crate::payload::{nested, str_field};
use crate::settings::ConnectorSettings;
use crate::transport::{DEFAULT_PING_PATH, DEFAULT_SYNC_PATH, HttpTransport};

/// Operation used when the payload names none.
pub const DEFAULT_OPERATION: &str = "catalogs";

/// Built-in operation routes, replaced wholesale by the `routes` setting.
pub fn default_routes() -> BTreeMap<String, String> {
    [
        ("catalogs", "/odata/standard.odata/Catalog_Products"),
        ("documents", "/odata/standard.odata/Document_SalesOrder"),
        ("accounts", "/odata/standard.odata/Document_Invoice"),
    ]
    .into_iter()
    .map(|(op, path)| (op.to_string(), path.to_string()))
    .collect()
}

pub struct AccountingConnector {
    transport: HttpTransport,
    routes: BTreeMap<String, String>,
    ping_path: String,
    sync_path: String,
}

impl AccountingConnector {
    pub fn new(transport: HttpTransport, settings: &ConnectorSettings) -> Self {
        Self {
            transport,
            routes: settings.routes.clone().unwrap_or_else(default_routes),
            ping_path: settings
                .ping_path
                .clone()
                .unwrap_or_else(|| DEFAULT_PING_PATH.to_string()),
            sync_path: settings
                .sync_path
                .clone()
                .unwrap_or_else(|| DEFAULT_SYNC_PATH.to_string()),
        }
    }

    /// Path an operation is sent to. Unknown operations use `sync_path`.
    pub fn route(&self, operation: &str) -> &str {
        self.routes
            .get(operation)
            .map(String::as_str)
            .unwrap_or(&self.sync_path)
    }
}

#[async_trait]
impl Connector for AccountingConnector {
    fn partner_type(&self) -> PartnerType {
        PartnerType::AccountingOdata
    }

    async fn ping(&self) -> Result<ExchangeResult, FlowlinkError> {
        self.transport
            .execute("GET", &self.ping_path, &Value::Object(Default::default()))
            .await
    }

    async fn sync(&self, payload: &Value) -> Result<ExchangeResult, FlowlinkError> {
        let operation = str_field(payload, "operation", DEFAULT_OPERATION);
        // Catalog reads are queries; everything else creates documents.
        let default_method = if operation == DEFAULT_OPERATION { "GET" } else { "POST" };
        let method = str_field(payload, "method", default_method);
        self.transport
            .execute(method, self.route(operation), &nested(payload))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn connector(settings: Value) -> AccountingConnector {
        let settings = ConnectorSettings::parse(&settings).unwrap();
        let transport =
            HttpTransport::new(reqwest::Client::new(), &settings, Duration::from_secs(5));
        AccountingConnector::new(transport, &settings)
    }

    #[tokio::test]
    async fn catalogs_default_to_get() {
        let result = connector(json!({}))
            .sync(&json!({"payload": {"$top": 10}}))
            .await
            .unwrap();
        assert_eq!(result.body["method"], "GET");
        assert_eq!(result.body["path"], "/odata/standard.odata/Catalog_Products");
        assert_eq!(result.body["payload"], json!({"$top": 10}));
    }

    #[tokio::test]
    async fn documents_default_to_post() {
        let result = connector(json!({}))
            .sync(&json!({"operation": "documents", "payload": {"Number": "SO-1"}}))
            .await
            .unwrap();
        assert_eq!(result.body["method"], "POST");
        assert_eq!(result.body["path"], "/odata/standard.odata/Document_SalesOrder");
    }

    #[test]
    fn unknown_operation_uses_sync_path() {
        let c = connector(json!({"sync_path": "/custom"}));
        assert_eq!(c.route("ledger"), "/custom");
        assert_eq!(connector(json!({})).route("ledger"), DEFAULT_SYNC_PATH);
    }

    #[test]
    fn routes_setting_replaces_defaults() {
        let c = connector(json!({"routes": {"stock": "/odata/Stock"}}));
        assert_eq!(c.route("stock"), "/odata/Stock");
        assert_eq!(c.route("catalogs"), DEFAULT_SYNC_PATH);
    }
}
