// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Endpoint-addressed REST connectors: tax authority, digital signature and
//! public procurement.
//!
//! These partners differ only in their default routes. A sync payload may
//! pick the `endpoint` and `method`; the nested `payload` is what gets sent.

use async_trait::async_trait;
use flowlink_core::{Connector, ExchangeResult, FlowlinkError, PartnerType};
use serde_json::Value;

use crate::payload::{nested, str_field};
use crate::settings::ConnectorSettings;
use crate::transport::{DEFAULT_PING_PATH, HttpTransport};

/// Default routes of one endpoint-addressed partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointDefaults {
    pub ping_path: &'static str,
    pub endpoint: &'static str,
    pub method: &'static str,
}

pub const TAX_DEFAULTS: EndpointDefaults = EndpointDefaults {
    ping_path: DEFAULT_PING_PATH,
    endpoint: "/v1/reports",
    method: "GET",
};

pub const SIGNATURE_DEFAULTS: EndpointDefaults = EndpointDefaults {
    ping_path: "/partner/v1/status",
    endpoint: "/partner/v1/notifications",
    method: "POST",
};

pub const PROCUREMENT_DEFAULTS: EndpointDefaults = EndpointDefaults {
    ping_path: DEFAULT_PING_PATH,
    endpoint: "/tenders",
    method: "GET",
};

pub struct EndpointConnector {
    partner_type: PartnerType,
    transport: HttpTransport,
    ping_path: String,
    defaults: EndpointDefaults,
}

impl EndpointConnector {
    fn new(
        partner_type: PartnerType,
        defaults: EndpointDefaults,
        transport: HttpTransport,
        settings: &ConnectorSettings,
    ) -> Self {
        Self {
            partner_type,
            transport,
            ping_path: settings
                .ping_path
                .clone()
                .unwrap_or_else(|| defaults.ping_path.to_string()),
            defaults,
        }
    }

    pub fn tax(transport: HttpTransport, settings: &ConnectorSettings) -> Self {
        Self::new(PartnerType::TaxRest, TAX_DEFAULTS, transport, settings)
    }

    pub fn signature(transport: HttpTransport, settings: &ConnectorSettings) -> Self {
        Self::new(PartnerType::DigitalSignature, SIGNATURE_DEFAULTS, transport, settings)
    }

    pub fn procurement(transport: HttpTransport, settings: &ConnectorSettings) -> Self {
        Self::new(PartnerType::Procurement, PROCUREMENT_DEFAULTS, transport, settings)
    }
}

#[async_trait]
impl Connector for EndpointConnector {
    fn partner_type(&self) -> PartnerType {
        self.partner_type
    }

    async fn ping(&self) -> Result<ExchangeResult, FlowlinkError> {
        self.transport
            .execute("GET", &self.ping_path, &Value::Object(Default::default()))
            .await
    }

    async fn sync(&self, payload: &Value) -> Result<ExchangeResult, FlowlinkError> {
        let endpoint = str_field(payload, "endpoint", self.defaults.endpoint);
        let method = str_field(payload, "method", self.defaults.method);
        self.transport.execute(method, endpoint, &nested(payload)).await
    }
}
