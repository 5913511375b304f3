// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Partner type to connector mapping.

use std::str::FromStr;
use std::time::Duration;

use flowlink_config::model::HttpConfig;
use flowlink_core::{Connector, ConnectorFactory, FlowlinkError, PartnerType};
use serde_json::Value;
use tracing::debug;

use crate::accounting::AccountingConnector;
use crate::edoc::EdocConnector;
use crate::rest::EndpointConnector;
use crate::settings::ConnectorSettings;
use crate::transport::HttpTransport;
use crate::webhook::WebhookConnector;

/// Parses a partner type name, reporting unknown names as configuration errors.
pub fn parse_partner_type(name: &str) -> Result<PartnerType, FlowlinkError> {
    PartnerType::from_str(name).map_err(|_| {
        let known: Vec<String> = PartnerType::ALL.iter().map(ToString::to_string).collect();
        FlowlinkError::Config(format!(
            "unsupported partner type `{name}` (expected one of: {})",
            known.join(", ")
        ))
    })
}

/// Builds real HTTP connectors sharing one pooled client.
#[derive(Debug, Clone)]
pub struct PartnerConnectorFactory {
    client: reqwest::Client,
    default_timeout: Duration,
}

impl PartnerConnectorFactory {
    pub fn new(config: &HttpConfig) -> Result<Self, FlowlinkError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FlowlinkError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            default_timeout: Duration::from_secs_f64(config.default_timeout_secs),
        })
    }

    /// Builds the webhook variant directly, for request previews.
    pub fn webhook(&self, settings: &Value) -> Result<WebhookConnector, FlowlinkError> {
        let settings = ConnectorSettings::parse(settings)?;
        Ok(WebhookConnector::new(self.transport(&settings), &settings))
    }

    fn transport(&self, settings: &ConnectorSettings) -> HttpTransport {
        HttpTransport::new(self.client.clone(), settings, self.default_timeout)
    }
}

impl ConnectorFactory for PartnerConnectorFactory {
    fn build(
        &self,
        partner_type: PartnerType,
        settings: &Value,
    ) -> Result<Box<dyn Connector>, FlowlinkError> {
        let settings = ConnectorSettings::parse(settings)?;
        let transport = self.transport(&settings);
        debug!(%partner_type, dry_run = settings.dry_run, "building connector");

        let connector: Box<dyn Connector> = match partner_type {
            PartnerType::AccountingOdata => {
                Box::new(AccountingConnector::new(transport, &settings))
            }
            PartnerType::EdocSoap => Box::new(EdocConnector::new(transport, &settings)),
            PartnerType::TaxRest => Box::new(EndpointConnector::tax(transport, &settings)),
            PartnerType::DigitalSignature => {
                Box::new(EndpointConnector::signature(transport, &settings))
            }
            PartnerType::Procurement => {
                Box::new(EndpointConnector::procurement(transport, &settings))
            }
            PartnerType::GenericWebhook => Box::new(WebhookConnector::new(transport, &settings)),
        };
        Ok(connector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn factory() -> PartnerConnectorFactory {
        PartnerConnectorFactory::new(&HttpConfig::default()).unwrap()
    }

    #[test]
    fn builds_every_partner_type() {
        let f = factory();
        for partner_type in PartnerType::ALL {
            let connector = f.build(partner_type, &json!({})).unwrap();
            assert_eq!(connector.partner_type(), partner_type);
        }
    }

    #[test]
    fn malformed_settings_are_config_errors() {
        let err = factory()
            .build(PartnerType::TaxRest, &json!({"timeout": -1}))
            .err()
            .unwrap();
        assert!(matches!(err, FlowlinkError::Config(_)));
        assert!(!err.is_retryable());
        assert!(factory().validate(PartnerType::TaxRest, &json!("nope")).is_err());
    }

    #[test]
    fn unknown_partner_name_is_config_error() {
        let err = parse_partner_type("fax-gateway").unwrap_err();
        assert!(matches!(err, FlowlinkError::Config(ref m) if m.contains("generic-webhook")));
        assert_eq!(parse_partner_type("e-doc-soap").unwrap(), PartnerType::EdocSoap);
    }
}
