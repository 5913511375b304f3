// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connector capability and the factory that selects one per partner type.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::FlowlinkError;
use crate::types::{ExchangeResult, PartnerType};

/// Knows how to speak one partner's protocol.
///
/// Implementations only decide routing and encoding. Transport, dry-run and
/// error-status handling are shared so every partner honours the same
/// contract: an error status is never reported as success.
#[async_trait]
pub trait Connector: Send + Sync {
    /// The partner type this connector was built for.
    fn partner_type(&self) -> PartnerType;

    /// Reachability check with no side effect on the partner.
    async fn ping(&self) -> Result<ExchangeResult, FlowlinkError>;

    /// Perform one synchronization exchange.
    async fn sync(&self, payload: &Value) -> Result<ExchangeResult, FlowlinkError>;
}

/// Maps a partner type plus its settings to a ready connector.
pub trait ConnectorFactory: Send + Sync {
    /// Builds a connector. Fails with [`FlowlinkError::Config`] for settings
    /// the partner cannot work with.
    fn build(
        &self,
        partner_type: PartnerType,
        settings: &Value,
    ) -> Result<Box<dyn Connector>, FlowlinkError>;

    /// Checks settings without building anything. Used when a connection is
    /// created or its settings change.
    fn validate(&self, partner_type: PartnerType, settings: &Value) -> Result<(), FlowlinkError> {
        self.build(partner_type, settings).map(|_| ())
    }
}
