// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP connectors for the partner systems Flowlink exchanges data with.
//!
//! Every variant shares one [`HttpTransport`]: dry-run echoes, JSON-first
//! response parsing, and the rule that an HTTP error status always surfaces
//! as [`flowlink_core::FlowlinkError::Integration`].

pub mod accounting;
pub mod edoc;
pub mod factory;
mod payload;
pub mod rest;
pub mod settings;
pub mod signing;
pub mod transport;
pub mod webhook;

pub use factory::{PartnerConnectorFactory, parse_partner_type};
pub use settings::ConnectorSettings;
pub use transport::{HttpTransport, PreparedRequest};
pub use webhook::WebhookConnector;
