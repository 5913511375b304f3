// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Flowlink integration engine.
//!
//! This crate provides the error taxonomy, the domain types (connections,
//! exchange logs, task records, API result shapes) and the trait seams that
//! the connector, storage, runner and queue crates plug into.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::FlowlinkError;
pub use types::{
    Connection, ConnectionUpdate, Direction, ExchangeContext, ExchangeLog, ExchangeResult,
    ExchangeStatus, IntegrationActionResult, IntegrationSandboxExchange, IntegrationTaskStatus,
    NewConnection, NewExchangeLog, PartnerType, Principal, TaskRecord, TaskState,
};

pub use traits::{Connector, ConnectorFactory, IntegrationStore, TaskBackend};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_trait_seams_are_exported() {
        fn _assert_connector<T: Connector>() {}
        fn _assert_factory<T: ConnectorFactory>() {}
        fn _assert_store<T: IntegrationStore>() {}
        fn _assert_backend<T: TaskBackend>() {}
    }

    #[test]
    fn partner_type_has_six_variants() {
        use std::str::FromStr;

        assert_eq!(PartnerType::ALL.len(), 6);
        for variant in PartnerType::ALL {
            let parsed = PartnerType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }
}
