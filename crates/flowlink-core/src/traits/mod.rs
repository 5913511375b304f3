// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams of the integration engine.
//!
//! All async traits use `#[async_trait]` so implementations can live behind
//! `Arc<dyn ...>` and be swapped for in-memory doubles in tests.

pub mod connector;
pub mod store;
pub mod tasks;

pub use connector::{Connector, ConnectorFactory};
pub use store::IntegrationStore;
pub use tasks::TaskBackend;
