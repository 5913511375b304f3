// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Flowlink integration tests.
//!
//! Provides test doubles for fast, deterministic, CI-runnable tests without
//! partner systems or a database.
//!
//! # Components
//!
//! - [`MemoryStore`] - In-memory connection and exchange log store
//! - [`ScriptedConnectorFactory`] - Connectors that replay scripted outcomes

pub mod mock_connector;
pub mod mock_store;

pub use mock_connector::{ConnectorCall, ScriptedConnectorFactory, Step};
pub use mock_store::MemoryStore;
