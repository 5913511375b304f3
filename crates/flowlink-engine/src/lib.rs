// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exchange execution for the Flowlink integration engine.
//!
//! - [`ExchangeRunner`] performs one connector call and records its outcome
//!   (log entry plus connection status) in a single store transaction.
//! - [`ConnectionService`] manages connections and validates their settings.
//! - [`summary`] builds and truncates the per-exchange log summary.

pub mod connections;
pub mod runner;
pub mod summary;

pub use connections::ConnectionService;
pub use runner::{ExchangeOutcome, ExchangeRunner};
pub use summary::ExchangeAction;
