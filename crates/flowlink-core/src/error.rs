// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Flowlink integration engine.
//!
//! The variants map one-to-one onto the failure classes the engine
//! distinguishes when deciding whether an exchange may be retried.

use thiserror::Error;

/// The primary error type used across the connector, runner, and queue layers.
#[derive(Debug, Error)]
pub enum FlowlinkError {
    /// Unknown partner type, malformed connection settings, or invalid
    /// service configuration. Never retried.
    #[error("configuration error: {0}")]
    Config(String),

    /// A sync was attempted against a disabled connection.
    #[error("integration connection {connection_id} is disabled")]
    Inactive { connection_id: i64 },

    /// The remote partner could not be reached, answered with an error
    /// status, or returned a response that could not be interpreted.
    #[error("integration error: {message}")]
    Integration {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The local store failed to read or commit. The outcome of the exchange
    /// is unknown to the caller.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A referenced entity (connection, task, sandbox profile) does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FlowlinkError {
    /// Builds an [`FlowlinkError::Integration`] without an underlying source.
    pub fn integration(message: impl Into<String>) -> Self {
        Self::Integration {
            message: message.into(),
            source: None,
        }
    }

    /// Builds a [`FlowlinkError::Storage`] from a plain message.
    pub fn storage(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self::Storage {
            source: message.into(),
        }
    }

    /// Builds a [`FlowlinkError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Only transport/remote faults are worth another attempt. A disabled
    /// connection, bad settings, or a failing store stay that way until a
    /// human intervenes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Integration { .. })
    }

    /// Short machine-readable label for log fields and task records.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Inactive { .. } => "inactive",
            Self::Integration { .. } => "integration",
            Self::Storage { .. } => "storage",
            Self::NotFound { .. } => "not_found",
            Self::Internal(_) => "internal",
        }
    }
}
