// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Flowlink integration engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Flowlink configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FlowlinkConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Outbound HTTP defaults shared by all connectors.
    #[serde(default)]
    pub http: HttpConfig,

    /// Exchange logging settings.
    #[serde(default)]
    pub exchange: ExchangeConfig,

    /// Task queue, worker pool and retry policy.
    #[serde(default)]
    pub queue: QueueConfig,
}

/// Service identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name used in logs.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "flowlink".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("flowlink").join("flowlink.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("flowlink.db"))
        .to_string_lossy()
        .to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Outbound HTTP defaults. Per-connection settings may override the timeout.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// Request timeout applied when a connection does not set its own.
    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: f64,

    /// User-Agent header sent to partners.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_secs() -> f64 {
    10.0
}

fn default_user_agent() -> String {
    concat!("flowlink/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Exchange log configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExchangeConfig {
    /// Maximum number of bytes of serialized summary stored per log entry.
    #[serde(default = "default_log_payload_budget")]
    pub log_payload_budget: usize,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            log_payload_budget: default_log_payload_budget(),
        }
    }
}

fn default_log_payload_budget() -> usize {
    2000
}

/// Which task backend holds queued tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueBackendKind {
    /// Tasks live in process memory and vanish on restart.
    Memory,
    /// Tasks live in the `tasks` table of the SQLite database.
    Sqlite,
}

/// Task queue and retry policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    /// Run enqueued jobs inline and return their terminal status.
    #[serde(default)]
    pub eager: bool,

    /// Backend holding task records.
    #[serde(default = "default_backend")]
    pub backend: QueueBackendKind,

    /// Number of concurrent workers in `serve` mode.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// How long an idle worker waits before polling again.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Total attempts per task, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Growth factor applied per retry.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Upper bound on a single retry delay.
    #[serde(default = "default_backoff_max_secs")]
    pub backoff_max_secs: u64,

    /// Randomize each delay within [50%, 100%] of its computed value.
    #[serde(default)]
    pub jitter: bool,

    /// How long a claimed task stays locked to its worker. A `running` task
    /// whose lease ran out (the worker died) is claimed again.
    #[serde(default = "default_lease_secs")]
    pub lease_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            eager: false,
            backend: default_backend(),
            workers: default_workers(),
            poll_interval_ms: default_poll_interval_ms(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            backoff_max_secs: default_backoff_max_secs(),
            jitter: false,
            lease_secs: default_lease_secs(),
        }
    }
}

impl QueueConfig {
    /// Idle poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Task lease as a [`Duration`].
    pub fn lease(&self) -> Duration {
        Duration::from_secs(self.lease_secs)
    }
}

fn default_backend() -> QueueBackendKind {
    QueueBackendKind::Sqlite
}

fn default_workers() -> usize {
    4
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_backoff_max_secs() -> u64 {
    600
}

fn default_lease_secs() -> u64 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_defaults_match_retry_contract() {
        let queue = QueueConfig::default();
        assert_eq!(queue.max_attempts, 5);
        assert_eq!(queue.backoff_max_secs, 600);
        assert!(!queue.jitter);
        assert!(!queue.eager);
        assert_eq!(queue.backend, QueueBackendKind::Sqlite);
    }

    #[test]
    fn exchange_budget_defaults_to_2000_bytes() {
        assert_eq!(ExchangeConfig::default().log_payload_budget, 2000);
    }

    #[test]
    fn backend_kind_parses_lowercase() {
        let queue: QueueConfig = toml::from_str("backend = \"memory\"").unwrap();
        assert_eq!(queue.backend, QueueBackendKind::Memory);
    }
}
