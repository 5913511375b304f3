// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde cannot express: non-empty paths,
//! positive worker counts, a sane retry policy.

use crate::diagnostic::ConfigError;
use crate::model::FlowlinkConfig;

/// Smallest log budget that still fits a meaningful summary.
const MIN_LOG_PAYLOAD_BUDGET: usize = 64;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
///
/// Collects every violation instead of failing on the first one.
pub fn validate_config(config: &FlowlinkConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut invalid = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.service.log_level.as_str()) {
        invalid(format!(
            "service.log_level `{}` must be one of {}",
            config.service.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        invalid("storage.database_path must not be empty".to_string());
    }

    if !(config.http.default_timeout_secs > 0.0) {
        invalid(format!(
            "http.default_timeout_secs must be positive, got {}",
            config.http.default_timeout_secs
        ));
    }

    if config.exchange.log_payload_budget < MIN_LOG_PAYLOAD_BUDGET {
        invalid(format!(
            "exchange.log_payload_budget must be at least {MIN_LOG_PAYLOAD_BUDGET}, got {}",
            config.exchange.log_payload_budget
        ));
    }

    let queue = &config.queue;
    if queue.workers == 0 {
        invalid("queue.workers must be at least 1".to_string());
    }
    if queue.max_attempts == 0 {
        invalid("queue.max_attempts must be at least 1".to_string());
    }
    if queue.poll_interval_ms == 0 {
        invalid("queue.poll_interval_ms must be at least 1".to_string());
    }
    if queue.lease_secs == 0 {
        invalid("queue.lease_secs must be at least 1".to_string());
    }
    if !(queue.backoff_multiplier >= 1.0) {
        invalid(format!(
            "queue.backoff_multiplier must be >= 1.0, got {}",
            queue.backoff_multiplier
        ));
    }
    if queue.backoff_max_secs.saturating_mul(1000) < queue.backoff_base_ms {
        invalid(format!(
            "queue.backoff_max_secs ({}s) must not be below queue.backoff_base_ms ({}ms)",
            queue.backoff_max_secs, queue.backoff_base_ms
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&FlowlinkConfig::default()).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = FlowlinkConfig::default();
        config.storage.database_path = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "database_path"));
    }

    #[test]
    fn zero_workers_and_attempts_are_both_reported() {
        let mut config = FlowlinkConfig::default();
        config.queue.workers = 0;
        config.queue.max_attempts = 0;
        config.queue.lease_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "queue.workers"));
        assert!(has_error(&errors, "queue.max_attempts"));
        assert!(has_error(&errors, "queue.lease_secs"));
    }

    #[test]
    fn shrinking_multiplier_is_rejected() {
        let mut config = FlowlinkConfig::default();
        config.queue.backoff_multiplier = 0.5;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "backoff_multiplier"));
    }

    #[test]
    fn tiny_log_budget_is_rejected() {
        let mut config = FlowlinkConfig::default();
        config.exchange.log_payload_budget = 10;
        assert!(has_error(
            &validate_config(&config).unwrap_err(),
            "log_payload_budget"
        ));
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let mut config = FlowlinkConfig::default();
        config.service.log_level = "loud".to_string();
        assert!(has_error(&validate_config(&config).unwrap_err(), "log_level"));
    }
}
