// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exponential backoff policy for queued syncs.

use std::time::Duration;

use flowlink_config::model::QueueConfig;
use flowlink_core::FlowlinkError;
use rand::Rng;

/// When and how often a failed task is tried again.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
    /// Scale each delay by a random factor in `[0.5, 1.0]`.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&QueueConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &QueueConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.backoff_base_ms),
            multiplier: config.backoff_multiplier,
            max_delay: Duration::from_secs(config.backoff_max_secs),
            jitter: config.jitter,
        }
    }

    /// Whether an attempt that failed with `err` earns another one.
    ///
    /// `attempt` is the 1-based number of the attempt that just failed.
    pub fn should_retry(&self, err: &FlowlinkError, attempt: u32) -> bool {
        err.is_retryable() && attempt < self.max_attempts
    }

    /// Delay before retry number `retry` (1-based), without jitter.
    ///
    /// `min(base * multiplier^(retry - 1), max)`, so the sequence never
    /// decreases.
    pub fn base_delay_for(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
        let max_ms = self.max_delay.as_millis() as f64;
        let raw = self.base_delay.as_millis() as f64 * self.multiplier.powi(exponent);
        let capped = if raw.is_finite() { raw.min(max_ms) } else { max_ms };
        Duration::from_millis(capped.max(0.0) as u64)
    }

    /// Delay before retry number `retry`, jittered when enabled.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let delay = self.base_delay_for(retry);
        if !self.jitter {
            return delay;
        }
        let factor: f64 = rand::thread_rng().gen_range(0.5..=1.0);
        delay.mul_f64(factor)
    }
}
