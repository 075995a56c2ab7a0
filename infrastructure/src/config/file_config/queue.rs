//! `[queue]` section.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use taskpilot_application::QueueConfig;
use taskpilot_domain::{ConfigIssue, RetryPolicy, Severity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileQueueConfig {
    pub concurrency_limit: usize,
    pub tick_interval_ms: u64,
    pub default_max_retries: u32,
    pub default_timeout_secs: u64,
    pub backoff_base: u32,
    pub backoff_unit_ms: u64,
    pub max_backoff_ms: u64,
    pub enforce_timeouts: bool,
    pub shutdown_grace_secs: u64,
}

impl Default for FileQueueConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: 5,
            tick_interval_ms: 1000,
            default_max_retries: 3,
            default_timeout_secs: 300,
            backoff_base: 2,
            backoff_unit_ms: 1000,
            max_backoff_ms: 60_000,
            enforce_timeouts: true,
            shutdown_grace_secs: 10,
        }
    }
}

impl FileQueueConfig {
    /// Convert to [`QueueConfig`], replacing out-of-range values with
    /// defaults and reporting each replacement.
    pub fn to_queue_config(&self) -> (QueueConfig, Vec<ConfigIssue>) {
        let defaults = Self::default();
        let mut issues = Vec::new();

        let mut positive = |field: &str, value: u64, fallback: u64| -> u64 {
            if value == 0 {
                issues.push(ConfigIssue::invalid_value(
                    Severity::Error,
                    format!("queue.{}", field),
                    value,
                    format!("queue.{} must be greater than 0, using {}", field, fallback),
                ));
                fallback
            } else {
                value
            }
        };

        let concurrency_limit = positive(
            "concurrency_limit",
            self.concurrency_limit as u64,
            defaults.concurrency_limit as u64,
        ) as usize;
        let tick_interval_ms = positive(
            "tick_interval_ms",
            self.tick_interval_ms,
            defaults.tick_interval_ms,
        );
        let default_timeout_secs = positive(
            "default_timeout_secs",
            self.default_timeout_secs,
            defaults.default_timeout_secs,
        );
        let backoff_unit_ms = positive("backoff_unit_ms", self.backoff_unit_ms, defaults.backoff_unit_ms);
        let max_backoff_ms = positive("max_backoff_ms", self.max_backoff_ms, defaults.max_backoff_ms);

        let backoff_base = if self.backoff_base < 1 {
            issues.push(ConfigIssue::invalid_value(
                Severity::Error,
                "queue.backoff_base",
                self.backoff_base,
                format!("queue.backoff_base must be at least 1, using {}", defaults.backoff_base),
            ));
            defaults.backoff_base
        } else {
            self.backoff_base
        };

        if max_backoff_ms < backoff_unit_ms {
            issues.push(ConfigIssue::invalid_value(
                Severity::Warning,
                "queue.max_backoff_ms",
                max_backoff_ms,
                "queue.max_backoff_ms is below queue.backoff_unit_ms; every retry waits max_backoff_ms",
            ));
        }

        let config = QueueConfig {
            concurrency_limit,
            tick_interval: Duration::from_millis(tick_interval_ms),
            default_max_retries: self.default_max_retries,
            default_timeout: Duration::from_secs(default_timeout_secs),
            retry: RetryPolicy {
                base: backoff_base,
                unit: Duration::from_millis(backoff_unit_ms),
                max_delay: Duration::from_millis(max_backoff_ms),
            },
            enforce_timeouts: self.enforce_timeouts,
            shutdown_grace: Duration::from_secs(self.shutdown_grace_secs),
        };
        (config, issues)
    }
}
