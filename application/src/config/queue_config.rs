//! Task queue parameters.

use std::time::Duration;
use taskpilot_domain::{RetryPolicy, TaskDefaults};

/// Scheduler and executor settings for [`TaskQueue`](crate::use_cases::task_queue::TaskQueue).
#[derive(Debug, Clone, PartialEq)]
pub struct QueueConfig {
    /// Maximum number of handlers in flight at once.
    pub concurrency_limit: usize,
    /// Safety-net interval between scheduling passes when no wakeup arrives.
    pub tick_interval: Duration,
    /// Applied when a submission leaves `max_retries` unset.
    pub default_max_retries: u32,
    /// Applied when a submission leaves `timeout` unset or zero.
    pub default_timeout: Duration,
    pub retry: RetryPolicy,
    /// Wrap each handler invocation in the task timeout.
    pub enforce_timeouts: bool,
    /// How long `shutdown` waits for in-flight handlers.
    pub shutdown_grace: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: 5,
            tick_interval: Duration::from_secs(1),
            default_max_retries: 3,
            default_timeout: Duration::from_secs(300),
            retry: RetryPolicy::default(),
            enforce_timeouts: true,
            shutdown_grace: Duration::from_secs(10),
        }
    }
}

impl QueueConfig {
    pub fn task_defaults(&self) -> TaskDefaults {
        TaskDefaults {
            max_retries: self.default_max_retries,
            timeout: self.default_timeout,
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit.max(1);
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn with_default_max_retries(mut self, retries: u32) -> Self {
        self.default_max_retries = retries;
        self
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_enforce_timeouts(mut self, enforce: bool) -> Self {
        self.enforce_timeouts = enforce;
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }
}
