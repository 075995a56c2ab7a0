//! Task handler port
//!
//! One handler per [`TaskType`]. The queue builds a [`TaskContext`] for each
//! attempt and maps the returned [`HandlerError`] onto the retry policy.

use super::queue_event::EventSink;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use taskpilot_domain::{TaskId, TaskType};
use thiserror::Error;

/// Whether a failure is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// May succeed on a later attempt (outage, timeout)
    Transient,
    /// Will fail again with the same input (validation, bad payload)
    Permanent,
}

/// Failure returned by a task handler
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct HandlerError {
    pub kind: FailureKind,
    pub message: String,
}

impl HandlerError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transient,
            message: message.into(),
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Permanent,
            message: message.into(),
        }
    }

    pub fn timed_out(timeout: Duration) -> Self {
        Self::transient(format!("task timed out after {}ms", timeout.as_millis()))
    }

    pub fn is_retryable(&self) -> bool {
        self.kind == FailureKind::Transient
    }
}

/// Callback through which a handler reports progress (0-100).
#[derive(Clone)]
pub struct ProgressSink(Arc<dyn Fn(u8) + Send + Sync>);

impl ProgressSink {
    pub fn new(report: impl Fn(u8) + Send + Sync + 'static) -> Self {
        Self(Arc::new(report))
    }

    /// A sink that ignores every report.
    pub fn ignore() -> Self {
        Self::new(|_| {})
    }

    pub fn report(&self, progress: u8) {
        (self.0)(progress)
    }
}

impl fmt::Debug for ProgressSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProgressSink")
    }
}

/// Everything a handler gets for one attempt.
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub task_id: TaskId,
    pub task_type: TaskType,
    pub owner_id: Option<String>,
    pub payload: Value,
    /// 1 for the first attempt, incremented per retry.
    pub attempt: u32,
    pub progress: ProgressSink,
    pub events: EventSink,
}

#[async_trait]
pub trait TaskHandler: Send + Sync {
    fn task_type(&self) -> TaskType;

    async fn handle(&self, ctx: TaskContext) -> Result<Value, HandlerError>;
}
