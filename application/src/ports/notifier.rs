//! Port for pushing task updates to the task owner.
//!
//! Delivery is fire-and-forget: the lifecycle dispatcher logs a failed
//! notification and moves on; it never affects task state.

use async_trait::async_trait;
use taskpilot_domain::{TaskId, TaskStatus};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Notification channel closed")]
    Closed,
}

/// Port for user-facing notifications.
#[async_trait]
pub trait TaskNotifier: Send + Sync {
    async fn notify_task_update(
        &self,
        owner_id: &str,
        task_id: &TaskId,
        status: TaskStatus,
        progress: Option<u8>,
    ) -> Result<(), NotifyError>;

    async fn notify_agent_completion(
        &self,
        owner_id: &str,
        agent_id: &str,
        response: &str,
    ) -> Result<(), NotifyError>;
}

/// No-op implementation for tests and headless runs.
pub struct NoNotifier;

#[async_trait]
impl TaskNotifier for NoNotifier {
    async fn notify_task_update(
        &self,
        _owner_id: &str,
        _task_id: &TaskId,
        _status: TaskStatus,
        _progress: Option<u8>,
    ) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn notify_agent_completion(
        &self,
        _owner_id: &str,
        _agent_id: &str,
        _response: &str,
    ) -> Result<(), NotifyError> {
        Ok(())
    }
}
