//! Domain error types

use crate::task::entities::TaskStatus;
use crate::task::value_objects::TaskId;
use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid transition for task {task_id}: {from} -> {to}")]
    InvalidTransition {
        task_id: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },

    #[error("Unknown task type: {0}")]
    UnknownTaskType(String),

    #[error("Unknown task priority: {0}")]
    UnknownPriority(String),

    #[error("Unknown risk level: {0}")]
    UnknownRiskLevel(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
}

impl DomainError {
    /// Check if this error is a rejected state-machine transition
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, DomainError::InvalidTransition { .. })
    }
}
