//! Port for recording task snapshots and agent executions.
//!
//! Persistence is best effort: a failed write is logged by the lifecycle
//! dispatcher and never changes task status.

use async_trait::async_trait;
use taskpilot_domain::{AgentExecutionRecord, Task};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[async_trait]
pub trait TaskPersister: Send + Sync {
    /// Upsert the latest snapshot of a task.
    async fn persist_task(&self, task: &Task) -> Result<(), PersistError>;

    async fn persist_agent_execution(
        &self,
        record: &AgentExecutionRecord,
    ) -> Result<(), PersistError>;
}

/// No-op implementation for tests and when persistence is disabled.
pub struct NoPersistence;

#[async_trait]
impl TaskPersister for NoPersistence {
    async fn persist_task(&self, _task: &Task) -> Result<(), PersistError> {
        Ok(())
    }

    async fn persist_agent_execution(
        &self,
        _record: &AgentExecutionRecord,
    ) -> Result<(), PersistError> {
        Ok(())
    }
}
