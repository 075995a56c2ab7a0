//! In-memory persister, used when no JSONL file is configured and in tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use taskpilot_application::ports::persister::{PersistError, TaskPersister};
use taskpilot_domain::{AgentExecutionRecord, Task, TaskId};

/// Keeps the latest snapshot of every task and all agent executions.
#[derive(Default)]
pub struct InMemoryTaskStore {
    tasks: Mutex<HashMap<TaskId, Task>>,
    executions: Mutex<Vec<AgentExecutionRecord>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task(&self, id: &TaskId) -> Option<Task> {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn executions(&self) -> Vec<AgentExecutionRecord> {
        self.executions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl TaskPersister for InMemoryTaskStore {
    async fn persist_task(&self, task: &Task) -> Result<(), PersistError> {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(task.id.clone(), task.clone());
        Ok(())
    }

    async fn persist_agent_execution(
        &self,
        record: &AgentExecutionRecord,
    ) -> Result<(), PersistError> {
        self.executions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use taskpilot_domain::{NewTask, TaskDefaults, TaskStatus, TaskType};

    #[tokio::test]
    async fn test_upserts_latest_snapshot() {
        let store = InMemoryTaskStore::new();
        let mut task = Task::create(
            TaskId::new("t-1"),
            NewTask::new(TaskType::DataAnalysis),
            &TaskDefaults::default(),
            0,
            Utc::now(),
        );
        store.persist_task(&task).await.unwrap();
        task.start(Utc::now()).unwrap();
        store.persist_task(&task).await.unwrap();

        assert_eq!(store.task_count(), 1);
        assert_eq!(store.task(&task.id).unwrap().status, TaskStatus::Running);
        assert!(store.executions().is_empty());
    }
}
