//! Lifecycle dispatcher: performs the side effects of queue events.
//!
//! Consumes [`QueueEvent`]s in order and forwards them to the persister and
//! notifier ports. Both are best effort: failures are logged and dropped.

use crate::ports::notifier::TaskNotifier;
use crate::ports::persister::TaskPersister;
use crate::ports::queue_event::QueueEvent;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub struct LifecycleDispatcher {
    persister: Arc<dyn TaskPersister>,
    notifier: Arc<dyn TaskNotifier>,
}

impl LifecycleDispatcher {
    pub fn new(persister: Arc<dyn TaskPersister>, notifier: Arc<dyn TaskNotifier>) -> Self {
        Self {
            persister,
            notifier,
        }
    }

    /// Drain `events` until every sender is dropped.
    pub async fn run(self, mut events: mpsc::UnboundedReceiver<QueueEvent>) {
        while let Some(event) = events.recv().await {
            self.dispatch(event).await;
        }
        debug!("Lifecycle dispatcher stopped");
    }

    pub fn spawn(self, events: mpsc::UnboundedReceiver<QueueEvent>) -> JoinHandle<()> {
        tokio::spawn(self.run(events))
    }

    pub async fn dispatch(&self, event: QueueEvent) {
        match event {
            QueueEvent::TaskChanged(task) => {
                if let Err(e) = self.persister.persist_task(&task).await {
                    warn!("Failed to persist task {}: {}", task.id, e);
                }
                if let Some(owner) = &task.owner_id
                    && let Err(e) = self
                        .notifier
                        .notify_task_update(owner, &task.id, task.status, Some(task.progress))
                        .await
                {
                    warn!("Failed to notify {} about task {}: {}", owner, task.id, e);
                }
            }
            QueueEvent::Progress {
                task_id,
                owner_id,
                status,
                progress,
            } => {
                if let Some(owner) = &owner_id
                    && let Err(e) = self
                        .notifier
                        .notify_task_update(owner, &task_id, status, Some(progress))
                        .await
                {
                    warn!("Failed to notify {} about task {}: {}", owner, task_id, e);
                }
            }
            QueueEvent::AgentExecuted { owner_id, record } => {
                if let Err(e) = self.persister.persist_agent_execution(&record).await {
                    warn!("Failed to persist agent execution {}: {}", record.id, e);
                }
                if record.success
                    && let Some(owner) = &owner_id
                    && let Err(e) = self
                        .notifier
                        .notify_agent_completion(
                            owner,
                            &record.agent_id,
                            record.response.as_deref().unwrap_or_default(),
                        )
                        .await
                {
                    warn!("Failed to notify {} about {}: {}", owner, record.agent_id, e);
                }
            }
        }
    }
}
