//! Fan-out notifier: delegates to multiple notifiers.
//!
//! ```text
//! LifecycleDispatcher ──► FanoutNotifier ──┬──► TracingNotifier
//!                                          └──► ProgressReporter (CLI)
//! ```

use async_trait::async_trait;
use std::sync::Arc;
use taskpilot_application::ports::notifier::{NotifyError, TaskNotifier};
use taskpilot_domain::{TaskId, TaskStatus};

/// Every delegate is called even if an earlier one fails; the first error
/// is returned.
pub struct FanoutNotifier {
    delegates: Vec<Arc<dyn TaskNotifier>>,
}

impl FanoutNotifier {
    pub fn new(delegates: Vec<Arc<dyn TaskNotifier>>) -> Self {
        Self { delegates }
    }
}

#[async_trait]
impl TaskNotifier for FanoutNotifier {
    async fn notify_task_update(
        &self,
        owner_id: &str,
        task_id: &TaskId,
        status: TaskStatus,
        progress: Option<u8>,
    ) -> Result<(), NotifyError> {
        let mut first_error = None;
        for d in &self.delegates {
            if let Err(e) = d.notify_task_update(owner_id, task_id, status, progress).await {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    async fn notify_agent_completion(
        &self,
        owner_id: &str,
        agent_id: &str,
        response: &str,
    ) -> Result<(), NotifyError> {
        let mut first_error = None;
        for d in &self.delegates {
            if let Err(e) = d.notify_agent_completion(owner_id, agent_id, response).await {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
