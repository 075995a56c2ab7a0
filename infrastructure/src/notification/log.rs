//! Notifier that writes notifications to the tracing log.

use async_trait::async_trait;
use taskpilot_application::ports::notifier::{NotifyError, TaskNotifier};
use taskpilot_domain::util::truncate_str;
use taskpilot_domain::{TaskId, TaskStatus};
use tracing::info;

/// Logs every notification at `info` under the `taskpilot::notify` target.
pub struct TracingNotifier;

#[async_trait]
impl TaskNotifier for TracingNotifier {
    async fn notify_task_update(
        &self,
        owner_id: &str,
        task_id: &TaskId,
        status: TaskStatus,
        progress: Option<u8>,
    ) -> Result<(), NotifyError> {
        match progress {
            Some(p) => info!(target: "taskpilot::notify", "[{}] task {} {} ({}%)", owner_id, task_id, status, p),
            None => info!(target: "taskpilot::notify", "[{}] task {} {}", owner_id, task_id, status),
        }
        Ok(())
    }

    async fn notify_agent_completion(
        &self,
        owner_id: &str,
        agent_id: &str,
        response: &str,
    ) -> Result<(), NotifyError> {
        info!(
            target: "taskpilot::notify",
            "[{}] {} finished: {}",
            owner_id,
            agent_id,
            truncate_str(response, 120)
        );
        Ok(())
    }
}
