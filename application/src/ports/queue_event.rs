//! Events emitted by the task queue for the lifecycle dispatcher
//!
//! State transitions happen under the queue lock; the side effects they imply
//! (persistence, notifications) are published here and performed in order by
//! [`LifecycleDispatcher`](crate::use_cases::lifecycle::LifecycleDispatcher).

use taskpilot_domain::{AgentExecutionRecord, Task, TaskId, TaskStatus};
use tokio::sync::mpsc;

/// Side-effect request produced by the queue or a task handler
#[derive(Debug, Clone)]
pub enum QueueEvent {
    /// A task changed status (snapshot after the transition)
    TaskChanged(Box<Task>),
    /// A running task reported progress
    Progress {
        task_id: TaskId,
        owner_id: Option<String>,
        status: TaskStatus,
        progress: u8,
    },
    /// An approved agent finished (successfully or not)
    AgentExecuted {
        owner_id: Option<String>,
        record: Box<AgentExecutionRecord>,
    },
}

/// Sending half of the queue event channel.
///
/// Publishing never blocks and never fails; events published after the
/// dispatcher has stopped are dropped.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<QueueEvent>,
}

impl EventSink {
    /// Create a sink and the receiver the dispatcher consumes.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<QueueEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// A sink whose events go nowhere.
    pub fn discard() -> Self {
        let (sink, _rx) = Self::channel();
        sink
    }

    pub fn publish(&self, event: QueueEvent) {
        let _ = self.tx.send(event);
    }
}
