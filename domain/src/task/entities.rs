//! Task domain entities

use super::value_objects::{TaskId, TaskPriority, TaskType};
use crate::core::error::DomainError;
use crate::util::duration_ms;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Status of a task.
///
/// Valid transitions:
///
/// ```text
/// pending ──► running ──► completed
///    │           │
///    │           ├──► retrying ──► pending   (retries remaining)
///    │           └──► failed                 (retries exhausted / permanent)
///    └──► cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Waiting for admission
    #[default]
    Pending,
    /// Handler is in flight
    Running,
    /// Failed an attempt; waiting out the backoff delay
    Retrying,
    /// Handler returned a result
    Completed,
    /// Retries exhausted or permanent failure
    Failed,
    /// Cancelled before admission
    Cancelled,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 6] = [
        TaskStatus::Pending,
        TaskStatus::Running,
        TaskStatus::Retrying,
        TaskStatus::Completed,
        TaskStatus::Failed,
        TaskStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Retrying => "retrying",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Running)
                | (TaskStatus::Pending, TaskStatus::Cancelled)
                | (TaskStatus::Running, TaskStatus::Completed)
                | (TaskStatus::Running, TaskStatus::Retrying)
                | (TaskStatus::Running, TaskStatus::Failed)
                | (TaskStatus::Retrying, TaskStatus::Pending)
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Submission request for a new task.
///
/// Optional fields are normalized against [`TaskDefaults`] when the task is
/// created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    #[serde(rename = "type")]
    pub task_type: TaskType,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default = "empty_payload")]
    pub payload: Value,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub max_retries: Option<u32>,
    #[serde(default, rename = "timeout_ms", with = "duration_ms::option")]
    pub timeout: Option<Duration>,
    #[serde(default)]
    pub dependencies: Vec<TaskId>,
}

fn empty_payload() -> Value {
    Value::Object(serde_json::Map::new())
}

impl NewTask {
    pub fn new(task_type: TaskType) -> Self {
        Self {
            task_type,
            priority: TaskPriority::default(),
            payload: empty_payload(),
            owner_id: None,
            max_retries: None,
            timeout: None,
            dependencies: Vec::new(),
        }
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_dependency(mut self, task_id: impl Into<TaskId>) -> Self {
        self.dependencies.push(task_id.into());
        self
    }
}

/// Defaults applied to fields a submission leaves unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskDefaults {
    pub max_retries: u32,
    pub timeout: Duration,
}

impl Default for TaskDefaults {
    fn default() -> Self {
        Self {
            max_retries: 3,
            timeout: Duration::from_secs(300),
        }
    }
}

/// Result of recording a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// The task moved to `retrying`; `retry_count` is the new attempt counter.
    Retry { retry_count: u32 },
    /// The task moved to `failed`.
    Failed,
}

/// A unit of asynchronous work tracked by the task queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub payload: Value,
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub retry_count: u32,
    pub max_retries: u32,
    #[serde(rename = "timeout_ms", with = "duration_ms")]
    pub timeout: Duration,
    pub dependencies: Vec<TaskId>,
    pub progress: u8,
    pub result: Option<Value>,
    pub error: Option<String>,
    /// Submission order, used to break creation-time ties.
    pub sequence: u64,
}

impl Task {
    /// Create a pending task from a submission, applying `defaults` to unset
    /// or zero-valued limits.
    pub fn create(
        id: TaskId,
        spec: NewTask,
        defaults: &TaskDefaults,
        sequence: u64,
        now: DateTime<Utc>,
    ) -> Self {
        let timeout = match spec.timeout {
            Some(timeout) if !timeout.is_zero() => timeout,
            _ => defaults.timeout,
        };

        Self {
            id,
            task_type: spec.task_type,
            priority: spec.priority,
            status: TaskStatus::Pending,
            payload: spec.payload,
            owner_id: spec.owner_id,
            created_at: now,
            started_at: None,
            completed_at: None,
            failed_at: None,
            retry_count: 0,
            max_retries: spec.max_retries.unwrap_or(defaults.max_retries),
            timeout,
            dependencies: spec.dependencies,
            progress: 0,
            result: None,
            error: None,
            sequence,
        }
    }

    fn transition(&mut self, next: TaskStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                task_id: self.id.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Whether every dependency satisfies `is_completed`.
    pub fn dependencies_met(&self, is_completed: impl Fn(&TaskId) -> bool) -> bool {
        self.dependencies.iter().all(is_completed)
    }

    /// `pending → running`
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.transition(TaskStatus::Running)?;
        self.started_at = Some(now);
        self.progress = 0;
        Ok(())
    }

    /// `running → completed`
    pub fn complete(&mut self, result: Value, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.transition(TaskStatus::Completed)?;
        self.completed_at = Some(now);
        self.progress = 100;
        self.result = Some(result);
        self.error = None;
        Ok(())
    }

    /// Record a failed attempt of a running task.
    ///
    /// A retryable failure consumes one retry while `retry_count < max_retries`;
    /// otherwise the task fails terminally. `retry_count` never exceeds
    /// `max_retries`.
    pub fn record_failure(
        &mut self,
        error: impl Into<String>,
        retryable: bool,
        now: DateTime<Utc>,
    ) -> Result<FailureOutcome, DomainError> {
        let next_attempt = self.retry_count.checked_add(1);
        if retryable && let Some(next_attempt) = next_attempt.filter(|n| *n <= self.max_retries) {
            self.transition(TaskStatus::Retrying)?;
            self.retry_count = next_attempt;
            self.error = Some(error.into());
            Ok(FailureOutcome::Retry {
                retry_count: next_attempt,
            })
        } else {
            self.transition(TaskStatus::Failed)?;
            self.failed_at = Some(now);
            self.error = Some(error.into());
            Ok(FailureOutcome::Failed)
        }
    }

    /// `retrying → pending`, once the backoff delay has elapsed.
    pub fn requeue(&mut self) -> Result<(), DomainError> {
        self.transition(TaskStatus::Pending)
    }

    /// `pending → cancelled`. Returns `false` and leaves the task untouched
    /// in any other status.
    pub fn cancel(&mut self) -> bool {
        self.transition(TaskStatus::Cancelled).is_ok()
    }

    /// Update progress of a running task (clamped to 100). Ignored otherwise.
    pub fn set_progress(&mut self, progress: u8) -> bool {
        if self.status != TaskStatus::Running {
            return false;
        }
        self.progress = progress.min(100);
        true
    }

    /// Wall-clock duration of the last attempt of a completed task.
    pub fn duration(&self) -> Option<Duration> {
        let (started, completed) = (self.started_at?, self.completed_at?);
        (completed - started).to_std().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn pending(max_retries: u32) -> Task {
        Task::create(
            TaskId::new("t-1"),
            NewTask::new(TaskType::DataAnalysis).with_max_retries(max_retries),
            &TaskDefaults::default(),
            0,
            at(0),
        )
    }

    #[test]
    fn test_create_applies_defaults() {
        let task = Task::create(
            TaskId::new("t-1"),
            NewTask::new(TaskType::AiAnalysis).with_timeout(Duration::ZERO),
            &TaskDefaults::default(),
            7,
            at(0),
        );
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.max_retries, 3);
        assert_eq!(task.timeout, Duration::from_secs(300));
        assert_eq!(task.sequence, 7);
        assert_eq!(task.progress, 0);
    }

    #[test]
    fn test_create_keeps_explicit_limits() {
        let task = Task::create(
            TaskId::new("t-1"),
            NewTask::new(TaskType::AiAnalysis)
                .with_max_retries(0)
                .with_timeout(Duration::from_secs(5)),
            &TaskDefaults::default(),
            0,
            at(0),
        );
        assert_eq!(task.max_retries, 0);
        assert_eq!(task.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_happy_path() {
        let mut task = pending(3);
        task.start(at(1)).unwrap();
        assert!(task.set_progress(40));
        task.complete(serde_json::json!({"ok": true}), at(4)).unwrap();

        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.progress, 100);
        assert_eq!(task.duration(), Some(Duration::from_secs(3)));
        assert!(task.result.is_some());
    }

    #[test]
    fn test_cannot_complete_without_running() {
        let mut task = pending(3);
        let err = task.complete(Value::Null, at(1)).unwrap_err();
        assert!(err.is_invalid_transition());
        assert_eq!(task.status, TaskStatus::Pending);
    }

    #[test]
    fn test_retry_then_exhaust() {
        let mut task = pending(2);

        for expected in 1..=2 {
            task.start(at(0)).unwrap();
            let outcome = task.record_failure("boom", true, at(1)).unwrap();
            assert_eq!(outcome, FailureOutcome::Retry { retry_count: expected });
            assert_eq!(task.status, TaskStatus::Retrying);
            task.requeue().unwrap();
        }

        task.start(at(2)).unwrap();
        let outcome = task.record_failure("still broken", true, at(3)).unwrap();
        assert_eq!(outcome, FailureOutcome::Failed);
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.retry_count, 2);
        assert_eq!(task.error.as_deref(), Some("still broken"));
        assert_eq!(task.failed_at, Some(at(3)));

        // terminal: never re-enters pending
        assert!(task.requeue().is_err());
        assert!(task.start(at(4)).is_err());
    }

    #[test]
    fn test_permanent_failure_skips_retries() {
        let mut task = pending(3);
        task.start(at(0)).unwrap();
        let outcome = task.record_failure("bad payload", false, at(1)).unwrap();
        assert_eq!(outcome, FailureOutcome::Failed);
        assert_eq!(task.retry_count, 0);
    }

    #[test]
    fn test_zero_retries_fails_immediately() {
        let mut task = pending(0);
        task.start(at(0)).unwrap();
        assert_eq!(
            task.record_failure("boom", true, at(1)).unwrap(),
            FailureOutcome::Failed
        );
    }

    #[test]
    fn test_cancel_only_pending() {
        let mut task = pending(3);
        task.start(at(0)).unwrap();
        assert!(!task.cancel());
        assert_eq!(task.status, TaskStatus::Running);

        let mut task = pending(3);
        assert!(task.cancel());
        assert_eq!(task.status, TaskStatus::Cancelled);
        assert!(!task.cancel());
    }

    #[test]
    fn test_progress_ignored_unless_running() {
        let mut task = pending(3);
        assert!(!task.set_progress(50));
        task.start(at(0)).unwrap();
        assert!(task.set_progress(250));
        assert_eq!(task.progress, 100);
    }

    #[test]
    fn test_transition_table() {
        use TaskStatus::*;
        for from in TaskStatus::ALL {
            for to in TaskStatus::ALL {
                let allowed = matches!(
                    (from, to),
                    (Pending, Running)
                        | (Pending, Cancelled)
                        | (Running, Completed)
                        | (Running, Retrying)
                        | (Running, Failed)
                        | (Retrying, Pending)
                );
                assert_eq!(from.can_transition_to(to), allowed, "{from} -> {to}");
            }
        }
        assert!(Completed.is_terminal() && Failed.is_terminal() && Cancelled.is_terminal());
        assert!(!Retrying.is_terminal());
    }

    #[test]
    fn test_new_task_deserialize() {
        let spec: NewTask = serde_json::from_str(
            r#"{"type": "ai_analysis", "priority": "high", "payload": {"prompt": "hi"}, "timeout_ms": 2000}"#,
        )
        .unwrap();
        assert_eq!(spec.task_type, TaskType::AiAnalysis);
        assert_eq!(spec.priority, TaskPriority::High);
        assert_eq!(spec.timeout, Some(Duration::from_secs(2)));
        assert!(spec.max_retries.is_none());
        assert!(spec.dependencies.is_empty());
    }

    #[test]
    fn test_retry_budget_at_u32_max() {
        let mut task = pending(u32::MAX);
        task.retry_count = u32::MAX - 1;

        task.start(at(1)).unwrap();
        assert_eq!(
            task.record_failure("flaky", true, at(2)).unwrap(),
            FailureOutcome::Retry {
                retry_count: u32::MAX
            }
        );

        task.requeue().unwrap();
        task.start(at(3)).unwrap();
        assert_eq!(
            task.record_failure("flaky", true, at(4)).unwrap(),
            FailureOutcome::Failed
        );
        assert_eq!(task.retry_count, u32::MAX);
        assert_eq!(task.status, TaskStatus::Failed);
    }
}
