//! Admission selection and retry backoff.
//!
//! Both are pure functions over task snapshots; the queue owns the state and
//! the timers.

use super::entities::{Task, TaskStatus};
use super::value_objects::TaskId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

fn is_completed(tasks: &HashMap<TaskId, Task>, id: &TaskId) -> bool {
    tasks
        .get(id)
        .is_some_and(|t| t.status == TaskStatus::Completed)
}

/// Pick up to `capacity` runnable tasks in admission order.
///
/// A task is runnable when it is `pending` and every dependency is
/// `completed`. Admission order is priority tier, then creation time, then
/// submission sequence. Lower tiers can starve under a steady stream of
/// higher-priority work.
pub fn select_runnable(tasks: &HashMap<TaskId, Task>, capacity: usize) -> Vec<TaskId> {
    if capacity == 0 {
        return Vec::new();
    }

    let mut runnable: Vec<&Task> = tasks
        .values()
        .filter(|t| t.status == TaskStatus::Pending)
        .filter(|t| t.dependencies_met(|dep| is_completed(tasks, dep)))
        .collect();

    runnable.sort_by_key(|t| (t.priority.rank(), t.created_at, t.sequence));
    runnable
        .into_iter()
        .take(capacity)
        .map(|t| t.id.clone())
        .collect()
}

/// A pending task that can never run: some dependency is failed, cancelled,
/// or unknown to the queue.
pub fn is_blocked(task: &Task, tasks: &HashMap<TaskId, Task>) -> bool {
    task.status == TaskStatus::Pending
        && task.dependencies.iter().any(|dep| match tasks.get(dep) {
            None => true,
            Some(t) => matches!(t.status, TaskStatus::Failed | TaskStatus::Cancelled),
        })
}

/// Exponential backoff between retry attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub base: u32,
    pub unit: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base: 2,
            unit: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Delay before a task with the given (already incremented)
    /// `retry_count` returns to `pending`: `unit * base^retry_count`, capped
    /// at `max_delay`.
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        self.base
            .checked_pow(retry_count)
            .and_then(|factor| self.unit.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::entities::{NewTask, TaskDefaults};
    use crate::task::value_objects::{TaskPriority, TaskType};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn insert(
        tasks: &mut HashMap<TaskId, Task>,
        id: &str,
        priority: TaskPriority,
        created: i64,
        seq: u64,
        deps: &[&str],
    ) {
        let mut spec = NewTask::new(TaskType::DataAnalysis).with_priority(priority);
        for dep in deps {
            spec = spec.with_dependency(*dep);
        }
        let task = Task::create(TaskId::new(id), spec, &TaskDefaults::default(), seq, at(created));
        tasks.insert(task.id.clone(), task);
    }

    fn ids(selected: Vec<TaskId>) -> Vec<String> {
        selected.into_iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn test_priority_then_creation_order() {
        let mut tasks = HashMap::new();
        insert(&mut tasks, "low", TaskPriority::Low, 0, 0, &[]);
        insert(&mut tasks, "normal-late", TaskPriority::Normal, 5, 1, &[]);
        insert(&mut tasks, "normal-early", TaskPriority::Normal, 1, 2, &[]);
        insert(&mut tasks, "critical", TaskPriority::Critical, 9, 3, &[]);

        assert_eq!(
            ids(select_runnable(&tasks, 10)),
            vec!["critical", "normal-early", "normal-late", "low"]
        );
        assert_eq!(ids(select_runnable(&tasks, 2)), vec!["critical", "normal-early"]);
        assert!(select_runnable(&tasks, 0).is_empty());
    }

    #[test]
    fn test_sequence_breaks_ties() {
        let mut tasks = HashMap::new();
        insert(&mut tasks, "second", TaskPriority::High, 0, 2, &[]);
        insert(&mut tasks, "first", TaskPriority::High, 0, 1, &[]);
        assert_eq!(ids(select_runnable(&tasks, 2)), vec!["first", "second"]);
    }

    #[test]
    fn test_dependencies_gate_admission() {
        let mut tasks = HashMap::new();
        insert(&mut tasks, "parent", TaskPriority::Low, 0, 0, &[]);
        insert(&mut tasks, "child", TaskPriority::Critical, 0, 1, &["parent"]);

        assert_eq!(ids(select_runnable(&tasks, 5)), vec!["parent"]);

        let parent = tasks.get_mut(&TaskId::new("parent")).unwrap();
        parent.start(at(1)).unwrap();
        assert!(select_runnable(&tasks, 5).is_empty());

        let parent = tasks.get_mut(&TaskId::new("parent")).unwrap();
        parent.complete(serde_json::Value::Null, at(2)).unwrap();
        assert_eq!(ids(select_runnable(&tasks, 5)), vec!["child"]);
    }

    #[test]
    fn test_blocked_detection() {
        let mut tasks = HashMap::new();
        insert(&mut tasks, "parent", TaskPriority::Normal, 0, 0, &[]);
        insert(&mut tasks, "child", TaskPriority::Normal, 0, 1, &["parent"]);
        insert(&mut tasks, "orphan", TaskPriority::Normal, 0, 2, &["missing"]);

        let child = tasks[&TaskId::new("child")].clone();
        assert!(!is_blocked(&child, &tasks));
        assert!(is_blocked(&tasks[&TaskId::new("orphan")], &tasks));

        tasks.get_mut(&TaskId::new("parent")).unwrap().cancel();
        assert!(is_blocked(&child, &tasks));
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(8));
        assert_eq!(policy.delay_for(6), Duration::from_secs(60));
        assert_eq!(policy.delay_for(200), Duration::from_secs(60));
    }

    #[test]
    fn test_backoff_with_small_unit() {
        let policy = RetryPolicy {
            base: 3,
            unit: Duration::from_millis(10),
            max_delay: Duration::from_millis(500),
        };
        assert_eq!(policy.delay_for(2), Duration::from_millis(90));
        assert_eq!(policy.delay_for(4), Duration::from_millis(500));
    }
}
