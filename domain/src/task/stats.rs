//! Queue statistics and health classification.

use super::entities::{Task, TaskStatus};
use super::scheduling::is_blocked;
use super::value_objects::TaskId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Overall health of the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueHealth {
    Healthy,
    Degraded,
    Critical,
}

impl QueueHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueHealth::Healthy => "healthy",
            QueueHealth::Degraded => "degraded",
            QueueHealth::Critical => "critical",
        }
    }
}

impl std::fmt::Display for QueueHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of queue counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueStats {
    pub total: usize,
    pub pending: usize,
    pub running: usize,
    pub retrying: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// Pending tasks whose dependencies can never complete.
    pub blocked: usize,
    /// Mean duration of completed tasks, in milliseconds.
    pub average_duration_ms: f64,
    /// `completed / (completed + failed)`, or 1.0 when nothing has finished.
    pub success_rate: f64,
    pub health: QueueHealth,
    pub concurrency_limit: usize,
}

impl QueueStats {
    pub fn compute(tasks: &HashMap<TaskId, Task>, concurrency_limit: usize) -> Self {
        let count = |status: TaskStatus| tasks.values().filter(|t| t.status == status).count();

        let pending = count(TaskStatus::Pending);
        let running = count(TaskStatus::Running);
        let retrying = count(TaskStatus::Retrying);
        let completed = count(TaskStatus::Completed);
        let failed = count(TaskStatus::Failed);
        let cancelled = count(TaskStatus::Cancelled);
        let blocked = tasks.values().filter(|t| is_blocked(t, tasks)).count();

        let durations: Vec<f64> = tasks
            .values()
            .filter(|t| t.status == TaskStatus::Completed)
            .filter_map(Task::duration)
            .map(|d| d.as_secs_f64() * 1000.0)
            .collect();
        let average_duration_ms = if durations.is_empty() {
            0.0
        } else {
            durations.iter().sum::<f64>() / durations.len() as f64
        };

        let processed = completed + failed;
        let success_rate = if processed == 0 {
            1.0
        } else {
            completed as f64 / processed as f64
        };

        Self {
            total: tasks.len(),
            pending,
            running,
            retrying,
            completed,
            failed,
            cancelled,
            blocked,
            average_duration_ms,
            success_rate,
            health: classify(success_rate, running, concurrency_limit),
            concurrency_limit,
        }
    }
}

fn classify(success_rate: f64, running: usize, concurrency_limit: usize) -> QueueHealth {
    if success_rate < 0.5 || running >= concurrency_limit {
        QueueHealth::Critical
    } else if success_rate < 0.8 {
        QueueHealth::Degraded
    } else {
        QueueHealth::Healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::entities::{NewTask, TaskDefaults};
    use crate::task::value_objects::TaskType;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn task(id: &str) -> Task {
        Task::create(
            TaskId::new(id),
            NewTask::new(TaskType::ReportGeneration).with_max_retries(0),
            &TaskDefaults::default(),
            0,
            at(0),
        )
    }

    fn finished(id: &str, ok: bool, secs: i64) -> Task {
        let mut t = task(id);
        t.start(at(0)).unwrap();
        if ok {
            t.complete(serde_json::Value::Null, at(secs)).unwrap();
        } else {
            t.record_failure("boom", true, at(secs)).unwrap();
        }
        t
    }

    fn map(tasks: Vec<Task>) -> HashMap<TaskId, Task> {
        tasks.into_iter().map(|t| (t.id.clone(), t)).collect()
    }

    #[test]
    fn test_empty_queue_is_healthy() {
        let stats = QueueStats::compute(&HashMap::new(), 5);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.success_rate, 1.0);
        assert_eq!(stats.average_duration_ms, 0.0);
        assert_eq!(stats.health, QueueHealth::Healthy);
    }

    #[test]
    fn test_counts_and_average() {
        let stats = QueueStats::compute(
            &map(vec![
                finished("a", true, 2),
                finished("b", true, 4),
                finished("c", false, 1),
                task("d"),
            ]),
            5,
        );
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.average_duration_ms, 3000.0);
        assert!((stats.success_rate - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.health, QueueHealth::Degraded);
    }

    #[test]
    fn test_low_success_rate_is_critical() {
        let stats = QueueStats::compute(
            &map(vec![finished("a", true, 1), finished("b", false, 1), finished("c", false, 1)]),
            5,
        );
        assert_eq!(stats.health, QueueHealth::Critical);
    }

    #[test]
    fn test_saturation_is_critical() {
        let mut running = task("a");
        running.start(at(0)).unwrap();
        let stats = QueueStats::compute(&map(vec![running]), 1);
        assert_eq!(stats.running, 1);
        assert_eq!(stats.health, QueueHealth::Critical);
    }

    #[test]
    fn test_blocked_tasks_are_reported() {
        let orphan = Task::create(
            TaskId::new("orphan"),
            NewTask::new(TaskType::DataAnalysis).with_dependency("gone"),
            &TaskDefaults::default(),
            0,
            at(0),
        );
        let stats = QueueStats::compute(&map(vec![orphan]), 5);
        assert_eq!(stats.blocked, 1);
        assert_eq!(stats.pending, 1);
    }
}
