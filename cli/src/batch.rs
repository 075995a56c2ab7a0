//! Task batch files for `taskpilot run`.
//!
//! A batch is a JSON array of task specs. Entries may carry a file-local
//! `key`; later entries reference it in `depends_on` and the reference is
//! rewritten to the id the queue assigns.

use anyhow::{Result, bail};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use taskpilot_application::TaskQueue;
use taskpilot_domain::{NewTask, TaskId};

#[derive(Debug, Deserialize)]
pub struct BatchEntry {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(flatten)]
    pub task: NewTask,
}

pub fn parse_batch(json: &str) -> Result<Vec<BatchEntry>> {
    let entries: Vec<BatchEntry> = serde_json::from_str(json)?;
    check_keys(&entries)?;
    Ok(entries)
}

/// Keys must be unique and `depends_on` may only name earlier entries.
fn check_keys(entries: &[BatchEntry]) -> Result<()> {
    let mut seen = HashSet::new();
    for (index, entry) in entries.iter().enumerate() {
        for dep in &entry.depends_on {
            if !seen.contains(dep.as_str()) {
                bail!(
                    "task #{}: depends_on '{}' does not name an earlier task",
                    index + 1,
                    dep
                );
            }
        }
        if let Some(key) = &entry.key
            && !seen.insert(key.as_str())
        {
            bail!("task #{}: duplicate key '{}'", index + 1, key);
        }
    }
    Ok(())
}

/// Submit entries in file order, returning the assigned ids in the same order.
pub fn submit_batch(
    queue: &TaskQueue,
    entries: Vec<BatchEntry>,
    default_owner: Option<&str>,
) -> Vec<TaskId> {
    let mut ids_by_key: HashMap<String, TaskId> = HashMap::new();
    let mut ids = Vec::with_capacity(entries.len());

    for entry in entries {
        let mut spec = entry.task;
        spec.dependencies.extend(
            entry
                .depends_on
                .iter()
                .filter_map(|key| ids_by_key.get(key).cloned()),
        );
        if spec.owner_id.is_none()
            && let Some(owner) = default_owner
        {
            spec.owner_id = Some(owner.to_string());
        }

        let id = queue.add_task(spec);
        if let Some(key) = entry.key {
            ids_by_key.insert(key, id.clone());
        }
        ids.push(id);
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskpilot_application::{EventSink, QueueConfig};
    use taskpilot_domain::{TaskPriority, TaskType};

    const BATCH: &str = r#"[
        {"key": "fetch", "type": "ai_analysis", "priority": "high",
         "payload": {"content": "quarterly numbers"}},
        {"key": "report", "type": "report_generation", "depends_on": ["fetch"],
         "owner_id": "bob", "timeout_ms": 5000}
    ]"#;

    #[test]
    fn test_parse_batch() {
        let entries = parse_batch(BATCH).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].task.task_type, TaskType::AiAnalysis);
        assert_eq!(entries[0].task.priority, TaskPriority::High);
        assert_eq!(entries[1].depends_on, vec!["fetch"]);
        assert_eq!(
            entries[1].task.timeout,
            Some(std::time::Duration::from_millis(5000))
        );
    }

    #[test]
    fn test_forward_and_duplicate_keys_rejected() {
        let forward = r#"[
            {"type": "data_analysis", "depends_on": ["later"]},
            {"key": "later", "type": "data_analysis"}
        ]"#;
        let err = parse_batch(forward).unwrap_err();
        assert!(err.to_string().contains("does not name an earlier task"));

        let duplicate = r#"[
            {"key": "a", "type": "data_analysis"},
            {"key": "a", "type": "data_analysis"}
        ]"#;
        let err = parse_batch(duplicate).unwrap_err();
        assert!(err.to_string().contains("duplicate key 'a'"));
    }

    #[tokio::test]
    async fn test_submit_rewrites_keys_to_ids() {
        let queue = TaskQueue::builder(QueueConfig::default()).build(EventSink::discard());
        let ids = submit_batch(&queue, parse_batch(BATCH).unwrap(), Some("alice"));

        let fetch = queue.get_task(&ids[0]).unwrap();
        let report = queue.get_task(&ids[1]).unwrap();
        assert_eq!(fetch.owner_id.as_deref(), Some("alice"));
        assert_eq!(report.owner_id.as_deref(), Some("bob"));
        assert_eq!(report.dependencies, vec![ids[0].clone()]);
    }
}
