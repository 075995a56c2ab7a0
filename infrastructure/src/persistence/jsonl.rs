//! JSONL file writer for task snapshots and agent executions.
//!
//! Each record is one JSON line with a `type` field (`task` or
//! `agent_execution`), a `timestamp`, and the serialized entity under
//! `data`. The file is append-only; the latest `task` line for an id is
//! its current state.

use async_trait::async_trait;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use taskpilot_application::ports::persister::{PersistError, TaskPersister};
use taskpilot_domain::{AgentExecutionRecord, Task};
use tracing::debug;

/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes after every record and
/// on `Drop`.
pub struct JsonlTaskPersister {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlTaskPersister {
    /// Open `path` for appending, creating it and its parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                PersistError::Io(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| PersistError::Io(format!("cannot open {}: {}", path.display(), e)))?;

        debug!("Persisting tasks to {}", path.display());
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append<T: Serialize>(&self, record_type: &str, data: &T) -> Result<(), PersistError> {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let record = serde_json::json!({
            "type": record_type,
            "timestamp": timestamp,
            "data": data,
        });
        let line = serde_json::to_string(&record)
            .map_err(|e| PersistError::Serialization(e.to_string()))?;

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{}", line).map_err(|e| PersistError::Io(e.to_string()))?;
        writer.flush().map_err(|e| PersistError::Io(e.to_string()))
    }
}

#[async_trait]
impl TaskPersister for JsonlTaskPersister {
    async fn persist_task(&self, task: &Task) -> Result<(), PersistError> {
        self.append("task", task)
    }

    async fn persist_agent_execution(
        &self,
        record: &AgentExecutionRecord,
    ) -> Result<(), PersistError> {
        self.append("agent_execution", record)
    }
}

impl Drop for JsonlTaskPersister {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}
