//! `[persistence]` and `[logging]` sections.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use taskpilot_domain::{ConfigIssue, Severity};

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePersistenceConfig {
    /// Append task snapshots and agent executions to this JSONL file.
    pub jsonl: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Daily-rolling log file; the date is appended to the file name.
    pub file: Option<PathBuf>,
    /// Default level when neither `-v` nor `RUST_LOG` is given.
    pub level: Option<String>,
}

impl FileLoggingConfig {
    /// Configured level, if it is one of the known levels.
    pub fn parse_level(&self) -> (Option<String>, Vec<ConfigIssue>) {
        match &self.level {
            None => (None, Vec::new()),
            Some(level) if LOG_LEVELS.contains(&level.to_lowercase().as_str()) => {
                (Some(level.to_lowercase()), Vec::new())
            }
            Some(level) => (
                None,
                vec![ConfigIssue::invalid_value(
                    Severity::Warning,
                    "logging.level",
                    level,
                    format!(
                        "logging.level: unknown value '{}', expected one of {}",
                        level,
                        LOG_LEVELS.join(", ")
                    ),
                )],
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        let config = FileLoggingConfig {
            level: Some("DEBUG".into()),
            ..Default::default()
        };
        assert_eq!(config.parse_level(), (Some("debug".into()), vec![]));

        let config = FileLoggingConfig {
            level: Some("loud".into()),
            ..Default::default()
        };
        let (level, issues) = config.parse_level();
        assert!(level.is_none());
        assert_eq!(issues.len(), 1);
    }
}
