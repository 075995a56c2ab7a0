//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Conversion into application config happens through the `to_*` methods,
//! which also report semantic problems as [`ConfigIssue`]s.

mod gateway;
mod output;
mod queue;
mod router;

pub use gateway::FileGatewayConfig;
pub use output::{FileLoggingConfig, FilePersistenceConfig};
pub use queue::FileQueueConfig;
pub use router::FileRouterConfig;

use serde::{Deserialize, Serialize};
use taskpilot_application::AppConfig;
use taskpilot_domain::{ConfigIssue, ModelRegistry};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub queue: FileQueueConfig,
    pub router: FileRouterConfig,
    pub gateway: FileGatewayConfig,
    pub persistence: FilePersistenceConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self, registry: &ModelRegistry) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.queue.to_queue_config().1);
        issues.extend(self.router.to_router_config(registry).1);
        issues.extend(self.gateway.validate(registry));
        issues.extend(self.logging.parse_level().1);
        issues
    }

    /// Application config with invalid values replaced by defaults.
    pub fn to_app_config(&self, registry: &ModelRegistry) -> AppConfig {
        AppConfig {
            queue: self.queue.to_queue_config().0,
            router: self.router.to_router_config(registry).0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_file() {
        let toml_str = r#"
[queue]
concurrency_limit = 2
default_max_retries = 1
backoff_unit_ms = 250

[router]
analysis_model = "claude-3-5-sonnet"
max_chain_length = 2

[router.fallbacks]
"claude-3-5-sonnet" = ["gemini-1.5-pro"]

[gateway]
latency_ms = 15
failing_models = ["gpt-4o"]

[persistence]
jsonl = "tasks.jsonl"

[logging]
level = "debug"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let registry = ModelRegistry::default();
        assert!(config.validate(&registry).is_empty());

        let app = config.to_app_config(&registry);
        assert_eq!(app.queue.concurrency_limit, 2);
        assert_eq!(app.queue.default_max_retries, 1);
        assert_eq!(app.queue.retry.unit.as_millis(), 250);
        assert_eq!(app.router.analysis_model, "claude-3-5-sonnet");
        assert_eq!(
            app.router.overrides_for("claude-3-5-sonnet"),
            Some(&["gemini-1.5-pro".to_string()][..])
        );
        assert_eq!(config.gateway.latency_ms, 15);
        assert_eq!(
            config.persistence.jsonl.as_deref(),
            Some(std::path::Path::new("tasks.jsonl"))
        );
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: FileConfig = toml::from_str("[queue]\nconcurrency_limit = 9\n").unwrap();
        assert_eq!(config.queue.concurrency_limit, 9);
        assert_eq!(config.queue.default_timeout_secs, 300);
        assert_eq!(config.router, FileRouterConfig::default());
    }

    #[test]
    fn test_validate_collects_all_sections() {
        let config = FileConfig {
            queue: FileQueueConfig {
                concurrency_limit: 0,
                ..Default::default()
            },
            gateway: FileGatewayConfig {
                failing_models: vec!["gpt-7".into()],
                ..Default::default()
            },
            logging: FileLoggingConfig {
                level: Some("chatty".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(config.validate(&ModelRegistry::default()).len(), 3);
    }
}
