//! `[gateway]` section: tuning for the offline gateway.

use serde::{Deserialize, Serialize};
use taskpilot_domain::{ConfigIssue, ModelRegistry};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGatewayConfig {
    /// Simulated per-request latency.
    pub latency_ms: u64,
    /// Models that always fail, to exercise fallback chains.
    pub failing_models: Vec<String>,
}

impl FileGatewayConfig {
    pub fn validate(&self, registry: &ModelRegistry) -> Vec<ConfigIssue> {
        self.failing_models
            .iter()
            .filter(|id| registry.model(id).is_none())
            .map(|id| ConfigIssue::unknown_model("gateway.failing_models", id.as_str()))
            .collect()
    }
}
