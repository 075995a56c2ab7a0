//! `[router]` section.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use taskpilot_application::RouterConfig;
use taskpilot_domain::{ConfigIssue, DEFAULT_MAX_CHAIN_LENGTH, ModelRegistry, Severity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRouterConfig {
    pub analysis_model: String,
    pub max_chain_length: usize,
    /// `requested model -> ordered substitutes`
    pub fallbacks: HashMap<String, Vec<String>>,
}

impl Default for FileRouterConfig {
    fn default() -> Self {
        Self {
            analysis_model: "gpt-4o".to_string(),
            max_chain_length: DEFAULT_MAX_CHAIN_LENGTH,
            fallbacks: HashMap::new(),
        }
    }
}

impl FileRouterConfig {
    /// Convert to [`RouterConfig`], checking model ids against `registry`.
    /// Unknown ids are dropped (or replaced by the default analysis model).
    pub fn to_router_config(&self, registry: &ModelRegistry) -> (RouterConfig, Vec<ConfigIssue>) {
        let defaults = RouterConfig::default();
        let mut issues = Vec::new();

        let analysis_model = if registry.model(&self.analysis_model).is_some() {
            self.analysis_model.clone()
        } else {
            issues.push(ConfigIssue::unknown_model(
                "router.analysis_model",
                &self.analysis_model,
            ));
            defaults.analysis_model.clone()
        };

        let max_chain_length = if self.max_chain_length == 0 {
            issues.push(ConfigIssue::invalid_value(
                Severity::Error,
                "router.max_chain_length",
                0,
                format!(
                    "router.max_chain_length must be at least 1, using {}",
                    defaults.max_chain_length
                ),
            ));
            defaults.max_chain_length
        } else {
            self.max_chain_length
        };

        let mut fallback_overrides = HashMap::new();
        let mut requested: Vec<&String> = self.fallbacks.keys().collect();
        requested.sort();
        for model in requested {
            let field = format!("router.fallbacks.{}", model);
            if registry.model(model).is_none() {
                issues.push(ConfigIssue::unknown_model(&field, model));
                continue;
            }
            let substitutes: Vec<String> = self.fallbacks[model]
                .iter()
                .filter(|id| {
                    let known = registry.model(id).is_some();
                    if !known {
                        issues.push(ConfigIssue::unknown_model(&field, id.as_str()));
                    }
                    known
                })
                .cloned()
                .collect();
            fallback_overrides.insert(model.clone(), substitutes);
        }

        let config = RouterConfig {
            analysis_model,
            max_chain_length,
            fallback_overrides,
        };
        (config, issues)
    }
}
