//! AI router parameters.

use std::collections::HashMap;
use taskpilot_domain::DEFAULT_MAX_CHAIN_LENGTH;

#[derive(Debug, Clone, PartialEq)]
pub struct RouterConfig {
    /// Model used by `ai_analysis` tasks that do not name one.
    pub analysis_model: String,
    /// Upper bound on models tried per request, requested model included.
    pub max_chain_length: usize,
    /// Explicit substitutes per requested model, replacing the
    /// provider-based ordering.
    pub fallback_overrides: HashMap<String, Vec<String>>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            analysis_model: "gpt-4o".to_string(),
            max_chain_length: DEFAULT_MAX_CHAIN_LENGTH,
            fallback_overrides: HashMap::new(),
        }
    }
}

impl RouterConfig {
    pub fn overrides_for(&self, model_id: &str) -> Option<&[String]> {
        self.fallback_overrides.get(model_id).map(Vec::as_slice)
    }

    pub fn with_analysis_model(mut self, model: impl Into<String>) -> Self {
        self.analysis_model = model.into();
        self
    }

    pub fn with_max_chain_length(mut self, max: usize) -> Self {
        self.max_chain_length = max;
        self
    }

    pub fn with_fallbacks(mut self, model: impl Into<String>, fallbacks: Vec<String>) -> Self {
        self.fallback_overrides.insert(model.into(), fallbacks);
        self
    }
}
