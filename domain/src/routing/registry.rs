//! Registry of callable models and approval-gated agents.

use super::model::{AgentDescriptor, ModelDescriptor, Provider, RiskLevel};
use std::time::Duration;

/// Default cap on the number of models tried for one request.
pub const DEFAULT_MAX_CHAIN_LENGTH: usize = 4;

/// Static catalogue of models and agents, in declaration order.
///
/// Declaration order is significant: ties on capability tier resolve to the
/// earlier entry.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: Vec<ModelDescriptor>,
    agents: Vec<AgentDescriptor>,
}

impl ModelRegistry {
    pub fn new(models: Vec<ModelDescriptor>, agents: Vec<AgentDescriptor>) -> Self {
        Self { models, agents }
    }

    pub fn models(&self) -> &[ModelDescriptor] {
        &self.models
    }

    pub fn agents(&self) -> &[AgentDescriptor] {
        &self.agents
    }

    pub fn model(&self, id: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.id == id)
    }

    pub fn agent(&self, id: &str) -> Option<&AgentDescriptor> {
        self.agents.iter().find(|a| a.id == id)
    }

    pub fn is_agent(&self, id: &str) -> bool {
        self.agent(id).is_some()
    }

    /// Per-token cost of a model or agent.
    pub fn cost_per_token(&self, id: &str) -> Option<f64> {
        self.model(id)
            .map(|m| m.cost_per_token)
            .or_else(|| self.agent(id).map(|a| a.cost_per_token))
    }

    /// Highest-tier model; the first declared wins a tie.
    pub fn most_capable_model(&self) -> Option<&ModelDescriptor> {
        self.models.iter().fold(None, |best, m| match best {
            Some(b) if b.tier >= m.tier => Some(b),
            _ => Some(m),
        })
    }

    /// Ordered list of model ids to try for a request to `model_id`.
    ///
    /// The requested model always comes first. With `overrides`, the listed
    /// models follow in the given order; otherwise substitutes from the same
    /// provider come next, then other providers, each group by descending
    /// tier. Unknown ids and agents are skipped, duplicates removed, and the
    /// chain is capped at `max_len` (at least one entry).
    ///
    /// Returns an empty chain when `model_id` is not a registered model.
    pub fn fallback_chain(
        &self,
        model_id: &str,
        overrides: Option<&[String]>,
        max_len: usize,
    ) -> Vec<String> {
        let Some(requested) = self.model(model_id) else {
            return Vec::new();
        };

        let substitutes: Vec<&ModelDescriptor> = match overrides {
            Some(ids) => ids.iter().filter_map(|id| self.model(id)).collect(),
            None => {
                let mut same: Vec<&ModelDescriptor> = self
                    .models
                    .iter()
                    .filter(|m| m.provider == requested.provider)
                    .collect();
                let mut other: Vec<&ModelDescriptor> = self
                    .models
                    .iter()
                    .filter(|m| m.provider != requested.provider)
                    .collect();
                same.sort_by(|a, b| b.tier.cmp(&a.tier));
                other.sort_by(|a, b| b.tier.cmp(&a.tier));
                same.into_iter().chain(other).collect()
            }
        };

        let mut chain = vec![requested.id.clone()];
        for m in substitutes {
            if chain.len() >= max_len.max(1) {
                break;
            }
            if !chain.contains(&m.id) {
                chain.push(m.id.clone());
            }
        }
        chain
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(default_models(), default_agents())
    }
}

fn default_models() -> Vec<ModelDescriptor> {
    vec![
        ModelDescriptor::new("gpt-4o", Provider::OpenAi, 0.00001, 5)
            .with_max_tokens(128_000)
            .with_capabilities(&["chat", "analysis", "code", "vision"]),
        ModelDescriptor::new("gpt-4o-mini", Provider::OpenAi, 0.0000006, 3)
            .with_max_tokens(128_000)
            .with_capabilities(&["chat", "analysis"]),
        ModelDescriptor::new("gpt-3.5-turbo", Provider::OpenAi, 0.000002, 2)
            .with_max_tokens(16_385)
            .with_capabilities(&["chat"]),
        ModelDescriptor::new("claude-3-5-sonnet", Provider::Anthropic, 0.000015, 5)
            .with_max_tokens(200_000)
            .with_capabilities(&["chat", "analysis", "code", "long-context"]),
        ModelDescriptor::new("claude-3-haiku", Provider::Anthropic, 0.00000125, 3)
            .with_max_tokens(200_000)
            .with_capabilities(&["chat", "summarization"]),
        ModelDescriptor::new("gemini-1.5-pro", Provider::Google, 0.000007, 4)
            .with_max_tokens(1_000_000)
            .with_capabilities(&["chat", "analysis", "long-context"]),
    ]
}

fn default_agents() -> Vec<AgentDescriptor> {
    vec![
        AgentDescriptor {
            id: "research-agent".into(),
            provider: Provider::Anthropic,
            cost_per_token: 0.000015,
            max_tokens: 200_000,
            capabilities: vec!["web-research".into(), "synthesis".into(), "citations".into()],
            requires_approval: true,
            risk_level: RiskLevel::Medium,
            max_execution_time: Duration::from_secs(600),
            typical_execution_time: Duration::from_secs(180),
            estimated_cost_per_request: 0.50,
            persona: "You are a meticulous research agent. Gather evidence, cross-check \
                      sources and report findings with their provenance."
                .into(),
        },
        AgentDescriptor {
            id: "code-architect-agent".into(),
            provider: Provider::OpenAi,
            cost_per_token: 0.00001,
            max_tokens: 128_000,
            capabilities: vec![
                "system-design".into(),
                "refactoring".into(),
                "code-review".into(),
            ],
            requires_approval: true,
            risk_level: RiskLevel::High,
            max_execution_time: Duration::from_secs(900),
            typical_execution_time: Duration::from_secs(300),
            estimated_cost_per_request: 1.20,
            persona: "You are a senior software architect. Propose designs and changes \
                      with explicit trade-offs and a migration path."
                .into(),
        },
        AgentDescriptor {
            id: "data-analyst-agent".into(),
            provider: Provider::Google,
            cost_per_token: 0.000007,
            max_tokens: 1_000_000,
            capabilities: vec!["statistics".into(), "visualization".into(), "forecasting".into()],
            requires_approval: true,
            risk_level: RiskLevel::Low,
            max_execution_time: Duration::from_secs(300),
            typical_execution_time: Duration::from_secs(150),
            estimated_cost_per_request: 0.25,
            persona: "You are a careful data analyst. Describe the data, state assumptions \
                      and quantify uncertainty."
                .into(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let registry = ModelRegistry::default();
        assert_eq!(registry.model("gpt-4o").unwrap().provider, Provider::OpenAi);
        assert!(registry.model("research-agent").is_none());
        assert!(registry.is_agent("research-agent"));
        assert!(!registry.is_agent("gpt-4o"));
        assert_eq!(registry.cost_per_token("data-analyst-agent"), Some(0.000007));
        assert!(registry.cost_per_token("nope").is_none());
        assert!(registry.agents().iter().all(|a| a.requires_approval));
    }

    #[test]
    fn test_most_capable_prefers_first_on_tie() {
        let registry = ModelRegistry::default();
        assert_eq!(registry.most_capable_model().unwrap().id, "gpt-4o");
    }

    #[test]
    fn test_default_chain_same_provider_first() {
        let registry = ModelRegistry::default();
        assert_eq!(
            registry.fallback_chain("gpt-4o", None, DEFAULT_MAX_CHAIN_LENGTH),
            vec!["gpt-4o", "gpt-4o-mini", "gpt-3.5-turbo", "claude-3-5-sonnet"]
        );
        assert_eq!(
            registry.fallback_chain("claude-3-haiku", None, 3),
            vec!["claude-3-haiku", "claude-3-5-sonnet", "gpt-4o"]
        );
    }

    #[test]
    fn test_override_chain() {
        let registry = ModelRegistry::default();
        let overrides = vec![
            "gemini-1.5-pro".to_string(),
            "research-agent".to_string(),
            "gpt-4o".to_string(),
            "unknown".to_string(),
            "claude-3-haiku".to_string(),
        ];
        assert_eq!(
            registry.fallback_chain("gpt-4o", Some(&overrides), 4),
            vec!["gpt-4o", "gemini-1.5-pro", "claude-3-haiku"]
        );
    }

    #[test]
    fn test_chain_edge_cases() {
        let registry = ModelRegistry::default();
        assert!(registry.fallback_chain("research-agent", None, 4).is_empty());
        assert!(registry.fallback_chain("nope", None, 4).is_empty());
        assert_eq!(registry.fallback_chain("gpt-4o", None, 0), vec!["gpt-4o"]);
    }
}
