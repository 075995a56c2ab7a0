//! Model and agent descriptors.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Vendor serving a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Anthropic,
    Google,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Google => "google",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Provider {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "anthropic" => Ok(Provider::Anthropic),
            "google" => Ok(Provider::Google),
            _ => Err(DomainError::UnknownProvider(s.to_string())),
        }
    }
}

/// Risk level of an agent operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Read-mostly work (e.g. data exploration)
    Low,
    /// Broad research or external lookups
    Medium,
    /// Work that proposes changes to systems or code
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            _ => Err(DomainError::UnknownRiskLevel(s.to_string())),
        }
    }
}

/// A directly callable model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,
    pub provider: Provider,
    pub cost_per_token: f64,
    pub max_tokens: u32,
    pub capabilities: Vec<String>,
    /// Capability tier, 1 (weakest) to 5 (strongest).
    pub tier: u8,
}

impl ModelDescriptor {
    pub fn new(id: impl Into<String>, provider: Provider, cost_per_token: f64, tier: u8) -> Self {
        Self {
            id: id.into(),
            provider,
            cost_per_token,
            max_tokens: 4096,
            capabilities: Vec::new(),
            tier,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_capabilities(mut self, capabilities: &[&str]) -> Self {
        self.capabilities = capabilities.iter().map(|c| c.to_string()).collect();
        self
    }
}

/// A higher-risk, approval-gated agent persona.
///
/// Agents are never callable through plain chat completion; they run only
/// through an approved [`ApprovalRequest`](super::approval::ApprovalRequest).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    pub id: String,
    pub provider: Provider,
    pub cost_per_token: f64,
    pub max_tokens: u32,
    pub capabilities: Vec<String>,
    pub requires_approval: bool,
    pub risk_level: RiskLevel,
    #[serde(with = "crate::util::duration_ms")]
    pub max_execution_time: Duration,
    /// Baseline duration for a task of ordinary complexity.
    #[serde(with = "crate::util::duration_ms")]
    pub typical_execution_time: Duration,
    pub estimated_cost_per_request: f64,
    pub persona: String,
}
