//! Human approval gate for agent execution.

use super::complexity::Complexity;
use super::model::{AgentDescriptor, RiskLevel};
use crate::task::value_objects::TaskId;
use crate::util::duration_ms;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Identifier of an approval request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApprovalId(String);

impl ApprovalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ApprovalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cost/time estimate a human signs off on before an agent runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub id: ApprovalId,
    pub agent_id: String,
    pub task: String,
    pub estimated_cost: f64,
    #[serde(rename = "estimated_time_ms", with = "duration_ms")]
    pub estimated_time: Duration,
    pub risk_level: RiskLevel,
    pub justification: String,
    pub complexity_multiplier: f64,
    pub requested_by: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub approved: bool,
    pub approver: Option<String>,
}

impl ApprovalRequest {
    /// Build an unapproved request for `agent`, scaling its baseline cost
    /// and time by the complexity of `task`. The time estimate never exceeds
    /// the agent's maximum execution time.
    pub fn for_agent(
        agent: &AgentDescriptor,
        task: impl Into<String>,
        justification: Option<String>,
        requested_by: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let task = task.into();
        let complexity = Complexity::assess(&task);
        let multiplier = complexity.multiplier;

        let estimated_time = agent
            .typical_execution_time
            .mul_f64(multiplier)
            .min(agent.max_execution_time);

        let justification = justification.unwrap_or_else(|| {
            format!(
                "{} requires approval: {} risk, complexity x{}",
                agent.id, agent.risk_level, multiplier
            )
        });

        Self {
            id: ApprovalId::generate(),
            agent_id: agent.id.clone(),
            task,
            estimated_cost: agent.estimated_cost_per_request * multiplier,
            estimated_time,
            risk_level: agent.risk_level,
            justification,
            complexity_multiplier: multiplier,
            requested_by,
            requested_at: now,
            approved: false,
            approver: None,
        }
    }

    /// Record a human decision.
    pub fn approve(&mut self, approver: impl Into<String>) {
        self.approved = true;
        self.approver = Some(approver.into());
    }
}

/// Outcome of one agent run, persisted apart from the task record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentExecutionRecord {
    pub id: String,
    pub task_id: Option<TaskId>,
    pub approval_id: ApprovalId,
    pub agent_id: String,
    pub approver_id: String,
    pub success: bool,
    pub response: Option<String>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}
