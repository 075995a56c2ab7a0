//! Task value objects - identifiers and classification enums.
//!
//! # Identifiers
//! - [`TaskId`] - Opaque, unique identifier for a queued task
//!
//! # Classification
//! - [`TaskType`] - Selects the handler that executes a task
//! - [`TaskPriority`] - Admission tier (critical > high > normal > low)

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Unique identifier for a queued task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Creates a TaskId from an existing string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a new random TaskId (UUID v4).
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of work a task performs. Each type is executed by its own handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    AiAnalysis,
    EmailProcessing,
    DataAnalysis,
    ReportGeneration,
    SystemMaintenance,
    AgentExecution,
}

impl TaskType {
    pub const ALL: [TaskType; 6] = [
        TaskType::AiAnalysis,
        TaskType::EmailProcessing,
        TaskType::DataAnalysis,
        TaskType::ReportGeneration,
        TaskType::SystemMaintenance,
        TaskType::AgentExecution,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::AiAnalysis => "ai_analysis",
            TaskType::EmailProcessing => "email_processing",
            TaskType::DataAnalysis => "data_analysis",
            TaskType::ReportGeneration => "report_generation",
            TaskType::SystemMaintenance => "system_maintenance",
            TaskType::AgentExecution => "agent_execution",
        }
    }

    /// Whether this task type calls into the AI router.
    pub fn uses_ai_router(&self) -> bool {
        matches!(self, TaskType::AiAnalysis | TaskType::AgentExecution)
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TaskType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::UnknownTaskType(s.to_string()))
    }
}

/// Admission tier of a task.
///
/// Ordering follows admission order: `Critical < High < Normal < Low`, so
/// sorting ascending yields the order in which the scheduler admits tasks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Critical,
    High,
    #[default]
    Normal,
    Low,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Critical => "critical",
            TaskPriority::High => "high",
            TaskPriority::Normal => "normal",
            TaskPriority::Low => "low",
        }
    }

    /// Zero-based tier rank; lower ranks are admitted first.
    pub fn rank(&self) -> u8 {
        match self {
            TaskPriority::Critical => 0,
            TaskPriority::High => 1,
            TaskPriority::Normal => 2,
            TaskPriority::Low => 3,
        }
    }
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TaskPriority {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(TaskPriority::Critical),
            "high" => Ok(TaskPriority::High),
            "normal" => Ok(TaskPriority::Normal),
            "low" => Ok(TaskPriority::Low),
            _ => Err(DomainError::UnknownPriority(s.to_string())),
        }
    }
}
