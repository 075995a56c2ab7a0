//! Domain layer for taskpilot
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure, presentation, or an async
//! runtime.
//!
//! # Core Concepts
//!
//! ## Tasks
//!
//! A [`Task`] is a unit of background work with a priority tier, optional
//! dependencies and a retry budget. Its status follows a fixed state machine
//! (see [`TaskStatus`]); every transition goes through a method on the entity
//! and an illegal one is a [`DomainError::InvalidTransition`].
//!
//! Admission ([`select_runnable`]), backoff ([`RetryPolicy`]) and
//! statistics ([`QueueStats`]) are pure functions over task snapshots.
//!
//! ## Routing
//!
//! The [`ModelRegistry`] describes callable models and approval-gated
//! agents, and computes fallback chains. Agents only run through an approved
//! [`ApprovalRequest`].

pub mod config;
pub mod core;
pub mod prompt;
pub mod routing;
pub mod task;
pub mod util;

// Re-export commonly used types
pub use config::{ConfigIssue, ConfigIssueCode, Severity};
pub use core::error::DomainError;
pub use prompt::PromptTemplate;
pub use routing::{
    approval::{AgentExecutionRecord, ApprovalId, ApprovalRequest},
    complexity::Complexity,
    cost::{estimate_cost, estimate_tokens},
    message::{ChatMessage, ChatOptions, ChatResponse, Role},
    model::{AgentDescriptor, ModelDescriptor, Provider, RiskLevel},
    registry::{DEFAULT_MAX_CHAIN_LENGTH, ModelRegistry},
};
pub use task::{
    entities::{FailureOutcome, NewTask, Task, TaskDefaults, TaskStatus},
    scheduling::{RetryPolicy, is_blocked, select_runnable},
    stats::{QueueHealth, QueueStats},
    value_objects::{TaskId, TaskPriority, TaskType},
};
