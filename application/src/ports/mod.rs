//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod clock;
pub mod llm_gateway;
pub mod notifier;
pub mod persister;
pub mod queue_event;
pub mod task_handler;
