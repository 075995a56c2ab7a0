//! Application layer for taskpilot
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{AppConfig, QueueConfig, RouterConfig};
pub use ports::{
    clock::{Clock, SystemClock},
    llm_gateway::{GatewayError, GatewayReply, LlmGateway},
    notifier::{NoNotifier, NotifyError, TaskNotifier},
    persister::{NoPersistence, PersistError, TaskPersister},
    queue_event::{EventSink, QueueEvent},
    task_handler::{FailureKind, HandlerError, ProgressSink, TaskContext, TaskHandler},
};
pub use use_cases::ai_router::{AgentRequestOptions, AiRouter, RouterError};
pub use use_cases::handlers::{
    AgentExecutionHandler, AiAnalysisHandler, DataAnalysisHandler, EmailProcessingHandler,
    ReportGenerationHandler, SystemMaintenanceHandler,
};
pub use use_cases::lifecycle::LifecycleDispatcher;
pub use use_cases::task_queue::{TaskQueue, TaskQueueBuilder};
