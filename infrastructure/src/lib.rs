//! Infrastructure layer for taskpilot
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod gateway;
pub mod notification;
pub mod persistence;

// Re-export commonly used types
pub use config::{
    ConfigLoader, FileConfig, FileGatewayConfig, FileLoggingConfig, FilePersistenceConfig,
    FileQueueConfig, FileRouterConfig,
};
pub use gateway::OfflineGateway;
pub use notification::{FanoutNotifier, TracingNotifier};
pub use persistence::{InMemoryTaskStore, JsonlTaskPersister};
