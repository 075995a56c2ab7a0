//! Configuration file loading
//!
//! Loads `taskpilot.toml` files and environment overrides with figment and
//! converts them into application configuration.

mod file_config;
mod loader;

pub use file_config::{
    FileConfig, FileGatewayConfig, FileLoggingConfig, FilePersistenceConfig, FileQueueConfig,
    FileRouterConfig,
};
pub use loader::ConfigLoader;
