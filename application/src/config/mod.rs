//! Application-level configuration.
//!
//! - [`QueueConfig`]: scheduler concurrency, retries, timeouts
//! - [`RouterConfig`]: fallback chains and the default analysis model
//! - [`AppConfig`]: container handed from the config loader to the binary

pub mod queue_config;
pub mod router_config;

pub use queue_config::QueueConfig;
pub use router_config::RouterConfig;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    pub queue: QueueConfig,
    pub router: RouterConfig,
}
