//! LLM gateway adapters.

mod offline;

pub use offline::OfflineGateway;
