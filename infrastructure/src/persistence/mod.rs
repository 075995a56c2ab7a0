//! Task persisters implementing the [`TaskPersister`](taskpilot_application::TaskPersister) port.

mod jsonl;
mod memory;

pub use jsonl::JsonlTaskPersister;
pub use memory::InMemoryTaskStore;
