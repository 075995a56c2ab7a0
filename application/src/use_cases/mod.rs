//! Use cases (application services)

pub mod ai_router;
pub mod handlers;
pub mod lifecycle;
pub mod task_queue;
