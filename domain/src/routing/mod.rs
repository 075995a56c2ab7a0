//! Model routing: registry, chat types, cost and complexity estimation,
//! approval requests.

pub mod approval;
pub mod complexity;
pub mod cost;
pub mod message;
pub mod model;
pub mod registry;
