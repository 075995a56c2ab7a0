//! Task entity, state machine, admission selection and statistics.

pub mod entities;
pub mod scheduling;
pub mod stats;
pub mod value_objects;
