//! Configuration validation types

pub mod validation;

pub use validation::{ConfigIssue, ConfigIssueCode, Severity};
