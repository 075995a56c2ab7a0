//! Progress reporting for running tasks

pub mod reporter;
