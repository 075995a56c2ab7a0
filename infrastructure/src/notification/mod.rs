//! Notifiers implementing the [`TaskNotifier`](taskpilot_application::TaskNotifier) port.

mod fanout;
mod log;

pub use fanout::FanoutNotifier;
pub use log::TracingNotifier;
