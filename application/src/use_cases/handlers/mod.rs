//! One task handler per [`TaskType`](taskpilot_domain::TaskType).
//!
//! Every handler except `email_processing` calls into the AI router.

pub mod agent_execution;
pub mod ai_analysis;
pub mod data_analysis;
pub mod email_processing;
pub mod report_generation;
pub mod system_maintenance;

pub use agent_execution::AgentExecutionHandler;
pub use ai_analysis::AiAnalysisHandler;
pub use data_analysis::DataAnalysisHandler;
pub use email_processing::EmailProcessingHandler;
pub use report_generation::ReportGenerationHandler;
pub use system_maintenance::SystemMaintenanceHandler;
