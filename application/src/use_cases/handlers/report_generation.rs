//! `report_generation` task handler.

use crate::ports::task_handler::{HandlerError, TaskContext, TaskHandler};
use crate::use_cases::ai_router::AiRouter;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use taskpilot_domain::{ChatMessage, ChatOptions, PromptTemplate, TaskType};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct ReportPayload {
    title: String,
    #[serde(default)]
    sections: Vec<String>,
    /// Free text or any JSON; non-strings are embedded pretty-printed.
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    model: Option<String>,
}

/// Drafts a titled report through the router with the report writer
/// preamble.
pub struct ReportGenerationHandler {
    router: Arc<AiRouter>,
}

impl ReportGenerationHandler {
    pub fn new(router: Arc<AiRouter>) -> Self {
        Self { router }
    }
}

#[async_trait]
impl TaskHandler for ReportGenerationHandler {
    fn task_type(&self) -> TaskType {
        TaskType::ReportGeneration
    }

    async fn handle(&self, ctx: TaskContext) -> Result<Value, HandlerError> {
        let payload: ReportPayload = serde_json::from_value(ctx.payload.clone()).map_err(|e| {
            HandlerError::permanent(format!("invalid report_generation payload: {}", e))
        })?;
        let title = payload.title.trim();
        if title.is_empty() {
            return Err(HandlerError::permanent("report_generation payload requires a title"));
        }
        ctx.progress.report(10);

        let material = match payload.data {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text),
            Some(other) => Some(serde_json::to_string_pretty(&other).map_err(|e| {
                HandlerError::permanent(format!("unserializable report data: {}", e))
            })?),
        };
        let model = payload
            .model
            .unwrap_or_else(|| self.router.config().analysis_model.clone());
        let messages = [
            ChatMessage::system(PromptTemplate::report_writer_system()),
            ChatMessage::user(PromptTemplate::report_prompt(
                title,
                &payload.sections,
                material.as_deref(),
            )),
        ];
        let options = ChatOptions {
            user_id: ctx.owner_id.clone(),
            ..Default::default()
        };
        ctx.progress.report(25);

        debug!("Task {} drafting report '{}' via {}", ctx.task_id, title, model);
        let response = self.router.chat_completion(&messages, &model, &options).await?;
        ctx.progress.report(75);

        let report = serde_json::to_value(&response)
            .map_err(|e| HandlerError::permanent(format!("unserializable response: {}", e)))?;
        ctx.progress.report(90);
        Ok(json!({
            "title": title,
            "sections": payload.sections,
            "report": report,
        }))
    }
}
