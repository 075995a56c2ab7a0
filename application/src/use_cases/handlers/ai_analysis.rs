//! `ai_analysis` task handler.

use crate::ports::task_handler::{HandlerError, TaskContext, TaskHandler};
use crate::use_cases::ai_router::AiRouter;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use taskpilot_domain::{ChatMessage, ChatOptions, PromptTemplate, TaskType};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct AnalysisPayload {
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    analysis_type: Option<String>,
}

/// Runs a prompt (or raw content) through the router with the analyst
/// preamble. The result is the serialized chat response.
pub struct AiAnalysisHandler {
    router: Arc<AiRouter>,
}

impl AiAnalysisHandler {
    pub fn new(router: Arc<AiRouter>) -> Self {
        Self { router }
    }
}

#[async_trait]
impl TaskHandler for AiAnalysisHandler {
    fn task_type(&self) -> TaskType {
        TaskType::AiAnalysis
    }

    async fn handle(&self, ctx: TaskContext) -> Result<Value, HandlerError> {
        let payload: AnalysisPayload = serde_json::from_value(ctx.payload.clone())
            .map_err(|e| HandlerError::permanent(format!("invalid ai_analysis payload: {}", e)))?;

        let text = payload
            .prompt
            .or(payload.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                HandlerError::permanent("ai_analysis payload requires a prompt or content")
            })?;
        ctx.progress.report(10);

        let model = payload
            .model
            .unwrap_or_else(|| self.router.config().analysis_model.clone());
        let messages = [
            ChatMessage::system(PromptTemplate::analyst_system()),
            ChatMessage::user(PromptTemplate::analysis_prompt(
                &text,
                payload.analysis_type.as_deref(),
            )),
        ];
        let options = ChatOptions {
            user_id: ctx.owner_id.clone(),
            ..Default::default()
        };
        ctx.progress.report(30);

        debug!("Task {} analysing via {}", ctx.task_id, model);
        let response = self.router.chat_completion(&messages, &model, &options).await?;
        ctx.progress.report(50);

        let result = serde_json::to_value(&response)
            .map_err(|e| HandlerError::permanent(format!("unserializable response: {}", e)))?;
        ctx.progress.report(90);
        Ok(result)
    }
}
