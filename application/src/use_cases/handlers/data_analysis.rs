//! `data_analysis` task handler.

use crate::ports::task_handler::{HandlerError, TaskContext, TaskHandler};
use crate::use_cases::ai_router::AiRouter;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use taskpilot_domain::{ChatMessage, ChatOptions, PromptTemplate, TaskType};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct DataPayload {
    data: Value,
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    model: Option<String>,
}

/// Sends a JSON dataset to the router with the data analyst preamble.
pub struct DataAnalysisHandler {
    router: Arc<AiRouter>,
}

impl DataAnalysisHandler {
    pub fn new(router: Arc<AiRouter>) -> Self {
        Self { router }
    }
}

/// Rows for an array, keys for an object, 1 for a scalar.
fn record_count(data: &Value) -> usize {
    match data {
        Value::Array(rows) => rows.len(),
        Value::Object(fields) => fields.len(),
        Value::Null => 0,
        _ => 1,
    }
}

#[async_trait]
impl TaskHandler for DataAnalysisHandler {
    fn task_type(&self) -> TaskType {
        TaskType::DataAnalysis
    }

    async fn handle(&self, ctx: TaskContext) -> Result<Value, HandlerError> {
        let payload: DataPayload = serde_json::from_value(ctx.payload.clone()).map_err(|e| {
            HandlerError::permanent(format!("invalid data_analysis payload: {}", e))
        })?;
        let records = record_count(&payload.data);
        if records == 0 {
            return Err(HandlerError::permanent("data_analysis payload has no data"));
        }
        ctx.progress.report(10);

        let dataset = serde_json::to_string_pretty(&payload.data)
            .map_err(|e| HandlerError::permanent(format!("unserializable dataset: {}", e)))?;
        let model = payload
            .model
            .unwrap_or_else(|| self.router.config().analysis_model.clone());
        let messages = [
            ChatMessage::system(PromptTemplate::data_analyst_system()),
            ChatMessage::user(PromptTemplate::data_analysis_prompt(
                &dataset,
                payload.question.as_deref(),
            )),
        ];
        let options = ChatOptions {
            user_id: ctx.owner_id.clone(),
            ..Default::default()
        };
        ctx.progress.report(30);

        debug!("Task {} analysing {} records via {}", ctx.task_id, records, model);
        let response = self.router.chat_completion(&messages, &model, &options).await?;
        ctx.progress.report(80);

        Ok(json!({
            "records": records,
            "question": payload.question,
            "analysis": response.content,
            "model": response.model,
            "fallback_used": response.fallback_used,
            "tokens_used": response.tokens_used,
            "cost": response.cost,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouterConfig;
    use crate::ports::llm_gateway::{GatewayError, GatewayReply, LlmGateway};
    use crate::ports::queue_event::EventSink;
    use crate::ports::task_handler::{FailureKind, ProgressSink};
    use std::sync::Mutex;
    use taskpilot_domain::{ModelDescriptor, ModelRegistry, TaskId};

    /// Answers with the user prompt so tests can inspect it.
    struct EchoGateway;

    #[async_trait]
    impl LlmGateway for EchoGateway {
        async fn complete(
            &self,
            _model: &ModelDescriptor,
            messages: &[ChatMessage],
            _options: &ChatOptions,
        ) -> Result<GatewayReply, GatewayError> {
            let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok(GatewayReply::new(last).with_tokens(40))
        }
    }

    fn handler() -> DataAnalysisHandler {
        let router = AiRouter::new(
            ModelRegistry::default(),
            Arc::new(EchoGateway),
            RouterConfig::default(),
        );
        DataAnalysisHandler::new(Arc::new(router))
    }

    fn ctx(payload: Value, progress: Arc<Mutex<Vec<u8>>>) -> TaskContext {
        TaskContext {
            task_id: TaskId::new("t-2"),
            task_type: TaskType::DataAnalysis,
            owner_id: None,
            payload,
            attempt: 1,
            progress: ProgressSink::new(move |p| progress.lock().unwrap().push(p)),
            events: EventSink::discard(),
        }
    }

    #[tokio::test]
    async fn test_dataset_is_analysed() {
        let progress = Arc::new(Mutex::new(Vec::new()));
        let result = handler()
            .handle(ctx(
                json!({
                    "data": [{"month": "jan", "sales": 10}, {"month": "feb", "sales": 95}],
                    "question": "Which month spiked?",
                }),
                progress.clone(),
            ))
            .await
            .unwrap();

        assert_eq!(result["records"], 2);
        assert_eq!(result["question"], "Which month spiked?");
        assert_eq!(result["model"], "gpt-4o");
        assert_eq!(result["tokens_used"], 40);
        let analysis = result["analysis"].as_str().unwrap();
        assert!(analysis.contains("\"sales\": 95"));
        assert!(analysis.ends_with("Question: Which month spiked?"));
        assert_eq!(*progress.lock().unwrap(), vec![10, 30, 80]);
    }

    #[tokio::test]
    async fn test_missing_or_empty_data_is_permanent() {
        for payload in [json!({"question": "why?"}), json!({"data": []}), json!({"data": null})] {
            let err = handler()
                .handle(ctx(payload, Arc::new(Mutex::new(Vec::new()))))
                .await
                .unwrap_err();
            assert_eq!(err.kind, FailureKind::Permanent);
        }
    }

    #[test]
    fn test_record_count() {
        assert_eq!(record_count(&json!([1, 2, 3])), 3);
        assert_eq!(record_count(&json!({"a": 1, "b": 2})), 2);
        assert_eq!(record_count(&json!("x")), 1);
        assert_eq!(record_count(&Value::Null), 0);
    }
}
