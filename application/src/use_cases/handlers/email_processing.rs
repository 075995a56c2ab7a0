//! `email_processing` task handler.
//!
//! Content classification happens outside the queue. This handler only
//! validates the message envelope and returns a structured summary of it.

use crate::ports::task_handler::{HandlerError, TaskContext, TaskHandler};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use taskpilot_domain::TaskType;
use taskpilot_domain::util::truncate_str;

const PREVIEW_BYTES: usize = 120;

#[derive(Debug, Deserialize)]
struct EmailPayload {
    from: String,
    #[serde(default)]
    to: Vec<String>,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    body: String,
    #[serde(default)]
    attachments: Vec<Value>,
}

#[derive(Debug, Serialize)]
struct EmailSummary {
    from: String,
    to: Vec<String>,
    subject: Option<String>,
    body_chars: usize,
    body_words: usize,
    attachments: usize,
    preview: String,
}

#[derive(Debug, Default)]
pub struct EmailProcessingHandler;

impl EmailProcessingHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TaskHandler for EmailProcessingHandler {
    fn task_type(&self) -> TaskType {
        TaskType::EmailProcessing
    }

    async fn handle(&self, ctx: TaskContext) -> Result<Value, HandlerError> {
        let email: EmailPayload = serde_json::from_value(ctx.payload).map_err(|e| {
            HandlerError::permanent(format!("invalid email_processing payload: {}", e))
        })?;
        if email.from.trim().is_empty() {
            return Err(HandlerError::permanent("email_processing payload requires a sender"));
        }
        ctx.progress.report(50);

        let summary = EmailSummary {
            body_chars: email.body.chars().count(),
            body_words: email.body.split_whitespace().count(),
            attachments: email.attachments.len(),
            preview: truncate_str(email.body.trim(), PREVIEW_BYTES).to_string(),
            subject: email.subject.filter(|s| !s.trim().is_empty()),
            from: email.from,
            to: email.to,
        };
        serde_json::to_value(&summary)
            .map_err(|e| HandlerError::permanent(format!("unserializable summary: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::queue_event::EventSink;
    use crate::ports::task_handler::{FailureKind, ProgressSink};
    use serde_json::json;
    use taskpilot_domain::TaskId;

    fn ctx(payload: Value) -> TaskContext {
        TaskContext {
            task_id: TaskId::new("t-4"),
            task_type: TaskType::EmailProcessing,
            owner_id: None,
            payload,
            attempt: 1,
            progress: ProgressSink::ignore(),
            events: EventSink::discard(),
        }
    }

    #[tokio::test]
    async fn test_summarizes_envelope() {
        let result = EmailProcessingHandler::new()
            .handle(ctx(json!({
                "from": "ops@example.com",
                "to": ["alice@example.com"],
                "subject": "Disk alert",
                "body": "  Disk usage on db-1 reached 91%.  ",
                "attachments": [{"name": "graph.png"}],
            })))
            .await
            .unwrap();

        assert_eq!(result["from"], "ops@example.com");
        assert_eq!(result["to"], json!(["alice@example.com"]));
        assert_eq!(result["subject"], "Disk alert");
        assert_eq!(result["body_words"], 6);
        assert_eq!(result["attachments"], 1);
        assert_eq!(result["preview"], "Disk usage on db-1 reached 91%.");
    }

    #[tokio::test]
    async fn test_blank_subject_and_empty_body() {
        let result = EmailProcessingHandler::new()
            .handle(ctx(json!({"from": "a@b.c", "subject": " "})))
            .await
            .unwrap();
        assert!(result["subject"].is_null());
        assert_eq!(result["body_chars"], 0);
        assert_eq!(result["preview"], "");
    }

    #[tokio::test]
    async fn test_missing_sender_is_permanent() {
        for payload in [json!({"body": "hi"}), json!({"from": " "}), json!("not an object")] {
            let err = EmailProcessingHandler::new()
                .handle(ctx(payload))
                .await
                .unwrap_err();
            assert_eq!(err.kind, FailureKind::Permanent);
        }
    }
}
