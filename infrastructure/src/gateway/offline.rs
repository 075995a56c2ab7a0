//! Offline gateway: simulated model backend.
//!
//! Produces deterministic answers without network access. Latency and model
//! outages are configurable so fallback chains and timeouts can be
//! exercised end to end.

use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;
use taskpilot_application::ports::llm_gateway::{GatewayError, GatewayReply, LlmGateway};
use taskpilot_domain::util::truncate_str;
use taskpilot_domain::{ChatMessage, ChatOptions, ModelDescriptor, Role, estimate_tokens};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct OfflineGateway {
    latency: Duration,
    failing_models: HashSet<String>,
}

impl OfflineGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make every request to `model_id` fail as unavailable.
    pub fn with_failing_model(mut self, model_id: impl Into<String>) -> Self {
        self.failing_models.insert(model_id.into());
        self
    }
}

#[async_trait]
impl LlmGateway for OfflineGateway {
    async fn complete(
        &self,
        model: &ModelDescriptor,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<GatewayReply, GatewayError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if self.failing_models.contains(&model.id) {
            debug!("Simulated outage for {}", model.id);
            return Err(GatewayError::ModelNotAvailable(format!(
                "{} is unavailable (simulated outage)",
                model.id
            )));
        }

        let question = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        let content = format!(
            "[{} via {}] Simulated response to: {}",
            model.id,
            model.provider,
            truncate_str(question.trim(), 200)
        );

        let prompt_tokens: u64 = messages.iter().map(|m| estimate_tokens(&m.content)).sum();
        let mut completion_tokens = estimate_tokens(&content);
        if let Some(max) = options.max_tokens {
            completion_tokens = completion_tokens.min(u64::from(max));
        }
        let tokens = u32::try_from(prompt_tokens + completion_tokens).unwrap_or(u32::MAX);

        Ok(GatewayReply::new(content).with_tokens(tokens))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskpilot_domain::ModelRegistry;

    fn gpt4o() -> ModelDescriptor {
        ModelRegistry::default().model("gpt-4o").unwrap().clone()
    }

    #[tokio::test]
    async fn test_answers_last_user_message() {
        let reply = OfflineGateway::new()
            .complete(
                &gpt4o(),
                &[
                    ChatMessage::system("be brief"),
                    ChatMessage::user("first"),
                    ChatMessage::assistant("ok"),
                    ChatMessage::user("what is 2+2?"),
                ],
                &ChatOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(
            reply.content,
            "[gpt-4o via openai] Simulated response to: what is 2+2?"
        );
        assert!(reply.tokens_used.unwrap() > 0);
    }

    #[tokio::test]
    async fn test_simulated_outage() {
        let err = OfflineGateway::new()
            .with_failing_model("gpt-4o")
            .complete(&gpt4o(), &[ChatMessage::user("hi")], &ChatOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::ModelNotAvailable(_)));
    }

    #[tokio::test]
    async fn test_latency_is_applied() {
        let started = std::time::Instant::now();
        OfflineGateway::new()
            .with_latency(Duration::from_millis(20))
            .complete(&gpt4o(), &[ChatMessage::user("hi")], &ChatOptions::default())
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
