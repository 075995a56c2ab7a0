//! LLM Gateway port
//!
//! Defines the interface for sending a conversation to a single model.

use async_trait::async_trait;
use taskpilot_domain::{ChatMessage, ChatOptions, ModelDescriptor};
use thiserror::Error;

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

/// Raw model output before the router prices it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayReply {
    pub content: String,
    /// Token count reported by the backend, if any.
    pub tokens_used: Option<u32>,
}

impl GatewayReply {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tokens_used: None,
        }
    }

    pub fn with_tokens(mut self, tokens: u32) -> Self {
        self.tokens_used = Some(tokens);
        self
    }
}

/// Gateway for LLM communication
///
/// One call is one attempt against one model; fallback across models is the
/// router's job. Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn complete(
        &self,
        model: &ModelDescriptor,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<GatewayReply, GatewayError>;
}
