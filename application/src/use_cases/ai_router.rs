//! AI router use case.
//!
//! Routes chat requests through a fallback chain of models and gates agent
//! personas behind a human approval step.
//!
//! ```text
//! chat_completion(model)            request_agent_execution(agent)
//!        │                                   │
//!   fallback chain                    ApprovalRequest (unapproved)
//!   [model, sub1, sub2, ...]                 │ human decides
//!        │ first success wins         execute_approved_agent_task
//!        ▼                                   │ most capable model + chain
//!   ChatResponse                        ChatResponse (model = agent id)
//! ```

use crate::config::RouterConfig;
use crate::ports::clock::{Clock, SystemClock};
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::task_handler::HandlerError;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use taskpilot_domain::util::truncate_str;
use taskpilot_domain::{
    ApprovalId, ApprovalRequest, ChatMessage, ChatOptions, ChatResponse, ModelRegistry,
    PromptTemplate, estimate_cost, estimate_tokens,
};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors returned by [`AiRouter`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RouterError {
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    #[error("{0} is an agent and requires approval before it can run")]
    AgentRequiresApproval(String),

    #[error("Approval request {0} was not approved")]
    NotApproved(ApprovalId),

    #[error("Approval request {0} has already been executed")]
    ApprovalAlreadyConsumed(ApprovalId),

    #[error("All models failed ({}): {last_error}", attempted.join(", "))]
    FallbackExhausted {
        attempted: Vec<String>,
        last_error: String,
    },
}

impl RouterError {
    /// Errors raised before any model is contacted.
    pub fn is_validation(&self) -> bool {
        !matches!(self, RouterError::FallbackExhausted { .. })
    }
}

impl From<RouterError> for HandlerError {
    fn from(err: RouterError) -> Self {
        if err.is_validation() {
            HandlerError::permanent(err.to_string())
        } else {
            HandlerError::transient(err.to_string())
        }
    }
}

/// Optional metadata for an agent approval request.
#[derive(Debug, Clone, Default)]
pub struct AgentRequestOptions {
    pub justification: Option<String>,
    pub requested_by: Option<String>,
}

/// Model selection, fallback execution and agent approval.
pub struct AiRouter {
    registry: ModelRegistry,
    gateway: Arc<dyn LlmGateway>,
    config: RouterConfig,
    clock: Arc<dyn Clock>,
    /// Approval ids that have run, or are running, to completion.
    consumed: Mutex<HashSet<ApprovalId>>,
}

impl AiRouter {
    pub fn new(registry: ModelRegistry, gateway: Arc<dyn LlmGateway>, config: RouterConfig) -> Self {
        Self {
            registry,
            gateway,
            config,
            clock: Arc::new(SystemClock),
            consumed: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Models that would be tried, in order, for a request to `model_id`.
    pub fn fallback_chain(&self, model_id: &str) -> Vec<String> {
        self.registry.fallback_chain(
            model_id,
            self.config.overrides_for(model_id),
            self.config.max_chain_length,
        )
    }

    /// Send `messages` to `model_id`, falling back through substitutes on
    /// failure.
    ///
    /// Agent ids are rejected outright; they only run through
    /// [`execute_approved_agent_task`](Self::execute_approved_agent_task).
    pub async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        model_id: &str,
        options: &ChatOptions,
    ) -> Result<ChatResponse, RouterError> {
        if self.registry.is_agent(model_id) {
            return Err(RouterError::AgentRequiresApproval(model_id.to_string()));
        }
        if self.registry.model(model_id).is_none() {
            return Err(RouterError::UnknownModel(model_id.to_string()));
        }

        let chain = self.fallback_chain(model_id);
        self.run_chain(chain, messages, options).await
    }

    async fn run_chain(
        &self,
        chain: Vec<String>,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<ChatResponse, RouterError> {
        let started = Instant::now();
        let prompt_tokens: u64 = messages.iter().map(|m| estimate_tokens(&m.content)).sum();
        let mut last_error: Option<String> = None;

        for (index, model_id) in chain.iter().enumerate() {
            let Some(model) = self.registry.model(model_id) else {
                continue;
            };

            debug!("Routing attempt {} via {}", index + 1, model_id);
            match self.gateway.complete(model, messages, options).await {
                Ok(reply) => {
                    let tokens_used = reply.tokens_used.unwrap_or_else(|| {
                        let total = prompt_tokens + estimate_tokens(&reply.content);
                        u32::try_from(total).unwrap_or(u32::MAX)
                    });
                    if index > 0 {
                        info!("Request served by fallback model {}", model_id);
                    }
                    return Ok(ChatResponse {
                        content: reply.content,
                        model: model.id.clone(),
                        provider: model.provider,
                        tokens_used,
                        cost: f64::from(tokens_used) * model.cost_per_token,
                        processing_time: started.elapsed(),
                        fallback_used: index > 0,
                        fallback_reason: if index > 0 { last_error } else { None },
                    });
                }
                Err(e) => {
                    warn!("Model {} failed: {}", model_id, e);
                    last_error = Some(e.to_string());
                }
            }
        }

        Err(RouterError::FallbackExhausted {
            attempted: chain,
            last_error: last_error.unwrap_or_else(|| "no models available".to_string()),
        })
    }

    /// Build an unapproved request for running `agent_id` on `task`.
    pub fn request_agent_execution(
        &self,
        agent_id: &str,
        task: &str,
        options: AgentRequestOptions,
    ) -> Result<ApprovalRequest, RouterError> {
        let agent = self
            .registry
            .agent(agent_id)
            .ok_or_else(|| RouterError::UnknownAgent(agent_id.to_string()))?;

        let request = ApprovalRequest::for_agent(
            agent,
            task,
            options.justification,
            options.requested_by,
            self.clock.now(),
        );

        info!(
            "Approval requested for {} (x{}, ~${:.2}): {}",
            agent.id,
            request.complexity_multiplier,
            request.estimated_cost,
            truncate_str(task, 80)
        );
        Ok(request)
    }

    /// Run an approved agent request. Each request id runs at most once;
    /// a failed or abandoned run releases the id so the same approval can be
    /// retried.
    pub async fn execute_approved_agent_task(
        &self,
        mut request: ApprovalRequest,
        approved: bool,
        approver_id: &str,
    ) -> Result<ChatResponse, RouterError> {
        if !approved {
            return Err(RouterError::NotApproved(request.id));
        }
        let agent = self
            .registry
            .agent(&request.agent_id)
            .ok_or_else(|| RouterError::UnknownAgent(request.agent_id.clone()))?;

        let Some(claim) = self.claim(&request.id) else {
            return Err(RouterError::ApprovalAlreadyConsumed(request.id));
        };

        request.approve(approver_id);
        info!("Executing {} approved by {}", agent.id, approver_id);

        let messages = [
            ChatMessage::system(PromptTemplate::agent_system(agent, &request)),
            ChatMessage::user(request.task.clone()),
        ];
        let chain = self
            .registry
            .most_capable_model()
            .map(|m| self.fallback_chain(&m.id))
            .unwrap_or_default();

        let mut response = self
            .run_chain(chain, &messages, &ChatOptions::default())
            .await?;
        claim.keep();
        response.model = agent.id.clone();
        Ok(response)
    }

    /// Estimated cost of sending `message` to a model or agent.
    pub fn estimate_message_cost(&self, message: &str, model_id: &str) -> Result<f64, RouterError> {
        let cost_per_token = self
            .registry
            .cost_per_token(model_id)
            .ok_or_else(|| RouterError::UnknownModel(model_id.to_string()))?;
        Ok(estimate_cost(message, cost_per_token))
    }

    fn claim(&self, id: &ApprovalId) -> Option<ApprovalClaim<'_>> {
        let inserted = self
            .consumed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone());
        inserted.then(|| ApprovalClaim {
            router: self,
            id: id.clone(),
            kept: false,
        })
    }

    fn release(&self, id: &ApprovalId) {
        self.consumed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
    }
}

/// Claimed approval id. Released on drop unless the run succeeded, which
/// also covers a caller dropping the future mid-run (timeouts, aborts).
struct ApprovalClaim<'a> {
    router: &'a AiRouter,
    id: ApprovalId,
    kept: bool,
}

impl ApprovalClaim<'_> {
    fn keep(mut self) {
        self.kept = true;
    }
}

impl Drop for ApprovalClaim<'_> {
    fn drop(&mut self) {
        if !self.kept {
            self.router.release(&self.id);
        }
    }
}
