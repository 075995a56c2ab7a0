//! `system_maintenance` task handler.
//!
//! Operations:
//! - `health_check`: sends a one-line ping through the router and reports
//!   which model answered.
//! - `routing_audit`: lists every model's fallback chain without any model
//!   calls.

use crate::ports::task_handler::{HandlerError, TaskContext, TaskHandler};
use crate::use_cases::ai_router::AiRouter;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use taskpilot_domain::{ChatMessage, ChatOptions, TaskType};
use tracing::{info, warn};

const PING: &str = "Reply with the single word: pong";

#[derive(Debug, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
enum MaintenanceOperation {
    HealthCheck {
        #[serde(default)]
        model: Option<String>,
    },
    RoutingAudit,
}

pub struct SystemMaintenanceHandler {
    router: Arc<AiRouter>,
}

impl SystemMaintenanceHandler {
    pub fn new(router: Arc<AiRouter>) -> Self {
        Self { router }
    }

    async fn health_check(&self, model: Option<String>) -> Result<Value, HandlerError> {
        let model = model.unwrap_or_else(|| self.router.config().analysis_model.clone());
        let options = ChatOptions {
            max_tokens: Some(5),
            ..Default::default()
        };
        let response = self
            .router
            .chat_completion(&[ChatMessage::user(PING)], &model, &options)
            .await?;
        if response.fallback_used {
            warn!("Health check for {} was served by {}", model, response.model);
        }
        Ok(json!({
            "operation": "health_check",
            "requested_model": model,
            "served_by": response.model,
            "fallback_used": response.fallback_used,
            "fallback_reason": response.fallback_reason,
            "latency_ms": response.processing_time.as_millis() as u64,
        }))
    }

    fn routing_audit(&self) -> Value {
        let registry = self.router.registry();
        let chains: serde_json::Map<String, Value> = registry
            .models()
            .iter()
            .map(|m| (m.id.clone(), json!(self.router.fallback_chain(&m.id))))
            .collect();
        json!({
            "operation": "routing_audit",
            "models": registry.models().len(),
            "agents": registry.agents().len(),
            "analysis_model": self.router.config().analysis_model,
            "fallback_chains": chains,
        })
    }
}

#[async_trait]
impl TaskHandler for SystemMaintenanceHandler {
    fn task_type(&self) -> TaskType {
        TaskType::SystemMaintenance
    }

    async fn handle(&self, ctx: TaskContext) -> Result<Value, HandlerError> {
        let operation: MaintenanceOperation =
            serde_json::from_value(ctx.payload.clone()).map_err(|e| {
                HandlerError::permanent(format!("invalid system_maintenance payload: {}", e))
            })?;
        ctx.progress.report(10);

        let result = match operation {
            MaintenanceOperation::HealthCheck { model } => self.health_check(model).await?,
            MaintenanceOperation::RoutingAudit => self.routing_audit(),
        };
        info!(
            "Maintenance task {} finished {}",
            ctx.task_id,
            result["operation"].as_str().unwrap_or_default()
        );
        ctx.progress.report(90);
        Ok(result)
    }
}
