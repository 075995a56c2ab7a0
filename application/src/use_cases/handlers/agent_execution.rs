//! `agent_execution` task handler.
//!
//! Runs a previously approved agent request carried in the payload and
//! publishes an [`AgentExecutionRecord`] for every run that reached a model.

use crate::ports::clock::{Clock, SystemClock};
use crate::ports::queue_event::QueueEvent;
use crate::ports::task_handler::{HandlerError, TaskContext, TaskHandler};
use crate::use_cases::ai_router::AiRouter;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use taskpilot_domain::{AgentExecutionRecord, ApprovalRequest, TaskType};
use tracing::info;

#[derive(Debug, Deserialize)]
struct AgentPayload {
    approval: ApprovalRequest,
    approved: bool,
    approver_id: String,
}

pub struct AgentExecutionHandler {
    router: Arc<AiRouter>,
    clock: Arc<dyn Clock>,
}

impl AgentExecutionHandler {
    pub fn new(router: Arc<AiRouter>) -> Self {
        Self {
            router,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

#[async_trait]
impl TaskHandler for AgentExecutionHandler {
    fn task_type(&self) -> TaskType {
        TaskType::AgentExecution
    }

    async fn handle(&self, ctx: TaskContext) -> Result<Value, HandlerError> {
        let payload: AgentPayload = serde_json::from_value(ctx.payload.clone()).map_err(|e| {
            HandlerError::permanent(format!("invalid agent_execution payload: {}", e))
        })?;
        ctx.progress.report(10);

        let approval_id = payload.approval.id.clone();
        let agent_id = payload.approval.agent_id.clone();
        ctx.progress.report(30);

        let started_at = self.clock.now();
        let outcome = self
            .router
            .execute_approved_agent_task(payload.approval, payload.approved, &payload.approver_id)
            .await;
        ctx.progress.report(80);

        let reached_model = match &outcome {
            Ok(_) => true,
            Err(e) => !e.is_validation(),
        };
        if reached_model {
            let record = AgentExecutionRecord {
                id: format!("{}-{}", ctx.task_id, ctx.attempt),
                task_id: Some(ctx.task_id.clone()),
                approval_id,
                agent_id: agent_id.clone(),
                approver_id: payload.approver_id,
                success: outcome.is_ok(),
                response: outcome.as_ref().ok().map(|r| r.content.clone()),
                error: outcome.as_ref().err().map(|e| e.to_string()),
                started_at,
                finished_at: self.clock.now(),
            };
            ctx.events.publish(QueueEvent::AgentExecuted {
                owner_id: ctx.owner_id.clone(),
                record: Box::new(record),
            });
        }

        let response = outcome?;
        info!("Agent {} finished task {}", agent_id, ctx.task_id);
        let result = serde_json::to_value(&response)
            .map_err(|e| HandlerError::permanent(format!("unserializable response: {}", e)))?;
        ctx.progress.report(100);
        Ok(result)
    }
}
