//! Shared utilities for use cases.
//!
//! Contains the dependency bundle every agent is built from and helpers for
//! recording agent messages and tracked events.

use crate::config::ExecutionParams;
use crate::ports::event_tracker::{EventTracker, track_event_if_configured};
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::memory_store::{MemoryStore, StoreError};
use crate::use_cases::types::WorkflowError;
use agentflow_domain::{AgentMessage, AgentType, PlanId, SessionId, StepId, ToolCatalog, UserId};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Everything an agent needs besides its session identity.
#[derive(Clone)]
pub struct AgentDeps {
    pub gateway: Arc<dyn LlmGateway>,
    pub store: Arc<dyn MemoryStore>,
    pub tracker: Arc<dyn EventTracker>,
    pub catalog: Arc<ToolCatalog>,
    pub params: ExecutionParams,
    /// Cancelled on shutdown; long-running loops stop between steps.
    pub cancellation: Option<CancellationToken>,
}

/// The session and user an agent acts for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionScope {
    pub session_id: SessionId,
    pub user_id: UserId,
}

impl SessionScope {
    pub fn new(session_id: SessionId, user_id: UserId) -> Self {
        Self {
            session_id,
            user_id,
        }
    }

    /// Record a transcript message from `source`.
    pub(crate) async fn post(
        &self,
        store: &dyn MemoryStore,
        source: AgentType,
        plan_id: &PlanId,
        step_id: Option<&StepId>,
        content: impl Into<String>,
    ) -> Result<(), StoreError> {
        let mut message =
            AgentMessage::new(&self.session_id, &self.user_id, plan_id, source, content);
        if let Some(step_id) = step_id {
            message = message.with_step(step_id);
        }
        store.add_agent_message(&message).await
    }

    /// Track an event, tagging it with the session and user.
    pub(crate) fn track(&self, tracker: &dyn EventTracker, name: &str, mut properties: Value) {
        if let Value::Object(map) = &mut properties {
            map.insert("session_id".into(), Value::String(self.session_id.to_string()));
            map.insert("user_id".into(), Value::String(self.user_id.to_string()));
        }
        track_event_if_configured(tracker, name, properties);
    }
}

/// Check if cancellation has been requested.
///
/// Returns `Err(WorkflowError::Cancelled)` if the token exists and is cancelled.
pub(crate) fn check_cancelled(token: &Option<CancellationToken>) -> Result<(), WorkflowError> {
    if let Some(token) = token
        && token.is_cancelled()
    {
        return Err(WorkflowError::Cancelled);
    }
    Ok(())
}
