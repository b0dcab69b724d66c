//! Messages exchanged between the API, the group chat manager and agents.

use crate::agent::agent_type::AgentType;
use crate::plan::entities::StepStatus;
use crate::plan::value_objects::{PlanId, SessionId, StepId};
use serde::{Deserialize, Serialize};

/// A new task submitted by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputTask {
    /// Existing session to attach to; a new one is created when absent.
    #[serde(default)]
    pub session_id: Option<SessionId>,
    pub description: String,
}

/// Human approval (or rejection) of one step, or of every step when
/// `step_id` is absent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanFeedback {
    #[serde(default)]
    pub step_id: Option<StepId>,
    pub plan_id: PlanId,
    pub session_id: SessionId,
    pub approved: bool,
    #[serde(default)]
    pub human_feedback: Option<String>,
    #[serde(default)]
    pub updated_action: Option<String>,
}

/// The human's answer to the planner's clarification request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanClarification {
    pub plan_id: PlanId,
    pub session_id: SessionId,
    pub human_clarification: String,
}

/// Request from the group chat manager to the agent owning a step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub step_id: StepId,
    pub plan_id: PlanId,
    pub session_id: SessionId,
    pub action: String,
    pub agent: AgentType,
}

/// An agent's answer to an [`ActionRequest`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub step_id: StepId,
    pub plan_id: PlanId,
    pub session_id: SessionId,
    pub result: String,
    pub status: StepStatus,
}

impl ActionResponse {
    pub fn for_request(request: &ActionRequest, result: impl Into<String>, status: StepStatus) -> Self {
        Self {
            step_id: request.step_id.clone(),
            plan_id: request.plan_id.clone(),
            session_id: request.session_id.clone(),
            result: result.into(),
            status,
        }
    }
}
