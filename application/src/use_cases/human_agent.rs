//! Human agent: records the human's own work on steps assigned to them.

use crate::use_cases::shared::{AgentDeps, SessionScope};
use crate::use_cases::types::WorkflowError;
use agentflow_domain::{
    ActionRequest, ActionResponse, AgentType, HumanFeedback, Step, StepStatus,
};
use serde_json::json;
use tracing::info;

pub struct HumanAgent {
    deps: AgentDeps,
    scope: SessionScope,
}

impl HumanAgent {
    pub fn new(deps: AgentDeps, scope: SessionScope) -> Self {
        Self { deps, scope }
    }

    /// Apply feedback the human gave on a step.
    ///
    /// Approval completes the step with the feedback as its reply; rejection
    /// rejects it. Returns `None` when the step does not exist.
    pub async fn handle_step_feedback(
        &self,
        feedback: &HumanFeedback,
    ) -> Result<Option<Step>, WorkflowError> {
        let store = self.deps.store.as_ref();
        let Some(step_id) = &feedback.step_id else {
            info!("No step id in human feedback for plan {}", feedback.plan_id);
            return Ok(None);
        };
        let Some(mut step) = store
            .get_step(&self.scope.user_id, step_id)
            .await?
            .filter(|s| s.session_id == self.scope.session_id && s.plan_id == feedback.plan_id)
        else {
            info!("No step found with id: {step_id}");
            return Ok(None);
        };

        let mut changed = step
            .apply_feedback(Some(feedback.approved), feedback.human_feedback.clone())?
            .is_applied();
        if feedback.approved && !step.is_terminal() {
            let reply = feedback
                .human_feedback
                .clone()
                .unwrap_or_else(|| "Approved by human".to_string());
            changed |= step.complete(reply)?.is_applied();
        }
        if !changed {
            return Ok(Some(step));
        }
        store.update_step(&step).await?;

        self.scope
            .post(
                store,
                AgentType::Human,
                &step.plan_id,
                Some(&step.id),
                format!("Received feedback for step: {}", step.effective_action()),
            )
            .await?;
        self.scope.track(
            self.deps.tracker.as_ref(),
            "Human Agent - Received feedback for step and added into the store",
            json!({
                "step_id": step.id.as_str(),
                "approved": feedback.approved,
                "status": step.status.as_str(),
            }),
        );
        Ok(Some(step))
    }

    /// A human-owned step reached execution: the human's approval already
    /// is the work, so the step completes with their feedback.
    pub async fn handle_action_request(
        &self,
        request: &ActionRequest,
    ) -> Result<ActionResponse, WorkflowError> {
        let store = self.deps.store.as_ref();
        let Some(mut step) = store.get_step(&self.scope.user_id, &request.step_id).await? else {
            info!("No step found with id: {}", request.step_id);
            return Ok(ActionResponse::for_request(
                request,
                format!("Step {} not found", request.step_id),
                StepStatus::Failed,
            ));
        };

        let reply = step
            .human_feedback
            .clone()
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| "Approved by human".to_string());
        if step.complete(reply.clone())?.is_applied() {
            store.update_step(&step).await?;
            self.scope
                .post(
                    store,
                    AgentType::Human,
                    &step.plan_id,
                    Some(&step.id),
                    format!("Completed step: {}", step.effective_action()),
                )
                .await?;
        }
        Ok(ActionResponse::for_request(
            request,
            step.agent_reply.clone().unwrap_or(reply),
            StepStatus::Completed,
        ))
    }
}
