//! Group chat manager: applies human approval to steps and dispatches
//! approved steps to the agent that owns them.
//!
//! ```text
//! approve_step_or_steps
//!        │
//!        ▼
//! ┌──────────────────┐  approved   ┌──────────────┐  ActionRequest  ┌──────────────┐
//! │update_step_status│────────────▶│ execute_step │────────────────▶│ owning agent │
//! └──────────────────┘             └──────────────┘                 └──────┬───────┘
//!        │ rejected                        ▲                               │
//!        ▼                                 └──── ActionResponse ───────────┘
//!    (terminal)
//! ```
//!
//! After each dispatch the plan is marked completed once every step is
//! terminal.

use crate::use_cases::human_agent::HumanAgent;
use crate::use_cases::planner::PlannerAgent;
use crate::use_cases::domain_agent::DomainAgent;
use crate::use_cases::shared::{AgentDeps, SessionScope, check_cancelled};
use crate::use_cases::types::WorkflowError;
use agentflow_domain::{
    ActionPrompt, ActionRequest, ActionResponse, AgentType, HumanFeedback, InputTask, Plan,
    Step, StepStatus, StepTransition,
};
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct GroupChatManager {
    deps: AgentDeps,
    scope: SessionScope,
    planner: Arc<PlannerAgent>,
    human: Arc<HumanAgent>,
    agents: HashMap<AgentType, Arc<DomainAgent>>,
}

impl GroupChatManager {
    pub fn new(
        deps: AgentDeps,
        scope: SessionScope,
        planner: Arc<PlannerAgent>,
        human: Arc<HumanAgent>,
        agents: impl IntoIterator<Item = Arc<DomainAgent>>,
    ) -> Self {
        Self {
            deps,
            scope,
            planner,
            human,
            agents: agents.into_iter().map(|a| (a.agent_type(), a)).collect(),
        }
    }

    pub async fn handle_input_task(&self, task: &InputTask) -> Result<Plan, WorkflowError> {
        self.planner.handle_input_task(task).await
    }

    /// Apply a human decision to one step (or every open step when no step
    /// id is given) and execute the steps it approves, in plan order.
    ///
    /// A plan that belongs to another session is reported as not found.
    ///
    /// Returns the plan's steps after processing.
    pub async fn handle_human_feedback(
        &self,
        feedback: &HumanFeedback,
    ) -> Result<Vec<Step>, WorkflowError> {
        let store = self.deps.store.as_ref();
        let user = &self.scope.user_id;
        let mut plan = store
            .get_plan(user, &feedback.plan_id)
            .await?
            .filter(|p| p.session_id == self.scope.session_id)
            .ok_or_else(|| WorkflowError::PlanNotFound(feedback.plan_id.to_string()))?;
        let steps = store.get_steps_by_plan(user, &plan.id).await?;

        let targets: Vec<Step> = match &feedback.step_id {
            Some(id) => {
                let step = steps
                    .iter()
                    .find(|s| &s.id == id)
                    .cloned()
                    .ok_or_else(|| WorkflowError::StepNotFound(id.to_string()))?;
                vec![step]
            }
            // A step still in `action_requested` is already with its agent.
            None => steps
                .iter()
                .filter(|s| !s.is_terminal() && s.status != StepStatus::ActionRequested)
                .cloned()
                .collect(),
        };

        let feedback_text = self.compose_feedback(feedback, &plan);
        for mut step in targets {
            check_cancelled(&self.deps.cancellation)?;

            if let Some(action) = &feedback.updated_action
                && !step.is_terminal()
            {
                step.updated_action = Some(action.clone());
            }
            self.update_step_status(&mut step, Some(feedback.approved), Some(feedback_text.clone()))
                .await?;
            if step.status == StepStatus::Approved {
                self.execute_step(&plan, &mut step).await?;
            }
        }

        let steps = store.get_steps_by_plan(user, &plan.id).await?;
        if plan.refresh_status(&steps) {
            store.update_plan(&plan).await?;
            info!("Plan {} completed", plan.id);
        }
        Ok(steps)
    }

    /// Record the human's decision on the step.
    ///
    /// `Some(true)` approves, `Some(false)` rejects, `None` only records the
    /// feedback. The step is persisted only if it changed.
    pub async fn update_step_status(
        &self,
        step: &mut Step,
        approved: Option<bool>,
        feedback: Option<String>,
    ) -> Result<StepTransition, WorkflowError> {
        let transition = step.apply_feedback(approved, feedback)?;
        if transition.is_applied() {
            self.deps.store.update_step(step).await?;
            self.scope.track(
                self.deps.tracker.as_ref(),
                "Group Chat Manager - Received human feedback, Updating step and updated into the store",
                json!({
                    "step_id": step.id.as_str(),
                    "status": step.status.as_str(),
                    "human_approval_status": step.human_approval_status.as_str(),
                }),
            );
        } else {
            debug!("Step {} unchanged by feedback ({})", step.id, step.status);
        }
        Ok(transition)
    }

    /// Send the step to its owning agent with the plan's history so far.
    pub async fn execute_step(
        &self,
        plan: &Plan,
        step: &mut Step,
    ) -> Result<ActionResponse, WorkflowError> {
        let store = self.deps.store.as_ref();
        if step.request_action()? == StepTransition::Unchanged {
            info!("Step {} already dispatched", step.id);
            return Ok(ActionResponse {
                step_id: step.id.clone(),
                plan_id: step.plan_id.clone(),
                session_id: step.session_id.clone(),
                result: String::new(),
                status: step.status,
            });
        }
        store.update_step(step).await?;
        self.scope.track(
            self.deps.tracker.as_ref(),
            "Group Chat Manager - Update step to action_requested and updated into the store",
            json!({ "step_id": step.id.as_str(), "agent": step.agent.as_str() }),
        );

        let steps = store.get_steps_by_plan(&self.scope.user_id, &plan.id).await?;
        let summary = plan.summary.as_deref().unwrap_or(&plan.initial_goal);
        let request = ActionRequest {
            step_id: step.id.clone(),
            plan_id: plan.id.clone(),
            session_id: self.scope.session_id.clone(),
            action: ActionPrompt::with_history(summary, &steps, step),
            agent: step.agent,
        };

        self.scope
            .post(
                store,
                AgentType::GroupChatManager,
                &plan.id,
                Some(&step.id),
                format!(
                    "Requesting {} to perform action: {}",
                    step.agent,
                    step.effective_action()
                ),
            )
            .await?;

        let response = if step.agent.is_human() {
            self.human.handle_action_request(&request).await?
        } else if let Some(agent) = self.agents.get(&step.agent) {
            agent.handle_action_request(&request).await?
        } else {
            warn!("No agent registered for {}", step.agent);
            let reason = format!("No agent available for {}", step.agent);
            step.fail(reason.clone());
            store.update_step(step).await?;
            ActionResponse::for_request(&request, reason, StepStatus::Failed)
        };

        if let Some(latest) = store.get_step(&self.scope.user_id, &step.id).await? {
            *step = latest;
        }
        Ok(response)
    }

    fn compose_feedback(&self, feedback: &HumanFeedback, plan: &Plan) -> String {
        let date = Utc::now().format("%Y-%m-%d");
        let mut text = format!(
            "{} Today's date is {date}.",
            feedback.human_feedback.as_deref().unwrap_or_default()
        );
        if let Some(clarification) = &plan.human_clarification_response {
            text.push(' ');
            text.push_str(clarification);
        }
        text.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::llm_gateway::{ChatResponse, GatewayError};
    use crate::ports::memory_store::MemoryStore;
    use crate::use_cases::chat_context::BufferedChatContext;
    use crate::use_cases::test_support::{Harness, plan_response};
    use agentflow_domain::{PlanStatus, SessionId, UserId};

    fn manager(h: &Harness) -> GroupChatManager {
        manager_for(h, "s1")
    }

    fn manager_for(h: &Harness, session: &str) -> GroupChatManager {
        let scope = SessionScope::new(SessionId::new(session), UserId::new("u1"));
        let context = Arc::new(BufferedChatContext::new(h.deps.store.clone(), scope.clone(), 10));
        let planner = Arc::new(PlannerAgent::new(h.deps.clone(), scope.clone(), context.clone()));
        let human = Arc::new(HumanAgent::new(h.deps.clone(), scope.clone()));
        let agents = AgentType::ALL
            .into_iter()
            .filter(AgentType::is_domain_agent)
            .map(|a| Arc::new(DomainAgent::new(a, h.deps.clone(), scope.clone(), context.clone())));
        GroupChatManager::new(h.deps.clone(), scope.clone(), planner, human, agents)
    }

    async fn plan(gcm: &GroupChatManager) -> Plan {
        gcm.handle_input_task(&InputTask {
            session_id: Some(SessionId::new("s1")),
            description: "Onboard Jessica".into(),
        })
        .await
        .unwrap()
    }

    fn approve(plan: &Plan, step: Option<&Step>, approved: bool) -> HumanFeedback {
        HumanFeedback {
            step_id: step.map(|s| s.id.clone()),
            plan_id: plan.id.clone(),
            session_id: SessionId::new("s1"),
            approved,
            human_feedback: Some("ok".into()),
            updated_action: None,
        }
    }

    async fn steps(h: &Harness, plan: &Plan) -> Vec<Step> {
        h.store.get_steps_by_plan(&UserId::new("u1"), &plan.id).await.unwrap()
    }

    #[tokio::test]
    async fn test_approve_single_step_executes_it() {
        let h = Harness::new([
            Ok(plan_response(&[
                ("Create an email account", "Hr_Agent"),
                ("Order a laptop", "Procurement_Agent"),
            ])),
            Ok(ChatResponse::text("Email created")),
        ]);
        let gcm = manager(&h);
        let plan = plan(&gcm).await;
        let before = steps(&h, &plan).await;

        let after = gcm
            .handle_human_feedback(&approve(&plan, Some(&before[0]), true))
            .await
            .unwrap();
        assert_eq!(after[0].status, StepStatus::Completed);
        assert_eq!(after[0].agent_reply.as_deref(), Some("Email created"));
        assert!(after[0].human_feedback.as_deref().unwrap().starts_with("ok Today's date is "));
        assert_eq!(after[1].status, StepStatus::Planned);

        let texts = h.store.agent_message_texts();
        assert!(texts.contains(&"Requesting Hr_Agent to perform action: Create an email account".to_string()));

        let plan_now = h.store.get_plan(&UserId::new("u1"), &plan.id).await.unwrap().unwrap();
        assert_eq!(plan_now.overall_status, PlanStatus::InProgress);
    }

    #[tokio::test]
    async fn test_approve_all_runs_in_order_and_completes_plan() {
        let h = Harness::new([
            Ok(plan_response(&[
                ("Create an email account", "Hr_Agent"),
                ("Confirm start date", "Human_Agent"),
                ("Order a laptop", "Procurement_Agent"),
            ])),
            Ok(ChatResponse::text("Email created")),
            Ok(ChatResponse::text("Laptop ordered")),
        ]);
        let gcm = manager(&h);
        let plan = plan(&gcm).await;

        let after = gcm.handle_human_feedback(&approve(&plan, None, true)).await.unwrap();
        assert!(after.iter().all(|s| s.status == StepStatus::Completed));

        // The third step's action carries the replies of the first two.
        let requests = h.gateway.requests.lock().unwrap();
        let last = requests.last().unwrap();
        let user_text = last
            .messages
            .iter()
            .rev()
            .find_map(|m| match m {
                crate::ports::llm_gateway::LlmMessage::Chat(c) => Some(c.content.clone()),
                _ => None,
            })
            .unwrap();
        assert!(user_text.contains("Step 0\nGroup_Chat_Manager: Create an email account\nHr_Agent: Email created\n"));
        assert!(user_text.contains("Step 1\nGroup_Chat_Manager: Confirm start date\nHuman_Agent: ok Today's date is "));
        drop(requests);

        let plan_now = h.store.get_plan(&UserId::new("u1"), &plan.id).await.unwrap().unwrap();
        assert_eq!(plan_now.overall_status, PlanStatus::Completed);
    }

    #[tokio::test]
    async fn test_reject_does_not_dispatch() {
        let h = Harness::new([Ok(plan_response(&[("Create an email account", "Hr_Agent")]))]);
        let gcm = manager(&h);
        let plan = plan(&gcm).await;

        let after = gcm.handle_human_feedback(&approve(&plan, None, false)).await.unwrap();
        assert_eq!(after[0].status, StepStatus::Rejected);
        assert_eq!(h.gateway.request_count(), 1);

        let plan_now = h.store.get_plan(&UserId::new("u1"), &plan.id).await.unwrap().unwrap();
        assert_eq!(plan_now.overall_status, PlanStatus::Completed);
    }

    #[tokio::test]
    async fn test_replayed_approval_does_not_execute_twice() {
        let h = Harness::new([
            Ok(plan_response(&[("Create an email account", "Hr_Agent")])),
            Ok(ChatResponse::text("Email created")),
        ]);
        let gcm = manager(&h);
        let plan = plan(&gcm).await;
        let first = steps(&h, &plan).await;

        gcm.handle_human_feedback(&approve(&plan, Some(&first[0]), true)).await.unwrap();
        let again = gcm
            .handle_human_feedback(&approve(&plan, Some(&first[0]), true))
            .await
            .unwrap();
        assert_eq!(again[0].agent_reply.as_deref(), Some("Email created"));
        assert_eq!(h.gateway.request_count(), 2);
    }

    #[tokio::test]
    async fn test_updated_action_is_used() {
        let h = Harness::new([
            Ok(plan_response(&[("Create an email account", "Hr_Agent")])),
            Ok(ChatResponse::text("Slack created")),
        ]);
        let gcm = manager(&h);
        let plan = plan(&gcm).await;
        let mut fb = approve(&plan, None, true);
        fb.updated_action = Some("Create a Slack account".into());

        let after = gcm.handle_human_feedback(&fb).await.unwrap();
        assert_eq!(after[0].updated_action.as_deref(), Some("Create a Slack account"));
        assert!(
            h.store
                .agent_message_texts()
                .contains(&"Requesting Hr_Agent to perform action: Create a Slack account".to_string())
        );
    }

    #[tokio::test]
    async fn test_agent_failure_marks_step_failed() {
        let h = Harness::new([
            Ok(plan_response(&[("Create an email account", "Hr_Agent")])),
            Err(GatewayError::InvalidResponse("bad".into())),
        ]);
        let gcm = manager(&h);
        let plan = plan(&gcm).await;
        let after = gcm.handle_human_feedback(&approve(&plan, None, true)).await.unwrap();
        assert_eq!(after[0].status, StepStatus::Failed);
    }

    #[tokio::test]
    async fn test_unknown_plan_and_step() {
        let h = Harness::new([Ok(plan_response(&[("a", "Hr_Agent")]))]);
        let gcm = manager(&h);
        let plan = plan(&gcm).await;

        let mut fb = approve(&plan, None, true);
        fb.plan_id = "missing".into();
        assert!(matches!(
            gcm.handle_human_feedback(&fb).await.unwrap_err(),
            WorkflowError::PlanNotFound(_)
        ));

        let mut fb = approve(&plan, None, true);
        fb.step_id = Some("missing".into());
        assert!(matches!(
            gcm.handle_human_feedback(&fb).await.unwrap_err(),
            WorkflowError::StepNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_update_step_status_without_decision() {
        let h = Harness::new([Ok(plan_response(&[("a", "Hr_Agent")]))]);
        let gcm = manager(&h);
        let plan = plan(&gcm).await;
        let mut step = steps(&h, &plan).await.remove(0);

        let t = gcm
            .update_step_status(&mut step, None, Some("note".into()))
            .await
            .unwrap();
        assert!(t.is_applied());
        assert_eq!(step.status, StepStatus::Planned);
        assert_eq!(step.human_feedback.as_deref(), Some("note"));
    }

    #[tokio::test]
    async fn test_reject_all_skips_step_already_with_its_agent() {
        let h = Harness::new([Ok(plan_response(&[
            ("Create an email account", "Hr_Agent"),
            ("Order a laptop", "Procurement_Agent"),
        ]))]);
        let gcm = manager(&h);
        let plan = plan(&gcm).await;
        let mut in_flight = steps(&h, &plan).await.remove(1);
        in_flight.request_action().unwrap();
        h.store.update_step(&in_flight).await.unwrap();

        let after = gcm.handle_human_feedback(&approve(&plan, None, false)).await.unwrap();
        assert_eq!(after[0].status, StepStatus::Rejected);
        assert_eq!(after[1].status, StepStatus::ActionRequested);
        assert_eq!(h.gateway.request_count(), 1);
    }

    #[tokio::test]
    async fn test_plan_of_another_session_is_not_found() {
        let h = Harness::new([Ok(plan_response(&[("Create an email account", "Hr_Agent")]))]);
        let plan = plan(&manager(&h)).await;

        let other = manager_for(&h, "s2");
        let mut fb = approve(&plan, None, true);
        fb.session_id = SessionId::new("s2");
        assert!(matches!(
            other.handle_human_feedback(&fb).await.unwrap_err(),
            WorkflowError::PlanNotFound(_)
        ));

        let stored = steps(&h, &plan).await;
        assert_eq!(stored[0].status, StepStatus::Planned);
        assert_eq!(h.gateway.request_count(), 1);
    }
}
