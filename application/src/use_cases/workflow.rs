//! Workflow service: the operations the HTTP API exposes.
//!
//! Each mutating operation resolves the caller's session through the
//! [`SessionRuntime`] and runs under that session's lock. Reads go straight
//! to the store.

use crate::ports::content_safety::ContentSafety;
use crate::ports::event_tracker::track_event_if_configured;
use crate::use_cases::session_runtime::SessionRuntime;
use crate::use_cases::shared::AgentDeps;
use crate::use_cases::types::WorkflowError;
use agentflow_domain::{
    AgentMessage, HumanClarification, HumanFeedback, InputTask, PlanId, PlanWithSteps, Session,
    SessionId, Step, StepId, ToolSummary, UserId,
};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, warn};

/// Answer to a submitted task
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskAccepted {
    pub status: String,
    pub session_id: SessionId,
    pub plan_id: PlanId,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackAccepted {
    pub status: String,
    pub session_id: SessionId,
    pub step_id: Option<StepId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClarificationAccepted {
    pub status: String,
    pub session_id: SessionId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApprovalResult {
    pub status: String,
    pub steps: Vec<Step>,
}

pub struct WorkflowService {
    runtime: Arc<SessionRuntime>,
    safety: Arc<dyn ContentSafety>,
}

impl WorkflowService {
    pub fn new(runtime: Arc<SessionRuntime>, safety: Arc<dyn ContentSafety>) -> Self {
        Self { runtime, safety }
    }

    pub fn runtime(&self) -> &Arc<SessionRuntime> {
        &self.runtime
    }

    fn deps(&self) -> &AgentDeps {
        self.runtime.deps()
    }

    fn require_user(user_id: &UserId) -> Result<(), WorkflowError> {
        if user_id.is_empty() {
            return Err(WorkflowError::MissingUser);
        }
        Ok(())
    }

    /// Screen the task, attach it to a session and have the planner build a
    /// plan for it.
    pub async fn submit_task(
        &self,
        user_id: &UserId,
        task: InputTask,
    ) -> Result<TaskAccepted, WorkflowError> {
        Self::require_user(user_id)?;
        if !self.safety.is_safe(&task.description).await {
            warn!("Task rejected by the content safety check");
            track_event_if_configured(
                self.deps().tracker.as_ref(),
                "RAI failed",
                json!({ "status": "Plan not created", "description": task.description }),
            );
            return Err(WorkflowError::UnsafeContent);
        }

        let agents = self
            .runtime
            .initialize_runtime_and_context(task.session_id.clone(), user_id)
            .await?;
        let _guard = agents.lock().await;
        let session_id = agents.scope.session_id.clone();

        let store = self.deps().store.as_ref();
        if store.get_session(user_id, &session_id).await?.is_none() {
            store
                .add_session(&Session::new(session_id.clone(), user_id.clone()))
                .await?;
        }

        let task = InputTask {
            session_id: Some(session_id.clone()),
            description: task.description,
        };
        let plan = agents.group_chat_manager.handle_input_task(&task).await?;

        let status = if plan.is_failed() {
            format!("Plan not created for session {session_id}")
        } else {
            format!("Plan created with ID: {}", plan.id)
        };
        track_event_if_configured(
            self.deps().tracker.as_ref(),
            "Input task",
            json!({
                "session_id": session_id.as_str(),
                "plan_id": plan.id.as_str(),
                "description": task.description,
                "status": status,
            }),
        );
        info!("{status}");
        Ok(TaskAccepted {
            status,
            session_id,
            plan_id: plan.id,
            description: task.description,
        })
    }

    /// Human feedback on a step.
    ///
    /// Feedback on a step the human owns is recorded by the human agent;
    /// anything else goes through the group chat manager, which executes
    /// approved steps.
    pub async fn submit_feedback(
        &self,
        user_id: &UserId,
        feedback: HumanFeedback,
    ) -> Result<FeedbackAccepted, WorkflowError> {
        let session_id = feedback.session_id.clone();
        self.runtime
            .with_session(&session_id, user_id, |agents| async move {
                let store = self.deps().store.as_ref();
                let owned_by_human = match &feedback.step_id {
                    Some(id) => store
                        .get_step(user_id, id)
                        .await?
                        .is_none_or(|s| s.agent.is_human()),
                    None => false,
                };
                if owned_by_human {
                    agents.human.handle_step_feedback(&feedback).await?;
                    self.refresh_plan(user_id, &feedback.session_id, &feedback.plan_id)
                        .await?;
                } else {
                    agents.group_chat_manager.handle_human_feedback(&feedback).await?;
                }
                track_event_if_configured(
                    self.deps().tracker.as_ref(),
                    "Completed Feedback received",
                    json!({
                        "session_id": feedback.session_id.as_str(),
                        "step_id": feedback.step_id.as_ref().map(StepId::as_str),
                        "approved": feedback.approved,
                    }),
                );
                Ok(FeedbackAccepted {
                    status: "Feedback received".to_string(),
                    session_id: feedback.session_id.clone(),
                    step_id: feedback.step_id.clone(),
                })
            })
            .await
    }

    pub async fn submit_clarification(
        &self,
        user_id: &UserId,
        clarification: HumanClarification,
    ) -> Result<ClarificationAccepted, WorkflowError> {
        let session_id = clarification.session_id.clone();
        self.runtime
            .with_session(&session_id, user_id, |agents| async move {
                agents.planner.handle_plan_clarification(&clarification).await?;
                track_event_if_configured(
                    self.deps().tracker.as_ref(),
                    "Completed Human clarification on the plan",
                    json!({
                        "session_id": clarification.session_id.as_str(),
                        "plan_id": clarification.plan_id.as_str(),
                    }),
                );
                Ok(ClarificationAccepted {
                    status: "Clarification received".to_string(),
                    session_id: clarification.session_id.clone(),
                })
            })
            .await
    }

    /// Approve or reject one step, or every open step when no step id is
    /// given, and run what was approved.
    pub async fn approve_steps(
        &self,
        user_id: &UserId,
        feedback: HumanFeedback,
    ) -> Result<ApprovalResult, WorkflowError> {
        let session_id = feedback.session_id.clone();
        self.runtime
            .with_session(&session_id, user_id, |agents| async move {
                let steps = agents
                    .group_chat_manager
                    .handle_human_feedback(&feedback)
                    .await?;
                let status = match &feedback.step_id {
                    Some(id) => format!("Step {id} - Approval:{}.", feedback.approved),
                    None => "All steps approved".to_string(),
                };
                track_event_if_configured(
                    self.deps().tracker.as_ref(),
                    "Completed Human feedback on steps",
                    json!({
                        "session_id": feedback.session_id.as_str(),
                        "plan_id": feedback.plan_id.as_str(),
                        "status": status,
                    }),
                );
                Ok(ApprovalResult { status, steps })
            })
            .await
    }

    /// Plans of the user (or the session's plan) with their steps.
    pub async fn list_plans(
        &self,
        user_id: &UserId,
        session_id: Option<&SessionId>,
    ) -> Result<Vec<PlanWithSteps>, WorkflowError> {
        Self::require_user(user_id)?;
        let store = self.deps().store.as_ref();
        let plans = match session_id {
            Some(session_id) => store
                .get_plan_by_session(user_id, session_id)
                .await?
                .into_iter()
                .collect(),
            None => store.get_all_plans(user_id).await?,
        };

        let mut result = Vec::with_capacity(plans.len());
        for plan in plans {
            let steps = store.get_steps_by_plan(user_id, &plan.id).await?;
            result.push(PlanWithSteps::new(plan, steps));
        }
        Ok(result)
    }

    pub async fn list_steps(
        &self,
        user_id: &UserId,
        plan_id: &PlanId,
    ) -> Result<Vec<Step>, WorkflowError> {
        Self::require_user(user_id)?;
        Ok(self.deps().store.get_steps_by_plan(user_id, plan_id).await?)
    }

    pub async fn list_agent_messages(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
    ) -> Result<Vec<AgentMessage>, WorkflowError> {
        Self::require_user(user_id)?;
        Ok(self
            .deps()
            .store
            .get_agent_messages_by_session(user_id, session_id)
            .await?)
    }

    /// Delete everything stored for the user and drop their cached sessions.
    pub async fn delete_all(&self, user_id: &UserId) -> Result<u64, WorkflowError> {
        Self::require_user(user_id)?;
        let deleted = self.deps().store.delete_all_items(user_id).await?;
        let evicted = self.runtime.evict_user(user_id).await;
        info!("Deleted {deleted} items and {evicted} sessions for user {user_id}");
        Ok(deleted)
    }

    pub async fn list_all_items(&self, user_id: &UserId) -> Result<Vec<Value>, WorkflowError> {
        Self::require_user(user_id)?;
        Ok(self.deps().store.get_all_items(user_id).await?)
    }

    pub fn agent_tools(&self) -> Vec<ToolSummary> {
        self.deps().catalog.summaries()
    }

    async fn refresh_plan(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
        plan_id: &PlanId,
    ) -> Result<(), WorkflowError> {
        let store = self.deps().store.as_ref();
        let Some(mut plan) = store
            .get_plan(user_id, plan_id)
            .await?
            .filter(|p| &p.session_id == session_id)
        else {
            return Ok(());
        };
        let steps = store.get_steps_by_plan(user_id, plan_id).await?;
        if plan.refresh_status(&steps) {
            store.update_plan(&plan).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::content_safety::AllowAllContent;
    use crate::ports::llm_gateway::ChatResponse;
    use crate::ports::memory_store::MemoryStore;
    use crate::use_cases::test_support::{Harness, plan_response};
    use agentflow_domain::{PlanStatus, StepStatus};
    use async_trait::async_trait;

    struct RejectAll;

    #[async_trait]
    impl ContentSafety for RejectAll {
        async fn is_safe(&self, _text: &str) -> bool {
            false
        }
    }

    fn service(h: &Harness) -> WorkflowService {
        WorkflowService::new(
            Arc::new(SessionRuntime::new(h.deps.clone())),
            Arc::new(AllowAllContent),
        )
    }

    fn task(session: Option<&str>) -> InputTask {
        InputTask {
            session_id: session.map(SessionId::new),
            description: "Onboard Jessica".into(),
        }
    }

    #[tokio::test]
    async fn test_submit_task_creates_session_and_plan() {
        let h = Harness::new([Ok(plan_response(&[("Create an email account", "Hr_Agent")]))]);
        let svc = service(&h);
        let user = UserId::new("u1");

        let accepted = svc.submit_task(&user, task(None)).await.unwrap();
        assert_eq!(accepted.status, format!("Plan created with ID: {}", accepted.plan_id));
        assert!(!accepted.session_id.is_empty());
        assert!(
            h.store
                .get_session(&user, &accepted.session_id)
                .await
                .unwrap()
                .is_some()
        );

        let plans = svc.list_plans(&user, Some(&accepted.session_id)).await.unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].total_steps, 1);
        assert_eq!(plans[0].planned, 1);
    }

    #[tokio::test]
    async fn test_submit_task_rejected_by_safety_check() {
        let h = Harness::new([]);
        let svc = WorkflowService::new(
            Arc::new(SessionRuntime::new(h.deps.clone())),
            Arc::new(RejectAll),
        );
        let err = svc.submit_task(&UserId::new("u1"), task(None)).await.unwrap_err();
        assert!(matches!(err, WorkflowError::UnsafeContent));
        assert_eq!(h.gateway.request_count(), 0);
        assert!(h.tracker.names().contains(&"RAI failed".to_string()));
    }

    #[tokio::test]
    async fn test_missing_user() {
        let h = Harness::new([]);
        let svc = service(&h);
        let user = UserId::new("");
        assert!(matches!(
            svc.submit_task(&user, task(None)).await.unwrap_err(),
            WorkflowError::MissingUser
        ));
        assert!(matches!(
            svc.list_plans(&user, None).await.unwrap_err(),
            WorkflowError::MissingUser
        ));
    }

    #[tokio::test]
    async fn test_failed_plan_status() {
        let h = Harness::new([Ok(ChatResponse::text("no plan here"))]);
        let svc = service(&h);
        let accepted = svc.submit_task(&UserId::new("u1"), task(Some("s1"))).await.unwrap();
        assert_eq!(accepted.status, "Plan not created for session s1");
        assert!(accepted.plan_id.is_empty());
    }

    #[tokio::test]
    async fn test_approve_all_steps() {
        let h = Harness::new([
            Ok(plan_response(&[("Create an email account", "Hr_Agent")])),
            Ok(ChatResponse::text("Email created")),
        ]);
        let svc = service(&h);
        let user = UserId::new("u1");
        let accepted = svc.submit_task(&user, task(Some("s1"))).await.unwrap();

        let result = svc
            .approve_steps(
                &user,
                HumanFeedback {
                    step_id: None,
                    plan_id: accepted.plan_id.clone(),
                    session_id: accepted.session_id.clone(),
                    approved: true,
                    human_feedback: None,
                    updated_action: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(result.status, "All steps approved");
        assert_eq!(result.steps[0].status, StepStatus::Completed);

        let plans = svc.list_plans(&user, None).await.unwrap();
        assert_eq!(plans[0].plan.overall_status, PlanStatus::Completed);
        assert_eq!(plans[0].completed, 1);
    }

    #[tokio::test]
    async fn test_feedback_on_human_step_completes_it() {
        let h = Harness::new([Ok(plan_response(&[("Confirm start date", "Human_Agent")]))]);
        let svc = service(&h);
        let user = UserId::new("u1");
        let accepted = svc.submit_task(&user, task(Some("s1"))).await.unwrap();
        let steps = svc.list_steps(&user, &accepted.plan_id).await.unwrap();

        let ack = svc
            .submit_feedback(
                &user,
                HumanFeedback {
                    step_id: Some(steps[0].id.clone()),
                    plan_id: accepted.plan_id.clone(),
                    session_id: accepted.session_id.clone(),
                    approved: true,
                    human_feedback: Some("Monday".into()),
                    updated_action: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(ack.status, "Feedback received");

        let steps = svc.list_steps(&user, &accepted.plan_id).await.unwrap();
        assert_eq!(steps[0].status, StepStatus::Completed);
        assert_eq!(steps[0].agent_reply.as_deref(), Some("Monday"));
        let plans = svc.list_plans(&user, None).await.unwrap();
        assert_eq!(plans[0].plan.overall_status, PlanStatus::Completed);
    }

    #[tokio::test]
    async fn test_clarification_and_messages() {
        let h = Harness::new([Ok(plan_response(&[("a", "Hr_Agent")]))]);
        let svc = service(&h);
        let user = UserId::new("u1");
        let accepted = svc.submit_task(&user, task(Some("s1"))).await.unwrap();

        let ack = svc
            .submit_clarification(
                &user,
                HumanClarification {
                    plan_id: accepted.plan_id.clone(),
                    session_id: accepted.session_id.clone(),
                    human_clarification: "She starts Monday".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(ack.status, "Clarification received");

        let messages = svc
            .list_agent_messages(&user, &accepted.session_id)
            .await
            .unwrap();
        assert_eq!(
            messages.last().map(|m| m.content.as_str()),
            Some("Thanks. The plan has been updated.")
        );
    }

    #[tokio::test]
    async fn test_delete_all_evicts_sessions() {
        let h = Harness::new([Ok(plan_response(&[("a", "Hr_Agent")]))]);
        let svc = service(&h);
        let user = UserId::new("u1");
        svc.submit_task(&user, task(Some("s1"))).await.unwrap();
        assert_eq!(svc.runtime().len().await, 1);

        let deleted = svc.delete_all(&user).await.unwrap();
        assert!(deleted > 0);
        assert!(svc.runtime().is_empty().await);
        assert!(svc.list_all_items(&user).await.unwrap().is_empty());
    }

    #[test]
    fn test_agent_tools_lists_catalog() {
        let h = Harness::new([]);
        let tools = service(&h).agent_tools();
        assert!(tools.iter().any(|t| t.function == "dummy_function"));
    }

    fn feedback_for(plan_id: &PlanId, session: &str, step_id: Option<StepId>) -> HumanFeedback {
        HumanFeedback {
            step_id,
            plan_id: plan_id.clone(),
            session_id: SessionId::new(session),
            approved: true,
            human_feedback: Some("Monday".into()),
            updated_action: None,
        }
    }

    #[tokio::test]
    async fn test_feedback_under_another_session_changes_nothing() {
        let h = Harness::new([Ok(plan_response(&[
            ("Confirm start date", "Human_Agent"),
            ("Create an email account", "Hr_Agent"),
        ]))]);
        let svc = service(&h);
        let user = UserId::new("u1");
        let accepted = svc.submit_task(&user, task(Some("s1"))).await.unwrap();
        let steps = svc.list_steps(&user, &accepted.plan_id).await.unwrap();

        let err = svc
            .approve_steps(&user, feedback_for(&accepted.plan_id, "s2", None))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::PlanNotFound(_)));

        let err = svc
            .submit_feedback(
                &user,
                feedback_for(&accepted.plan_id, "s2", Some(steps[1].id.clone())),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::PlanNotFound(_)));

        svc.submit_feedback(
            &user,
            feedback_for(&accepted.plan_id, "s2", Some(steps[0].id.clone())),
        )
        .await
        .unwrap();

        let after = svc.list_steps(&user, &accepted.plan_id).await.unwrap();
        assert!(after.iter().all(|s| s.status == StepStatus::Planned));
        assert_eq!(h.gateway.request_count(), 1);
    }
}
