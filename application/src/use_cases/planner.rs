//! Planner agent: turns a task description into a plan with steps.

use crate::ports::llm_gateway::ChatRequest;
use crate::ports::memory_store::StoreError;
use crate::use_cases::chat_context::BufferedChatContext;
use crate::use_cases::shared::{AgentDeps, SessionScope};
use crate::use_cases::types::WorkflowError;
use agentflow_domain::util::preview;
use agentflow_domain::{
    AgentType, ChatMessage, DomainError, HumanClarification, InputTask, Plan, PlannerPrompt,
    Step, parse_planner_response,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct PlannerAgent {
    deps: AgentDeps,
    scope: SessionScope,
    context: Arc<BufferedChatContext>,
}

impl PlannerAgent {
    pub fn new(deps: AgentDeps, scope: SessionScope, context: Arc<BufferedChatContext>) -> Self {
        Self {
            deps,
            scope,
            context,
        }
    }

    /// Create and persist a plan for the task.
    ///
    /// When the model fails or returns an unusable plan, the returned plan
    /// has status `failed`, an empty id, and nothing is persisted for it.
    pub async fn handle_input_task(&self, task: &InputTask) -> Result<Plan, WorkflowError> {
        let description = task.description.trim();
        if description.is_empty() {
            return Err(DomainError::EmptyGoal.into());
        }

        self.context
            .add(AgentType::Human, ChatMessage::user(description))
            .await?;

        let instruction = PlannerPrompt::instruction(
            description,
            &AgentType::domain_agents(),
            &self.deps.catalog.summaries(),
        );
        let messages = vec![
            ChatMessage::system(PlannerPrompt::system()),
            ChatMessage::user(instruction),
        ];
        let (plan, steps) = self.create_structured_plan(messages, description).await?;

        self.scope
            .post(
                self.deps.store.as_ref(),
                AgentType::Human,
                &plan.id,
                None,
                description,
            )
            .await?;
        if plan.is_failed() {
            self.scope
                .post(
                    self.deps.store.as_ref(),
                    AgentType::Planner,
                    &plan.id,
                    None,
                    "Unable to create a plan for this task. Please try again.",
                )
                .await?;
            return Ok(plan);
        }

        let summary = plan.summary.clone().unwrap_or_default();
        self.scope
            .post(
                self.deps.store.as_ref(),
                AgentType::Planner,
                &plan.id,
                None,
                format!("Generated a plan with {} steps. {summary}", steps.len()),
            )
            .await?;
        if let Some(question) = &plan.human_clarification_request {
            self.scope
                .post(
                    self.deps.store.as_ref(),
                    AgentType::Planner,
                    &plan.id,
                    None,
                    format!(
                        "I require additional information before we can proceed: {question}"
                    ),
                )
                .await?;
        }
        self.context
            .add(AgentType::Planner, ChatMessage::assistant(summary))
            .await?;

        info!(
            plan_id = %plan.id,
            steps = steps.len(),
            "Plan created for session {}",
            self.scope.session_id
        );
        Ok(plan)
    }

    /// Ask the model for a structured plan and persist it with its steps.
    ///
    /// Model and parse failures produce a failed plan and no steps; only
    /// store failures are returned as errors.
    pub async fn create_structured_plan(
        &self,
        messages: Vec<ChatMessage>,
        task: &str,
    ) -> Result<(Plan, Vec<Step>), StoreError> {
        let request = ChatRequest::new(messages)
            .with_temperature(self.deps.params.temperature)
            .json();

        let response = match self.deps.gateway.complete(request).await {
            Ok(response) => response,
            Err(e) => {
                error!("Planner model call failed: {e}");
                return Ok(self.failed(task, &e.to_string()));
            }
        };

        let text = response.text_content();
        debug!("Planner response: {}", preview(text, 500));
        let structured = match parse_planner_response(text) {
            Ok(structured) => structured,
            Err(e) => {
                warn!("Planner returned an unusable plan: {e}");
                return Ok(self.failed(task, &e.to_string()));
            }
        };
        for step in structured.steps.iter() {
            if let Some(name) = &step.unknown_agent {
                warn!("Planner assigned unknown agent {name:?}; using Generic_Agent");
            }
        }

        let (plan, steps) =
            structured.into_entities(&self.scope.session_id, &self.scope.user_id, task);

        self.deps.store.add_plan(&plan).await?;
        for step in &steps {
            self.deps.store.add_step(step).await?;
        }
        self.scope.track(
            self.deps.tracker.as_ref(),
            "Planner - Initial plan and added into the store",
            json!({
                "plan_id": plan.id.as_str(),
                "initial_goal": plan.initial_goal,
                "overall_status": plan.overall_status.as_str(),
                "steps": steps.len(),
            }),
        );
        Ok((plan, steps))
    }

    /// Store the human's answer to the planner's clarification request.
    pub async fn handle_plan_clarification(
        &self,
        clarification: &HumanClarification,
    ) -> Result<Plan, WorkflowError> {
        let store = self.deps.store.as_ref();
        let mut plan = store
            .get_plan(&self.scope.user_id, &clarification.plan_id)
            .await?
            .ok_or_else(|| WorkflowError::PlanNotFound(clarification.plan_id.to_string()))?;

        plan.human_clarification_response = Some(clarification.human_clarification.clone());
        store.update_plan(&plan).await?;

        self.scope
            .post(
                store,
                AgentType::Human,
                &plan.id,
                None,
                clarification.human_clarification.clone(),
            )
            .await?;
        self.scope
            .post(
                store,
                AgentType::Planner,
                &plan.id,
                None,
                PlannerPrompt::clarification_acknowledgement(),
            )
            .await?;
        self.context
            .add(
                AgentType::Human,
                ChatMessage::user(clarification.human_clarification.clone()),
            )
            .await?;
        self.scope.track(
            self.deps.tracker.as_ref(),
            "Planner - Store HumanAgent clarification and added into the store",
            json!({ "plan_id": plan.id.as_str() }),
        );
        Ok(plan)
    }

    fn failed(&self, task: &str, reason: &str) -> (Plan, Vec<Step>) {
        self.scope.track(
            self.deps.tracker.as_ref(),
            "Planner - Error in create_structured_plan",
            json!({ "error": reason }),
        );
        (
            Plan::failed(
                self.scope.session_id.clone(),
                self.scope.user_id.clone(),
                task,
            ),
            Vec::new(),
        )
    }
}
