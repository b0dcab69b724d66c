//! Domain agents (HR, marketing, procurement, product, tech support,
//! knowledge, generic) executing a step through the model and their tools.

use crate::ports::llm_gateway::{ChatRequest, GatewayError, LlmMessage};
use crate::use_cases::chat_context::BufferedChatContext;
use crate::use_cases::shared::{AgentDeps, SessionScope};
use crate::use_cases::types::WorkflowError;
use agentflow_domain::util::preview;
use agentflow_domain::{
    ActionRequest, ActionResponse, AgentPrompt, AgentType, ChatMessage, StepStatus, ToolCall,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, warn};

const KNOWLEDGE_SEARCH_TOOL: &str = "search_knowledge_base";
const DEFAULT_SEARCH_TOP: usize = 3;

pub struct DomainAgent {
    agent_type: AgentType,
    deps: AgentDeps,
    scope: SessionScope,
    context: Arc<BufferedChatContext>,
}

impl DomainAgent {
    pub fn new(
        agent_type: AgentType,
        deps: AgentDeps,
        scope: SessionScope,
        context: Arc<BufferedChatContext>,
    ) -> Self {
        Self {
            agent_type,
            deps,
            scope,
            context,
        }
    }

    pub fn agent_type(&self) -> AgentType {
        self.agent_type
    }

    /// Execute the requested step and record the outcome on it.
    ///
    /// A step that is already completed is answered from its stored reply
    /// without calling the model again.
    pub async fn handle_action_request(
        &self,
        request: &ActionRequest,
    ) -> Result<ActionResponse, WorkflowError> {
        let store = self.deps.store.as_ref();
        let Some(mut step) = store.get_step(&self.scope.user_id, &request.step_id).await? else {
            warn!("{}: no step found with id {}", self.agent_type, request.step_id);
            return Ok(ActionResponse::for_request(
                request,
                format!("Step {} not found", request.step_id),
                StepStatus::Failed,
            ));
        };
        if step.status == StepStatus::Completed {
            debug!("Step {} already completed; not re-executing", step.id);
            return Ok(ActionResponse::for_request(
                request,
                step.agent_reply.clone().unwrap_or_default(),
                StepStatus::Completed,
            ));
        }

        let mut messages = vec![ChatMessage::system(AgentPrompt::system(self.agent_type))];
        messages.extend(self.context.messages().await);
        messages.push(ChatMessage::user(request.action.clone()));

        let outcome = match self.deps.params.step_timeout {
            Some(limit) => tokio::time::timeout(limit, self.run_tool_loop(messages))
                .await
                .unwrap_or(Err(GatewayError::Timeout)),
            None => self.run_tool_loop(messages).await,
        };

        match outcome {
            Ok(reply) => {
                step.complete(reply.clone())?;
                store.update_step(&step).await?;
                self.scope
                    .post(store, self.agent_type, &step.plan_id, Some(&step.id), reply.clone())
                    .await?;
                self.context
                    .add(self.agent_type, ChatMessage::assistant(reply.clone()))
                    .await?;
                self.scope.track(
                    self.deps.tracker.as_ref(),
                    &format!("{} - Step completed and updated into the store", self.agent_type),
                    json!({ "step_id": step.id.as_str(), "plan_id": step.plan_id.as_str() }),
                );
                info!("{} completed step {}", self.agent_type, step.id);
                Ok(ActionResponse::for_request(request, reply, StepStatus::Completed))
            }
            Err(e) => {
                warn!("{} failed step {}: {e}", self.agent_type, step.id);
                let reason = format!("Failed to complete step: {e}");
                step.fail(reason.clone());
                store.update_step(&step).await?;
                self.scope
                    .post(store, self.agent_type, &step.plan_id, Some(&step.id), reason.clone())
                    .await?;
                self.scope.track(
                    self.deps.tracker.as_ref(),
                    &format!("{} - Step failed", self.agent_type),
                    json!({ "step_id": step.id.as_str(), "error": e.to_string() }),
                );
                Ok(ActionResponse::for_request(request, reason, StepStatus::Failed))
            }
        }
    }

    /// Alternate between the model and the agent's tools until the model
    /// answers in text. The last round is sent without tools so the model
    /// has to answer.
    async fn run_tool_loop(&self, messages: Vec<ChatMessage>) -> Result<String, GatewayError> {
        let tools = self.deps.catalog.for_agent(self.agent_type);
        let schemas: Vec<_> = tools.iter().map(|t| t.to_openai_schema()).collect();
        let max_turns = self.deps.params.max_tool_turns;

        let mut conversation: Vec<LlmMessage> = messages.into_iter().map(LlmMessage::Chat).collect();
        let mut last_tool_output: Option<String> = None;

        for turn in 0..=max_turns {
            let request = ChatRequest {
                messages: conversation.clone(),
                tools: if turn < max_turns { schemas.clone() } else { Vec::new() },
                temperature: Some(self.deps.params.temperature),
                json_response: false,
            };
            let response = self.deps.gateway.complete(request).await?;

            if !response.has_tool_calls() {
                let text = response.content.unwrap_or_default();
                if text.trim().is_empty() {
                    return last_tool_output.ok_or_else(|| {
                        GatewayError::InvalidResponse("model returned an empty reply".into())
                    });
                }
                return Ok(text);
            }

            conversation.push(LlmMessage::ToolCalls(response.tool_calls.clone()));
            for call in &response.tool_calls {
                let output = self.call_tool(call).await;
                debug!(
                    "{} called {} -> {}",
                    self.agent_type,
                    call.name,
                    preview(&output, 200)
                );
                conversation.push(LlmMessage::ToolResult {
                    call_id: call.id.clone(),
                    content: output.clone(),
                });
                last_tool_output = Some(output);
            }
        }

        last_tool_output.ok_or_else(|| GatewayError::Other("tool turn limit reached".into()))
    }

    async fn call_tool(&self, call: &ToolCall) -> String {
        let Some(tool) = self.deps.catalog.find(self.agent_type, &call.name) else {
            warn!("{} requested unknown tool {}", self.agent_type, call.name);
            return format!("Unknown function: {}", call.name);
        };
        if self.agent_type == AgentType::Knowledge && tool.name == KNOWLEDGE_SEARCH_TOOL {
            return self.search_knowledge_base(&call.arguments).await;
        }
        tool.render(&call.arguments)
    }

    /// Looks the query up in the user's memory records and answers with a
    /// JSON document the model can quote.
    async fn search_knowledge_base(&self, arguments: &Value) -> String {
        let query = arguments.get("query").and_then(Value::as_str).unwrap_or_default();
        let top = arguments
            .get("top")
            .and_then(|v| v.as_u64().or_else(|| v.as_str()?.parse().ok()))
            .map_or(DEFAULT_SEARCH_TOP, |n| n as usize);

        match self
            .deps
            .store
            .search_memory_records(&self.scope.user_id, query, top)
            .await
        {
            Ok(matches) => {
                let results: Vec<Value> = matches
                    .iter()
                    .map(|(record, score)| {
                        json!({
                            "id": record.id,
                            "title": record.description.as_deref().unwrap_or(&record.key),
                            "content": record.text,
                            "source": record.external_source_name,
                            "score": score,
                        })
                    })
                    .collect();
                json!({ "success": true, "query": query, "results": results }).to_string()
            }
            Err(e) => {
                warn!("Knowledge base search failed: {e}");
                json!({ "success": false, "error": e.to_string(), "results": [] }).to_string()
            }
        }
    }
}
