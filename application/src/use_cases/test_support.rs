//! Port fakes for use case tests.

use crate::config::ExecutionParams;
use crate::ports::event_tracker::{EventTracker, TrackedEvent};
use crate::ports::llm_gateway::{ChatRequest, ChatResponse, GatewayError, LlmGateway};
use crate::ports::memory_store::{MemoryStore, StoreError};
use crate::use_cases::shared::AgentDeps;
use agentflow_domain::{
    AgentMessage, Document, MemoryRecord, Plan, PlanId, Session, SessionId, Step, StepId,
    StoredMessage, ToolCall, ToolCatalog, UserId,
};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Returns queued responses in order; errors once the queue is empty.
#[derive(Default)]
pub struct ScriptedGateway {
    responses: Mutex<VecDeque<Result<ChatResponse, GatewayError>>>,
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedGateway {
    pub fn new(responses: impl IntoIterator<Item = Result<ChatResponse, GatewayError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, GatewayError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::Other("no scripted response".into())))
    }
}

pub fn tool_call(id: &str, name: &str, args: Value) -> ChatResponse {
    ChatResponse {
        content: None,
        tool_calls: vec![ToolCall {
            id: id.into(),
            name: name.into(),
            arguments: args,
        }],
        finish_reason: Some("tool_calls".into()),
    }
}

pub fn plan_response(steps: &[(&str, &str)]) -> ChatResponse {
    let steps: Vec<Value> = steps
        .iter()
        .map(|(action, agent)| json!({"action": action, "agent": agent}))
        .collect();
    ChatResponse::text(
        json!({
            "initial_goal": "Onboard Jessica",
            "steps": steps,
            "summary_plan_and_steps": "Onboard Jessica in a few steps",
            "human_clarification_request": null
        })
        .to_string(),
    )
}

#[derive(Default)]
pub struct RecordingTracker {
    pub events: Mutex<Vec<TrackedEvent>>,
}

impl RecordingTracker {
    pub fn names(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.name.clone())
            .collect()
    }
}

impl EventTracker for RecordingTracker {
    fn track(&self, event: TrackedEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[derive(Default)]
struct Inner {
    sessions: Vec<Session>,
    plans: Vec<Plan>,
    steps: Vec<Step>,
    agent_messages: Vec<AgentMessage>,
    messages: Vec<StoredMessage>,
    records: Vec<(UserId, MemoryRecord)>,
}

/// Vector-backed store keeping insertion order.
#[derive(Default)]
pub struct FakeStore {
    inner: Mutex<Inner>,
    pub step_updates: Mutex<usize>,
}

fn upsert<T: Clone>(items: &mut Vec<T>, item: &T, same: impl Fn(&T) -> bool) {
    match items.iter_mut().find(|i| same(i)) {
        Some(existing) => *existing = item.clone(),
        None => items.push(item.clone()),
    }
}

fn tagged<T: Document>(doc: &T) -> Value {
    let mut value = serde_json::to_value(doc).unwrap();
    value["data_type"] = json!(T::DATA_TYPE.as_str());
    value
}

impl FakeStore {
    pub fn step_update_count(&self) -> usize {
        *self.step_updates.lock().unwrap()
    }

    pub fn agent_message_texts(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .agent_messages
            .iter()
            .map(|m| m.content.clone())
            .collect()
    }
}

#[async_trait]
impl MemoryStore for FakeStore {
    async fn add_session(&self, session: &Session) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        upsert(&mut inner.sessions, session, |s| s.id == session.id);
        Ok(())
    }

    async fn get_session(
        &self,
        user: &UserId,
        session_id: &SessionId,
    ) -> Result<Option<Session>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .sessions
            .iter()
            .find(|s| &s.user_id == user && &s.id == session_id)
            .cloned())
    }

    async fn get_all_sessions(&self, user: &UserId) -> Result<Vec<Session>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.sessions.iter().filter(|s| &s.user_id == user).cloned().collect())
    }

    async fn add_plan(&self, plan: &Plan) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        upsert(&mut inner.plans, plan, |p| p.id == plan.id);
        Ok(())
    }

    async fn update_plan(&self, plan: &Plan) -> Result<(), StoreError> {
        self.add_plan(plan).await
    }

    async fn get_plan(&self, user: &UserId, plan_id: &PlanId) -> Result<Option<Plan>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .plans
            .iter()
            .find(|p| &p.user_id == user && &p.id == plan_id)
            .cloned())
    }

    async fn get_plan_by_session(
        &self,
        user: &UserId,
        session_id: &SessionId,
    ) -> Result<Option<Plan>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .plans
            .iter()
            .rev()
            .find(|p| &p.user_id == user && &p.session_id == session_id)
            .cloned())
    }

    async fn get_all_plans(&self, user: &UserId) -> Result<Vec<Plan>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.plans.iter().filter(|p| &p.user_id == user).cloned().collect())
    }

    async fn add_step(&self, step: &Step) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        upsert(&mut inner.steps, step, |s| s.id == step.id);
        Ok(())
    }

    async fn update_step(&self, step: &Step) -> Result<(), StoreError> {
        *self.step_updates.lock().unwrap() += 1;
        self.add_step(step).await
    }

    async fn get_step(&self, user: &UserId, step_id: &StepId) -> Result<Option<Step>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .steps
            .iter()
            .find(|s| &s.user_id == user && &s.id == step_id)
            .cloned())
    }

    async fn get_steps_by_plan(
        &self,
        user: &UserId,
        plan_id: &PlanId,
    ) -> Result<Vec<Step>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .steps
            .iter()
            .filter(|s| &s.user_id == user && &s.plan_id == plan_id)
            .cloned()
            .collect())
    }

    async fn add_agent_message(&self, message: &AgentMessage) -> Result<(), StoreError> {
        self.inner.lock().unwrap().agent_messages.push(message.clone());
        Ok(())
    }

    async fn get_agent_messages_by_session(
        &self,
        user: &UserId,
        session_id: &SessionId,
    ) -> Result<Vec<AgentMessage>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .agent_messages
            .iter()
            .filter(|m| &m.user_id == user && &m.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn add_message(&self, message: &StoredMessage) -> Result<(), StoreError> {
        self.inner.lock().unwrap().messages.push(message.clone());
        Ok(())
    }

    async fn get_messages(
        &self,
        user: &UserId,
        session_id: &SessionId,
        limit: Option<usize>,
    ) -> Result<Vec<StoredMessage>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let all: Vec<StoredMessage> = inner
            .messages
            .iter()
            .filter(|m| &m.user_id == user && &m.session_id == session_id)
            .cloned()
            .collect();
        let skip = limit.map_or(0, |l| all.len().saturating_sub(l));
        Ok(all.into_iter().skip(skip).collect())
    }

    async fn get_all_items(&self, user: &UserId) -> Result<Vec<Value>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut items = Vec::new();
        items.extend(inner.sessions.iter().filter(|d| &d.user_id == user).map(tagged));
        items.extend(inner.plans.iter().filter(|d| &d.user_id == user).map(tagged));
        items.extend(inner.steps.iter().filter(|d| &d.user_id == user).map(tagged));
        items.extend(inner.agent_messages.iter().filter(|d| &d.user_id == user).map(tagged));
        items.extend(inner.messages.iter().filter(|d| &d.user_id == user).map(tagged));
        Ok(items)
    }

    async fn delete_all_items(&self, user: &UserId) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.sessions.len()
            + inner.plans.len()
            + inner.steps.len()
            + inner.agent_messages.len()
            + inner.messages.len()
            + inner.records.len();
        inner.sessions.retain(|d| &d.user_id != user);
        inner.plans.retain(|d| &d.user_id != user);
        inner.steps.retain(|d| &d.user_id != user);
        inner.agent_messages.retain(|d| &d.user_id != user);
        inner.messages.retain(|d| &d.user_id != user);
        inner.records.retain(|(u, _)| u != user);
        let after = inner.sessions.len()
            + inner.plans.len()
            + inner.steps.len()
            + inner.agent_messages.len()
            + inner.messages.len()
            + inner.records.len();
        Ok((before - after) as u64)
    }

    async fn upsert_memory_record(
        &self,
        user: &UserId,
        record: &MemoryRecord,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let entry = (user.clone(), record.clone());
        upsert(&mut inner.records, &entry, |(u, r)| u == user && r.id == record.id);
        Ok(())
    }

    async fn get_memory_record(
        &self,
        user: &UserId,
        collection: &str,
        key: &str,
    ) -> Result<Option<MemoryRecord>, StoreError> {
        let id = MemoryRecord::record_id(collection, key);
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .records
            .iter()
            .find(|(u, r)| u == user && r.id == id)
            .map(|(_, r)| r.clone()))
    }

    async fn get_memory_records(
        &self,
        user: &UserId,
        collection: &str,
    ) -> Result<Vec<MemoryRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .records
            .iter()
            .filter(|(u, r)| u == user && r.collection == collection)
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn remove_memory_record(
        &self,
        user: &UserId,
        collection: &str,
        key: &str,
    ) -> Result<bool, StoreError> {
        let id = MemoryRecord::record_id(collection, key);
        let mut inner = self.inner.lock().unwrap();
        let before = inner.records.len();
        inner.records.retain(|(u, r)| !(u == user && r.id == id));
        Ok(inner.records.len() < before)
    }

    async fn get_collections(&self, user: &UserId) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut collections: Vec<String> = inner
            .records
            .iter()
            .filter(|(u, _)| u == user)
            .map(|(_, r)| r.collection.clone())
            .collect();
        collections.sort();
        collections.dedup();
        Ok(collections)
    }

    async fn delete_collection(&self, user: &UserId, collection: &str) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.records.len();
        inner
            .records
            .retain(|(u, r)| !(u == user && r.collection == collection));
        Ok((before - inner.records.len()) as u64)
    }
}

pub struct Harness {
    pub gateway: Arc<ScriptedGateway>,
    pub store: Arc<FakeStore>,
    pub tracker: Arc<RecordingTracker>,
    pub deps: AgentDeps,
}

impl Harness {
    pub fn new(responses: impl IntoIterator<Item = Result<ChatResponse, GatewayError>>) -> Self {
        let gateway = Arc::new(ScriptedGateway::new(responses));
        let store = Arc::new(FakeStore::default());
        let tracker = Arc::new(RecordingTracker::default());
        let deps = AgentDeps {
            gateway: gateway.clone(),
            store: store.clone(),
            tracker: tracker.clone(),
            catalog: Arc::new(ToolCatalog::builtin()),
            params: ExecutionParams::default(),
            cancellation: None,
        };
        Self {
            gateway,
            store,
            tracker,
            deps,
        }
    }
}
