//! Conversation records: agent messages shown to the user and the chat
//! history replayed to the LLM.

use crate::agent::agent_type::AgentType;
use crate::plan::value_objects::{PlanId, SessionId, StepId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A message an agent posted to the session transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub id: String,
    pub session_id: SessionId,
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub content: String,
    pub source: AgentType,
    #[serde(default)]
    pub step_id: Option<StepId>,
    pub timestamp: DateTime<Utc>,
}

impl AgentMessage {
    pub fn new(
        session_id: &SessionId,
        user_id: &UserId,
        plan_id: &PlanId,
        source: AgentType,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.clone(),
            user_id: user_id.clone(),
            plan_id: plan_id.clone(),
            content: content.into(),
            source,
            step_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_step(mut self, step_id: &StepId) -> Self {
        self.step_id = Some(step_id.clone());
        self
    }
}

/// Role of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Tool => "tool",
        }
    }
}

/// A message in an LLM conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// A chat message as persisted in the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: String,
    pub session_id: SessionId,
    pub user_id: UserId,
    pub role: MessageRole,
    pub content: String,
    pub source: AgentType,
    #[serde(default)]
    pub plan_id: Option<PlanId>,
    #[serde(default)]
    pub step_id: Option<StepId>,
    pub timestamp: DateTime<Utc>,
}

impl StoredMessage {
    pub fn new(
        session_id: &SessionId,
        user_id: &UserId,
        source: AgentType,
        message: &ChatMessage,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.clone(),
            user_id: user_id.clone(),
            role: message.role,
            content: message.content.clone(),
            source,
            plan_id: message.metadata.get("plan_id").map(PlanId::new),
            step_id: message.metadata.get("step_id").map(StepId::new),
            timestamp: Utc::now(),
        }
    }

    /// Rebuild the chat message, carrying plan, step and source in metadata.
    pub fn to_chat_message(&self) -> ChatMessage {
        let mut metadata = BTreeMap::new();
        if let Some(plan_id) = &self.plan_id {
            metadata.insert("plan_id".to_string(), plan_id.to_string());
        }
        if let Some(step_id) = &self.step_id {
            metadata.insert("step_id".to_string(), step_id.to_string());
        }
        metadata.insert("source".to_string(), self.source.as_str().to_string());
        ChatMessage {
            role: self.role,
            content: self.content.clone(),
            metadata,
        }
    }
}
