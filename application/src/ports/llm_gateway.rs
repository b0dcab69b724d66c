//! LLM Gateway port
//!
//! Defines the interface for chat-completion calls. Adapters live in the
//! infrastructure layer; agents only see [`ChatRequest`] and [`ChatResponse`].

use agentflow_domain::{ChatMessage, ToolCall};
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Rate limited (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Gateway not configured: {0}")]
    NotConfigured(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl GatewayError {
    /// Whether the request may succeed if sent again.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::ConnectionError(_)
            | GatewayError::RateLimited { .. }
            | GatewayError::Timeout => true,
            GatewayError::ApiError { status, .. } => *status == 408 || *status >= 500,
            _ => false,
        }
    }
}

/// One entry of the conversation sent to the model
#[derive(Debug, Clone, PartialEq)]
pub enum LlmMessage {
    Chat(ChatMessage),
    /// The model's earlier request to call tools.
    ToolCalls(Vec<ToolCall>),
    /// The result of one tool call.
    ToolResult { call_id: String, content: String },
}

impl From<ChatMessage> for LlmMessage {
    fn from(message: ChatMessage) -> Self {
        LlmMessage::Chat(message)
    }
}

/// A chat-completion request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<LlmMessage>,
    /// Tool schemas in the chat-completions `tools` format.
    pub tools: Vec<Value>,
    pub temperature: Option<f32>,
    /// Ask the model for a JSON object response.
    pub json_response: bool,
}

impl ChatRequest {
    pub fn new(messages: impl IntoIterator<Item = ChatMessage>) -> Self {
        Self {
            messages: messages.into_iter().map(LlmMessage::Chat).collect(),
            ..Self::default()
        }
    }

    pub fn with_tools(mut self, tools: Vec<Value>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn json(mut self) -> Self {
        self.json_response = true;
        self
    }
}

/// The model's answer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatResponse {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: Option<String>,
}

impl ChatResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
            finish_reason: Some("stop".to_string()),
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    pub fn text_content(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}

/// Gateway for LLM communication
///
/// This port defines how the application layer communicates with the
/// chat-completions endpoint. Retries happen inside the adapter; an error
/// returned here is final.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, GatewayError>;
}
