//! OpenAI-compatible chat-completions client
//!
//! Implements [`LlmGateway`] over plain HTTP. Works against api.openai.com,
//! Azure OpenAI (when an `api_version` is configured) and any server that
//! speaks the same protocol. Transient failures are retried here with
//! exponential backoff; callers only see the final outcome.

use crate::config::FileLlmConfig;
use agentflow_application::{ChatRequest, ChatResponse, GatewayError, LlmGateway, LlmMessage};
use agentflow_domain::ToolCall;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
}

/// How the endpoint expects to be addressed and authenticated.
#[derive(Debug, Clone, PartialEq)]
enum Flavor {
    OpenAi,
    Azure { api_version: String },
}

pub struct OpenAiCompatibleGateway {
    http: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    flavor: Flavor,
    max_tokens: Option<u32>,
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl OpenAiCompatibleGateway {
    pub fn from_config(config: &FileLlmConfig) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::NotConfigured(e.to_string()))?;

        let api_key = config.resolve_api_key();
        if api_key.is_none() {
            warn!(
                "No API key in llm.api_key or ${}; requests are sent unauthenticated",
                config.api_key_env
            );
        }

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            flavor: match &config.api_version {
                Some(v) => Flavor::Azure {
                    api_version: v.clone(),
                },
                None => Flavor::OpenAi,
            },
            max_tokens: config.max_tokens,
            max_attempts: config.max_retries.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        })
    }

    fn endpoint(&self) -> String {
        match &self.flavor {
            Flavor::OpenAi => format!("{}/chat/completions", self.base_url),
            Flavor::Azure { api_version } => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                self.base_url, self.model, api_version
            ),
        }
    }

    /// Build the request body for the chat-completions API
    fn build_request_body(&self, request: &ChatRequest) -> Value {
        let messages: Vec<Value> = request.messages.iter().map(convert_message).collect();
        let mut body = json!({
            "model": self.model,
            "messages": messages,
        });

        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if !request.tools.is_empty() {
            body["tools"] = json!(request.tools);
            body["tool_choice"] = json!("auto");
        }
        if request.json_response {
            body["response_format"] = json!({ "type": "json_object" });
        }
        body
    }

    /// Delay before retry number `attempt` (1-based), doubling from
    /// `initial_backoff` up to `max_backoff`.
    fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
            .min(self.max_backoff)
    }

    async fn send_once(&self, url: &str, body: &Value) -> Result<reqwest::Response, GatewayError> {
        let mut builder = self.http.post(url).json(body);
        if let Some(key) = &self.api_key {
            builder = match self.flavor {
                Flavor::Azure { .. } => builder.header("api-key", key),
                Flavor::OpenAi => builder.bearer_auth(key),
            };
        }
        builder.send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout
            } else {
                GatewayError::ConnectionError(e.to_string())
            }
        })
    }
}

/// Convert one conversation entry to the wire format.
///
/// Tool calls go out as an assistant message; every tool result is its own
/// `tool` message.
fn convert_message(message: &LlmMessage) -> Value {
    match message {
        LlmMessage::Chat(chat) => json!({
            "role": chat.role.as_str(),
            "content": chat.content,
        }),
        LlmMessage::ToolCalls(calls) => json!({
            "role": "assistant",
            "content": Value::Null,
            "tool_calls": calls.iter().map(|c| json!({
                "id": c.id,
                "type": "function",
                "function": {
                    "name": c.name,
                    "arguments": c.arguments.to_string(),
                }
            })).collect::<Vec<_>>(),
        }),
        LlmMessage::ToolResult { call_id, content } => json!({
            "role": "tool",
            "tool_call_id": call_id,
            "content": content,
        }),
    }
}

fn retry_after(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
}

#[async_trait]
impl LlmGateway for OpenAiCompatibleGateway {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, GatewayError> {
        let url = self.endpoint();
        let body = self.build_request_body(&request);
        debug!(model = %self.model, messages = request.messages.len(), "complete: called");

        let mut last_error = None;
        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                let backoff = self.backoff(attempt - 1);
                warn!(
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    "complete: retrying after transient error"
                );
                tokio::time::sleep(backoff).await;
            }

            let response = match self.send_once(&url, &body).await {
                Ok(r) => r,
                Err(e) => {
                    debug!(attempt, error = %e, "complete: transport error");
                    last_error = Some(e);
                    continue;
                }
            };

            let status = response.status().as_u16();
            if status == 429 {
                debug!(attempt, "complete: rate limited (429)");
                last_error = Some(GatewayError::RateLimited {
                    retry_after_secs: retry_after(&response),
                });
                continue;
            }
            if is_retryable_status(status) {
                let message = response.text().await.unwrap_or_default();
                debug!(attempt, status, "complete: retryable error");
                last_error = Some(GatewayError::ApiError { status, message });
                continue;
            }
            if !response.status().is_success() {
                let message = response.text().await.unwrap_or_default();
                debug!(status, "complete: API error");
                return Err(GatewayError::ApiError { status, message });
            }

            let api_response: OpenAiResponse = response
                .json()
                .await
                .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
            return parse_response(api_response);
        }

        Err(last_error
            .unwrap_or_else(|| GatewayError::InvalidResponse("Max retries exceeded".to_string())))
    }
}

fn parse_response(api_response: OpenAiResponse) -> Result<ChatResponse, GatewayError> {
    let choice = api_response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::InvalidResponse("response has no choices".to_string()))?;

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|tc| ToolCall {
            id: tc.id,
            name: tc.function.name,
            arguments: serde_json::from_str(&tc.function.arguments).unwrap_or_else(|_| json!({})),
        })
        .collect();

    Ok(ChatResponse {
        content: choice.message.content,
        tool_calls,
        finish_reason: choice.finish_reason,
    })
}

// Chat-completions response types

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiToolCall {
    id: String,
    function: OpenAiFunction,
}

#[derive(Debug, Deserialize)]
struct OpenAiFunction {
    name: String,
    arguments: String,
}
