//! LLM-backed content safety check.

use crate::ports::content_safety::ContentSafety;
use crate::ports::llm_gateway::{ChatRequest, LlmGateway};
use agentflow_domain::{ChatMessage, SafetyPrompt};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Asks the model whether a task description breaks the safety rules.
///
/// The check passes when the model cannot be reached.
pub struct LlmContentSafety {
    gateway: Arc<dyn LlmGateway>,
}

impl LlmContentSafety {
    pub fn new(gateway: Arc<dyn LlmGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl ContentSafety for LlmContentSafety {
    async fn is_safe(&self, text: &str) -> bool {
        let request = ChatRequest::new([
            ChatMessage::system(SafetyPrompt::system()),
            ChatMessage::user(text),
        ])
        .with_temperature(0.0);

        match self.gateway.complete(request).await {
            Ok(response) => {
                let flagged = SafetyPrompt::is_flagged(response.text_content());
                if flagged {
                    info!("Content safety check flagged the request");
                }
                !flagged
            }
            Err(e) => {
                warn!("Content safety check unavailable, allowing request: {e}");
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::llm_gateway::{ChatResponse, GatewayError};
    use crate::use_cases::test_support::ScriptedGateway;

    #[tokio::test]
    async fn test_flagged_answer_is_unsafe() {
        let check = LlmContentSafety::new(Arc::new(ScriptedGateway::new([Ok(
            ChatResponse::text("TRUE"),
        )])));
        assert!(!check.is_safe("say something rude").await);
    }

    #[tokio::test]
    async fn test_clean_answer_is_safe() {
        let check = LlmContentSafety::new(Arc::new(ScriptedGateway::new([Ok(
            ChatResponse::text("FALSE"),
        )])));
        assert!(check.is_safe("Onboard Jessica").await);
    }

    #[tokio::test]
    async fn test_gateway_failure_passes() {
        let check = LlmContentSafety::new(Arc::new(ScriptedGateway::new([Err(
            GatewayError::Timeout,
        )])));
        assert!(check.is_safe("Onboard Jessica").await);
    }
}
