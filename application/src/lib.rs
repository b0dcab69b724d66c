//! Application layer for agentflow
//!
//! This crate contains the agents, the session runtime, port definitions and
//! execution parameters. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::ExecutionParams;
pub use ports::{
    content_safety::{AllowAllContent, ContentSafety},
    event_tracker::{EventTracker, NoEventTracker, TrackedEvent, track_event_if_configured},
    llm_gateway::{ChatRequest, ChatResponse, GatewayError, LlmGateway, LlmMessage},
    memory_store::{MemoryStore, StoreError},
};
pub use use_cases::chat_context::BufferedChatContext;
pub use use_cases::content_safety::LlmContentSafety;
pub use use_cases::session_runtime::{SessionAgents, SessionRuntime};
pub use use_cases::shared::{AgentDeps, SessionScope};
pub use use_cases::types::WorkflowError;
pub use use_cases::workflow::{
    ApprovalResult, ClarificationAccepted, FeedbackAccepted, TaskAccepted, WorkflowService,
};
