//! Domain layer for agentflow
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! - **Plan**: the user's goal, decomposed by the planner into ordered steps
//! - **Step**: one action owned by a single agent, gated by human approval
//! - **Agent**: a role with a system prompt and a tool list; the reasoning
//!   itself happens in an LLM behind the application layer's gateway port
//!
//! The step state machine lives in [`plan::entities`]; every transition is
//! replay-safe.

pub mod agent;
pub mod core;
pub mod document;
pub mod memory;
pub mod messages;
pub mod plan;
pub mod prompt;
pub mod session;
pub mod tool;
pub mod util;

// Re-export commonly used types
pub use agent::agent_type::AgentType;
pub use core::error::DomainError;
pub use document::{DataType, Document};
pub use memory::record::{MemoryRecord, cosine_similarity, keyword_matches, nearest_matches};
pub use messages::{
    chat::{AgentMessage, ChatMessage, MessageRole, StoredMessage},
    requests::{ActionRequest, ActionResponse, HumanClarification, HumanFeedback, InputTask},
};
pub use plan::{
    entities::{
        HumanFeedbackStatus, Plan, PlanStatus, PlanWithSteps, Step, StepStatus, StepTransition,
    },
    plan_parser::{PlannedStep, StructuredPlan, parse_planner_json, parse_planner_response},
    value_objects::{PlanId, SessionId, StepId, UserId},
};
pub use prompt::{ActionPrompt, AgentPrompt, PlannerPrompt, SafetyPrompt};
pub use session::entities::Session;
pub use tool::{
    catalog::ToolCatalog,
    entities::{ToolCall, ToolDefinition, ToolParameter, ToolSummary},
};
