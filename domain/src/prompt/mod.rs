//! Prompt domain
//!
//! Templates for the planner, the per-step action requests, the domain
//! agents' system messages and the content safety check.

pub mod action;
pub mod agent;
pub mod planner;
pub mod safety;

pub use action::ActionPrompt;
pub use agent::AgentPrompt;
pub use planner::PlannerPrompt;
pub use safety::SafetyPrompt;
