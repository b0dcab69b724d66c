//! Use cases
//!
//! The agents of one session and the workflow operations built on them.

pub mod chat_context;
pub mod content_safety;
pub mod domain_agent;
pub mod group_chat_manager;
pub mod human_agent;
pub mod planner;
pub mod session_runtime;
pub mod shared;
pub mod types;
pub mod workflow;

#[cfg(test)]
pub(crate) mod test_support;
