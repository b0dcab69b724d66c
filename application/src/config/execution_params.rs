//! Execution parameters for the agent loop.
//!
//! [`ExecutionParams`] groups the static parameters that control how agents
//! call the LLM and tools. These are application-layer concerns, not domain
//! policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Agent loop control parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionParams {
    /// Sampling temperature passed to every completion request.
    pub temperature: f32,
    /// Maximum model ↔ tool round trips while executing one step.
    pub max_tool_turns: usize,
    /// Number of chat messages kept in each session's buffered context.
    pub history_buffer_size: usize,
    /// Upper bound for executing a single step.
    pub step_timeout: Option<Duration>,
    /// Sessions whose agents stay cached; 0 means no limit.
    pub max_sessions: usize,
}

impl Default for ExecutionParams {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tool_turns: 5,
            history_buffer_size: 10,
            step_timeout: Some(Duration::from_secs(120)),
            max_sessions: 1000,
        }
    }
}

impl ExecutionParams {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tool_turns(mut self, max: usize) -> Self {
        self.max_tool_turns = max;
        self
    }

    pub fn with_history_buffer_size(mut self, size: usize) -> Self {
        self.history_buffer_size = size;
        self
    }

    pub fn with_step_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.step_timeout = timeout;
        self
    }

    pub fn with_max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = max;
        self
    }
}
