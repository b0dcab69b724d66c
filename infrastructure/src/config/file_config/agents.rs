//! Agent configuration from TOML (`[agents]` section)

use agentflow_application::ExecutionParams;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Raw agent configuration from TOML
///
/// # Example
///
/// ```toml
/// [agents]
/// max_tool_turns = 5
/// history_buffer_size = 10
/// step_timeout_secs = 120
/// max_sessions = 1000           # cached sessions; 0 = unbounded
/// tools_dir = "./tools"          # *_tools.json files
/// content_safety = true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAgentsConfig {
    /// Maximum model/tool round trips while executing one step
    pub max_tool_turns: usize,
    /// Chat messages kept in each session's context
    pub history_buffer_size: usize,
    /// Upper bound for one step; 0 disables the limit
    pub step_timeout_secs: u64,
    /// Sessions whose agents stay cached in memory; 0 disables the limit
    pub max_sessions: usize,
    /// Directory of `*_tools.json` catalogs merged over the built-in tools
    pub tools_dir: Option<PathBuf>,
    /// Screen submitted tasks with the content safety classifier
    pub content_safety: bool,
}

impl Default for FileAgentsConfig {
    fn default() -> Self {
        Self {
            max_tool_turns: 5,
            history_buffer_size: 10,
            step_timeout_secs: 120,
            max_sessions: 1000,
            tools_dir: None,
            content_safety: true,
        }
    }
}

impl FileAgentsConfig {
    pub fn to_execution_params(&self, temperature: f32) -> ExecutionParams {
        let timeout = (self.step_timeout_secs > 0).then(|| Duration::from_secs(self.step_timeout_secs));
        ExecutionParams::default()
            .with_temperature(temperature)
            .with_max_tool_turns(self.max_tool_turns)
            .with_history_buffer_size(self.history_buffer_size)
            .with_step_timeout(timeout)
            .with_max_sessions(self.max_sessions)
    }
}
