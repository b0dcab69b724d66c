//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly; [`FileConfig::validate`] reports what
//! cannot be used.

mod agents;
mod llm;
mod observability;
mod server;
mod store;

pub use agents::FileAgentsConfig;
pub use llm::FileLlmConfig;
pub use observability::{FileHealthConfig, FileLoggingConfig, FileTelemetryConfig};
pub use server::FileServerConfig;
pub use store::{FileStoreConfig, StoreBackend};

use super::validation::ConfigIssue;
use serde::{Deserialize, Serialize};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub server: FileServerConfig,
    pub llm: FileLlmConfig,
    pub store: FileStoreConfig,
    pub agents: FileAgentsConfig,
    pub telemetry: FileTelemetryConfig,
    pub logging: FileLoggingConfig,
    pub health: FileHealthConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.llm.model.trim().is_empty() {
            issues.push(ConfigIssue::empty("llm.model"));
        }
        if self.llm.base_url.trim().is_empty() {
            issues.push(ConfigIssue::empty("llm.base_url"));
        }
        if self.llm.max_retries == 0 {
            issues.push(ConfigIssue::zero("llm.max_retries"));
        }
        if self.server.bind.trim().is_empty() {
            issues.push(ConfigIssue::empty("server.bind"));
        }
        if self.agents.history_buffer_size == 0 {
            issues.push(ConfigIssue::zero("agents.history_buffer_size"));
        }
        issues.extend(self.store.parse_backend().1);

        issues
    }
}
