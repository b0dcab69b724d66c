//! Configuration file loading for agentflow
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. Environment: `AGENTFLOW_*`, nested with `__` (`AGENTFLOW_LLM__MODEL`)
//! 2. `--config <path>` specified file
//! 3. Project root: `./agentflow.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/agentflow/config.toml`
//! 5. Default values

mod file_config;
mod loader;
mod validation;

pub use file_config::{
    FileAgentsConfig, FileConfig, FileHealthConfig, FileLlmConfig, FileLoggingConfig,
    FileServerConfig, FileStoreConfig, FileTelemetryConfig, StoreBackend,
};
pub use loader::ConfigLoader;
pub use validation::{ConfigIssue, ConfigIssueCode, Severity};
