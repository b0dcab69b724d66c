//! `[telemetry]`, `[logging]` and `[health]` sections

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Tracked workflow events are appended as JSON lines when a file is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTelemetryConfig {
    pub events_file: Option<PathBuf>,
}

/// Log file output in addition to stderr.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Directory for daily rolling log files; stderr only when unset
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for FileLoggingConfig {
    fn default() -> Self {
        Self {
            directory: None,
            file_prefix: "agentflow.log".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileHealthConfig {
    /// `/healthz?code=<password>` returns the detailed JSON summary
    pub password: Option<String>,
}
