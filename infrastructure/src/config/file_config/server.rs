//! HTTP server configuration from TOML (`[server]` section)

use serde::{Deserialize, Serialize};

/// Raw server configuration from TOML
///
/// # Example
///
/// ```toml
/// [server]
/// bind = "0.0.0.0:8000"
/// frontend_url = "https://agentflow.example.com"
/// request_timeout_secs = 300
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileServerConfig {
    /// Socket address the API listens on
    pub bind: String,
    /// Origin allowed by CORS; any origin when unset
    pub frontend_url: Option<String>,
    /// Per-request timeout. Approving every step of a plan runs all of them
    /// inside one request, so keep this generous.
    pub request_timeout_secs: u64,
}

impl Default for FileServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
            frontend_url: None,
            request_timeout_secs: 600,
        }
    }
}
