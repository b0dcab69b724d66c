//! Chat-completions endpoint configuration from TOML (`[llm]` section)

use serde::{Deserialize, Serialize};

/// Raw LLM configuration from TOML
///
/// # Example
///
/// ```toml
/// [llm]
/// base_url = "https://my-resource.openai.azure.com"
/// model = "gpt-4o"                 # deployment name for Azure
/// api_version = "2024-08-01-preview"
/// api_key_env = "AZURE_OPENAI_API_KEY"
/// ```
///
/// Setting `api_version` selects the Azure URL layout and `api-key` header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLlmConfig {
    /// Base URL of the OpenAI-compatible API
    pub base_url: String,
    /// Model (or Azure deployment) name
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Direct API key (not recommended; use the env var instead)
    pub api_key: Option<String>,
    /// Azure OpenAI API version
    pub api_version: Option<String>,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum completion tokens per response
    pub max_tokens: Option<u32>,
    /// Attempts per request, including the first one
    pub max_retries: u32,
    /// Backoff before the first retry; doubles with every attempt
    pub initial_backoff_ms: u64,
    /// Ceiling for the retry backoff
    pub max_backoff_ms: u64,
    /// Timeout for a single HTTP request
    pub timeout_secs: u64,
}

impl Default for FileLlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            api_version: None,
            temperature: 0.0,
            max_tokens: None,
            max_retries: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 30_000,
            timeout_secs: 120,
        }
    }
}

impl FileLlmConfig {
    /// The configured key, falling back to the named environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.is_empty())
    }

    pub fn is_azure(&self) -> bool {
        self.api_version.is_some()
    }
}
