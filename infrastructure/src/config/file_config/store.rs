//! Document store configuration from TOML (`[store]` section)

use crate::config::validation::{ConfigIssue, ConfigIssueCode, Severity};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which [`MemoryStore`](agentflow_application::MemoryStore) implementation backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Memory,
}

/// Raw store configuration from TOML
///
/// ```toml
/// [store]
/// backend = "sqlite"   # "sqlite" or "memory"
/// path = "agentflow.db"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStoreConfig {
    pub backend: String,
    /// SQLite database file, created if missing
    pub path: PathBuf,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            path: PathBuf::from("agentflow.db"),
        }
    }
}

impl FileStoreConfig {
    /// Parse the backend name, falling back to SQLite with a warning.
    pub fn parse_backend(&self) -> (StoreBackend, Vec<ConfigIssue>) {
        match self.backend.to_lowercase().as_str() {
            "sqlite" => (StoreBackend::Sqlite, vec![]),
            "memory" | "in_memory" | "in-memory" => (StoreBackend::Memory, vec![]),
            _ => {
                let issue = ConfigIssue {
                    severity: Severity::Warning,
                    code: ConfigIssueCode::InvalidEnumValue {
                        field: "store.backend".to_string(),
                        value: self.backend.clone(),
                        valid_values: vec!["sqlite".to_string(), "memory".to_string()],
                    },
                    message: format!(
                        "store.backend: unknown value '{}', falling back to 'sqlite'",
                        self.backend
                    ),
                };
                (StoreBackend::Sqlite, vec![issue])
            }
        }
    }
}
