//! Infrastructure layer for agentflow
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: the OpenAI-compatible LLM gateway, the
//! document stores, the JSONL event tracker, configuration file loading
//! and the tool catalog loader.

pub mod catalog;
pub mod config;
pub mod llm;
pub mod logging;
pub mod store;

// Re-export commonly used types
pub use catalog::{ToolCatalogLoader, ToolFileError};
pub use config::{
    ConfigIssue, ConfigIssueCode, ConfigLoader, FileAgentsConfig, FileConfig, FileHealthConfig,
    FileLlmConfig, FileLoggingConfig, FileServerConfig, FileStoreConfig, FileTelemetryConfig,
    Severity, StoreBackend,
};
pub use llm::OpenAiCompatibleGateway;
pub use logging::JsonlEventTracker;
pub use store::{InMemoryStore, SqliteMemoryStore, open_store};
