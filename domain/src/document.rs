//! Stored document kinds.
//!
//! Everything the store persists is a JSON document tagged with a
//! [`DataType`] and partitioned by user id.

use crate::memory::record::MemoryRecord;
use crate::messages::chat::{AgentMessage, StoredMessage};
use crate::plan::entities::{Plan, Step};
use crate::session::entities::Session;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Discriminator stored in every document's `data_type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Session,
    Plan,
    Step,
    AgentMessage,
    Message,
    MemoryRecord,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Session => "session",
            DataType::Plan => "plan",
            DataType::Step => "step",
            DataType::AgentMessage => "agent_message",
            DataType::Message => "message",
            DataType::MemoryRecord => "memory_record",
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A type that is stored as a document.
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    const DATA_TYPE: DataType;

    fn document_id(&self) -> &str;

    /// Session the document belongs to, if any.
    fn session_key(&self) -> Option<&str>;
}

impl Document for Session {
    const DATA_TYPE: DataType = DataType::Session;

    fn document_id(&self) -> &str {
        self.id.as_str()
    }

    fn session_key(&self) -> Option<&str> {
        Some(self.id.as_str())
    }
}

impl Document for Plan {
    const DATA_TYPE: DataType = DataType::Plan;

    fn document_id(&self) -> &str {
        self.id.as_str()
    }

    fn session_key(&self) -> Option<&str> {
        Some(self.session_id.as_str())
    }
}

impl Document for Step {
    const DATA_TYPE: DataType = DataType::Step;

    fn document_id(&self) -> &str {
        self.id.as_str()
    }

    fn session_key(&self) -> Option<&str> {
        Some(self.session_id.as_str())
    }
}

impl Document for AgentMessage {
    const DATA_TYPE: DataType = DataType::AgentMessage;

    fn document_id(&self) -> &str {
        &self.id
    }

    fn session_key(&self) -> Option<&str> {
        Some(self.session_id.as_str())
    }
}

impl Document for StoredMessage {
    const DATA_TYPE: DataType = DataType::Message;

    fn document_id(&self) -> &str {
        &self.id
    }

    fn session_key(&self) -> Option<&str> {
        Some(self.session_id.as_str())
    }
}

impl Document for MemoryRecord {
    const DATA_TYPE: DataType = DataType::MemoryRecord;

    fn document_id(&self) -> &str {
        &self.id
    }

    fn session_key(&self) -> Option<&str> {
        None
    }
}
