//! Session entity

use crate::plan::value_objects::{SessionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user's conversation session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub current_status: String,
    #[serde(default)]
    pub message_to_user: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Session {
    pub fn new(id: SessionId, user_id: UserId) -> Self {
        Self {
            id,
            user_id,
            current_status: "active".to_string(),
            message_to_user: None,
            timestamp: Utc::now(),
        }
    }
}
