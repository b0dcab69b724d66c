//! Memory store port
//!
//! The document store holding sessions, plans, steps, agent messages, chat
//! history and memory records. Every operation is scoped to a user, which is
//! the partition key.

use agentflow_domain::{
    AgentMessage, MemoryRecord, Plan, PlanId, Session, SessionId, Step, StepId, StoredMessage,
    UserId, keyword_matches, nearest_matches,
};
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors raised by store adapters
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
}

/// Document store for session state
#[async_trait]
pub trait MemoryStore: Send + Sync {
    // ==================== Sessions ====================

    async fn add_session(&self, session: &Session) -> Result<(), StoreError>;

    async fn get_session(
        &self,
        user: &UserId,
        session_id: &SessionId,
    ) -> Result<Option<Session>, StoreError>;

    async fn get_all_sessions(&self, user: &UserId) -> Result<Vec<Session>, StoreError>;

    // ==================== Plans ====================

    async fn add_plan(&self, plan: &Plan) -> Result<(), StoreError>;

    async fn update_plan(&self, plan: &Plan) -> Result<(), StoreError>;

    async fn get_plan(&self, user: &UserId, plan_id: &PlanId) -> Result<Option<Plan>, StoreError>;

    /// The most recent plan of a session.
    async fn get_plan_by_session(
        &self,
        user: &UserId,
        session_id: &SessionId,
    ) -> Result<Option<Plan>, StoreError>;

    async fn get_all_plans(&self, user: &UserId) -> Result<Vec<Plan>, StoreError>;

    // ==================== Steps ====================

    async fn add_step(&self, step: &Step) -> Result<(), StoreError>;

    async fn update_step(&self, step: &Step) -> Result<(), StoreError>;

    async fn get_step(&self, user: &UserId, step_id: &StepId) -> Result<Option<Step>, StoreError>;

    /// Steps of a plan in the order they were added.
    async fn get_steps_by_plan(
        &self,
        user: &UserId,
        plan_id: &PlanId,
    ) -> Result<Vec<Step>, StoreError>;

    // ==================== Messages ====================

    async fn add_agent_message(&self, message: &AgentMessage) -> Result<(), StoreError>;

    async fn get_agent_messages_by_session(
        &self,
        user: &UserId,
        session_id: &SessionId,
    ) -> Result<Vec<AgentMessage>, StoreError>;

    async fn add_message(&self, message: &StoredMessage) -> Result<(), StoreError>;

    /// Chat messages of a session, oldest first. With a limit, only the
    /// most recent `limit` messages are returned.
    async fn get_messages(
        &self,
        user: &UserId,
        session_id: &SessionId,
        limit: Option<usize>,
    ) -> Result<Vec<StoredMessage>, StoreError>;

    // ==================== Bulk ====================

    /// Every document of the user as raw JSON, including its `data_type`.
    async fn get_all_items(&self, user: &UserId) -> Result<Vec<Value>, StoreError>;

    /// Delete every document of the user; returns the number removed.
    async fn delete_all_items(&self, user: &UserId) -> Result<u64, StoreError>;

    // ==================== Memory records ====================

    async fn upsert_memory_record(
        &self,
        user: &UserId,
        record: &MemoryRecord,
    ) -> Result<(), StoreError>;

    async fn get_memory_record(
        &self,
        user: &UserId,
        collection: &str,
        key: &str,
    ) -> Result<Option<MemoryRecord>, StoreError>;

    async fn get_memory_records(
        &self,
        user: &UserId,
        collection: &str,
    ) -> Result<Vec<MemoryRecord>, StoreError>;

    /// Returns `true` if a record was removed.
    async fn remove_memory_record(
        &self,
        user: &UserId,
        collection: &str,
        key: &str,
    ) -> Result<bool, StoreError>;

    async fn get_collections(&self, user: &UserId) -> Result<Vec<String>, StoreError>;

    async fn delete_collection(&self, user: &UserId, collection: &str) -> Result<u64, StoreError>;

    async fn does_collection_exist(
        &self,
        user: &UserId,
        collection: &str,
    ) -> Result<bool, StoreError> {
        Ok(self
            .get_collections(user)
            .await?
            .iter()
            .any(|c| c == collection))
    }

    /// Records of a collection most similar to `embedding`, best first.
    async fn get_nearest_matches(
        &self,
        user: &UserId,
        collection: &str,
        embedding: &[f32],
        limit: usize,
        min_relevance: f32,
    ) -> Result<Vec<(MemoryRecord, f32)>, StoreError> {
        let records = self.get_memory_records(user, collection).await?;
        Ok(nearest_matches(&records, embedding, limit, min_relevance)
            .into_iter()
            .map(|(r, score)| (r.clone(), score))
            .collect())
    }

    /// Records from every collection of the user that share words with
    /// `query`, best first.
    async fn search_memory_records(
        &self,
        user: &UserId,
        query: &str,
        limit: usize,
    ) -> Result<Vec<(MemoryRecord, f32)>, StoreError> {
        let mut records = Vec::new();
        for collection in self.get_collections(user).await? {
            records.extend(self.get_memory_records(user, &collection).await?);
        }
        Ok(keyword_matches(&records, query, limit)
            .into_iter()
            .map(|(r, score)| (r.clone(), score))
            .collect())
    }
}
