//! In-memory document store
//!
//! Same semantics as the SQLite store without persistence. Used by
//! `store.backend = "memory"` and in tests.

use agentflow_application::{MemoryStore, StoreError};
use agentflow_domain::{
    AgentMessage, DataType, Document, MemoryRecord, Plan, PlanId, Session, SessionId, Step,
    StepId, StoredMessage, UserId,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

struct Entry {
    data_type: DataType,
    id: String,
    session_id: Option<String>,
    plan_id: Option<String>,
    collection: Option<String>,
    payload: Value,
}

impl Entry {
    fn decode<T: Document>(&self) -> Result<T, StoreError> {
        Ok(serde_json::from_value(self.payload.clone())?)
    }
}

/// Documents per user, in insertion order.
#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<UserId, Vec<Entry>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn put<T: Document>(
        &self,
        user: &UserId,
        doc: &T,
        plan_id: Option<&str>,
        collection: Option<&str>,
    ) -> Result<(), StoreError> {
        let entry = Entry {
            data_type: T::DATA_TYPE,
            id: doc.document_id().to_string(),
            session_id: doc.session_key().map(str::to_string),
            plan_id: plan_id.map(str::to_string),
            collection: collection.map(str::to_string),
            payload: serde_json::to_value(doc)?,
        };
        let mut users = self.users.write().await;
        let docs = users.entry(user.clone()).or_default();
        match docs
            .iter_mut()
            .find(|e| e.data_type == entry.data_type && e.id == entry.id)
        {
            Some(existing) => *existing = entry,
            None => docs.push(entry),
        }
        Ok(())
    }

    async fn replace<T: Document>(
        &self,
        user: &UserId,
        doc: &T,
        kind: &'static str,
    ) -> Result<(), StoreError> {
        let payload = serde_json::to_value(doc)?;
        let mut users = self.users.write().await;
        let existing = users.get_mut(user).and_then(|docs| {
            docs.iter_mut()
                .find(|e| e.data_type == T::DATA_TYPE && e.id == doc.document_id())
        });
        match existing {
            Some(entry) => {
                entry.payload = payload;
                Ok(())
            }
            None => Err(StoreError::NotFound {
                kind,
                id: doc.document_id().to_string(),
            }),
        }
    }

    async fn get<T: Document>(&self, user: &UserId, id: &str) -> Result<Option<T>, StoreError> {
        let users = self.users.read().await;
        users
            .get(user)
            .and_then(|docs| docs.iter().find(|e| e.data_type == T::DATA_TYPE && e.id == id))
            .map(Entry::decode)
            .transpose()
    }

    async fn list<T: Document>(
        &self,
        user: &UserId,
        filter: impl Fn(&Entry) -> bool,
    ) -> Result<Vec<T>, StoreError> {
        let users = self.users.read().await;
        let Some(docs) = users.get(user) else {
            return Ok(Vec::new());
        };
        docs.iter()
            .filter(|e| e.data_type == T::DATA_TYPE && filter(e))
            .map(Entry::decode)
            .collect()
    }

    async fn remove(&self, user: &UserId, predicate: impl Fn(&Entry) -> bool) -> u64 {
        let mut users = self.users.write().await;
        let Some(docs) = users.get_mut(user) else {
            return 0;
        };
        let before = docs.len();
        docs.retain(|e| !predicate(e));
        (before - docs.len()) as u64
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn add_session(&self, session: &Session) -> Result<(), StoreError> {
        self.put(&session.user_id, session, None, None).await
    }

    async fn get_session(
        &self,
        user: &UserId,
        session_id: &SessionId,
    ) -> Result<Option<Session>, StoreError> {
        self.get(user, session_id.as_str()).await
    }

    async fn get_all_sessions(&self, user: &UserId) -> Result<Vec<Session>, StoreError> {
        self.list(user, |_| true).await
    }

    async fn add_plan(&self, plan: &Plan) -> Result<(), StoreError> {
        self.put(&plan.user_id, plan, Some(plan.id.as_str()), None).await
    }

    async fn update_plan(&self, plan: &Plan) -> Result<(), StoreError> {
        self.replace(&plan.user_id, plan, "Plan").await
    }

    async fn get_plan(&self, user: &UserId, plan_id: &PlanId) -> Result<Option<Plan>, StoreError> {
        self.get(user, plan_id.as_str()).await
    }

    async fn get_plan_by_session(
        &self,
        user: &UserId,
        session_id: &SessionId,
    ) -> Result<Option<Plan>, StoreError> {
        let mut plans: Vec<Plan> = self
            .list(user, |e| e.session_id.as_deref() == Some(session_id.as_str()))
            .await?;
        Ok(plans.pop())
    }

    async fn get_all_plans(&self, user: &UserId) -> Result<Vec<Plan>, StoreError> {
        self.list(user, |_| true).await
    }

    async fn add_step(&self, step: &Step) -> Result<(), StoreError> {
        self.put(&step.user_id, step, Some(step.plan_id.as_str()), None).await
    }

    async fn update_step(&self, step: &Step) -> Result<(), StoreError> {
        self.replace(&step.user_id, step, "Step").await
    }

    async fn get_step(&self, user: &UserId, step_id: &StepId) -> Result<Option<Step>, StoreError> {
        self.get(user, step_id.as_str()).await
    }

    async fn get_steps_by_plan(
        &self,
        user: &UserId,
        plan_id: &PlanId,
    ) -> Result<Vec<Step>, StoreError> {
        self.list(user, |e| e.plan_id.as_deref() == Some(plan_id.as_str()))
            .await
    }

    async fn add_agent_message(&self, message: &AgentMessage) -> Result<(), StoreError> {
        self.put(&message.user_id, message, Some(message.plan_id.as_str()), None)
            .await
    }

    async fn get_agent_messages_by_session(
        &self,
        user: &UserId,
        session_id: &SessionId,
    ) -> Result<Vec<AgentMessage>, StoreError> {
        self.list(user, |e| e.session_id.as_deref() == Some(session_id.as_str()))
            .await
    }

    async fn add_message(&self, message: &StoredMessage) -> Result<(), StoreError> {
        self.put(&message.user_id, message, None, None).await
    }

    async fn get_messages(
        &self,
        user: &UserId,
        session_id: &SessionId,
        limit: Option<usize>,
    ) -> Result<Vec<StoredMessage>, StoreError> {
        let mut messages: Vec<StoredMessage> = self
            .list(user, |e| e.session_id.as_deref() == Some(session_id.as_str()))
            .await?;
        if let Some(limit) = limit
            && messages.len() > limit
        {
            messages.drain(..messages.len() - limit);
        }
        Ok(messages)
    }

    async fn get_all_items(&self, user: &UserId) -> Result<Vec<Value>, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .get(user)
            .map(|docs| {
                docs.iter()
                    .map(|e| {
                        let mut value = e.payload.clone();
                        if let Value::Object(map) = &mut value {
                            map.insert("data_type".into(), Value::String(e.data_type.to_string()));
                        }
                        value
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn delete_all_items(&self, user: &UserId) -> Result<u64, StoreError> {
        Ok(self
            .users
            .write()
            .await
            .remove(user)
            .map(|docs| docs.len() as u64)
            .unwrap_or(0))
    }

    async fn upsert_memory_record(
        &self,
        user: &UserId,
        record: &MemoryRecord,
    ) -> Result<(), StoreError> {
        self.put(user, record, None, Some(record.collection.as_str()))
            .await
    }

    async fn get_memory_record(
        &self,
        user: &UserId,
        collection: &str,
        key: &str,
    ) -> Result<Option<MemoryRecord>, StoreError> {
        self.get(user, &MemoryRecord::record_id(collection, key)).await
    }

    async fn get_memory_records(
        &self,
        user: &UserId,
        collection: &str,
    ) -> Result<Vec<MemoryRecord>, StoreError> {
        self.list(user, |e| e.collection.as_deref() == Some(collection))
            .await
    }

    async fn remove_memory_record(
        &self,
        user: &UserId,
        collection: &str,
        key: &str,
    ) -> Result<bool, StoreError> {
        let id = MemoryRecord::record_id(collection, key);
        let removed = self
            .remove(user, |e| e.data_type == DataType::MemoryRecord && e.id == id)
            .await;
        Ok(removed > 0)
    }

    async fn get_collections(&self, user: &UserId) -> Result<Vec<String>, StoreError> {
        let users = self.users.read().await;
        let mut collections: Vec<String> = users
            .get(user)
            .into_iter()
            .flatten()
            .filter(|e| e.data_type == DataType::MemoryRecord)
            .filter_map(|e| e.collection.clone())
            .collect();
        collections.sort();
        collections.dedup();
        Ok(collections)
    }

    async fn delete_collection(&self, user: &UserId, collection: &str) -> Result<u64, StoreError> {
        Ok(self
            .remove(user, |e| {
                e.data_type == DataType::MemoryRecord && e.collection.as_deref() == Some(collection)
            })
            .await)
    }
}
