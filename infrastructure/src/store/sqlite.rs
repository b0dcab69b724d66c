//! SQLite-backed document store
//!
//! Every document lives in one `documents` table as a JSON payload, keyed
//! by `(user_id, data_type, id)`. `seq` keeps insertion order so steps and
//! messages come back in the order they were written; updates keep it.

use agentflow_application::{MemoryStore, StoreError};
use agentflow_domain::{
    AgentMessage, DataType, Document, MemoryRecord, Plan, PlanId, Session, SessionId, Step,
    StepId, StoredMessage, UserId,
};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::{debug, info};

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// Columns indexed next to the payload
#[derive(Default)]
struct Keys<'a> {
    session_id: Option<&'a str>,
    plan_id: Option<&'a str>,
    collection: Option<&'a str>,
}

pub struct SqliteMemoryStore {
    pool: SqlitePool,
}

impl SqliteMemoryStore {
    /// Open (or create) the database file and initialize the schema.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        info!("Opening SQLite document store: {}", path.display());
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(backend)?;
        Self::with_pool(pool).await
    }

    /// A private in-memory database. One connection, since every SQLite
    /// memory connection is its own database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(backend)?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.initialize_schema().await?;
        Ok(store)
    }

    async fn initialize_schema(&self) -> Result<(), StoreError> {
        debug!("Initializing database schema");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                data_type TEXT NOT NULL,
                session_id TEXT,
                plan_id TEXT,
                collection TEXT,
                payload TEXT NOT NULL,
                ts TEXT NOT NULL,
                UNIQUE (user_id, data_type, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        for index in [
            "CREATE INDEX IF NOT EXISTS idx_documents_session ON documents(user_id, session_id, data_type)",
            "CREATE INDEX IF NOT EXISTS idx_documents_plan ON documents(user_id, plan_id, data_type)",
            "CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(user_id, collection)",
        ] {
            sqlx::query(index).execute(&self.pool).await.map_err(backend)?;
        }

        debug!("Database schema initialized");
        Ok(())
    }

    /// Insert or replace a document, keeping its original position.
    async fn put<T: Document>(&self, user: &str, doc: &T, keys: Keys<'_>) -> Result<(), StoreError> {
        let payload = serde_json::to_string(doc)?;
        sqlx::query(
            r#"
            INSERT INTO documents (id, user_id, data_type, session_id, plan_id, collection, payload, ts)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id, data_type, id) DO UPDATE SET
                session_id = excluded.session_id,
                plan_id = excluded.plan_id,
                collection = excluded.collection,
                payload = excluded.payload,
                ts = excluded.ts
            "#,
        )
        .bind(doc.document_id())
        .bind(user)
        .bind(T::DATA_TYPE.as_str())
        .bind(keys.session_id.or(doc.session_key()))
        .bind(keys.plan_id)
        .bind(keys.collection)
        .bind(&payload)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }

    /// Replace an existing document; `NotFound` if it was never added.
    async fn replace<T: Document>(
        &self,
        user: &str,
        doc: &T,
        kind: &'static str,
    ) -> Result<(), StoreError> {
        let payload = serde_json::to_string(doc)?;
        let result = sqlx::query(
            "UPDATE documents SET payload = ?, ts = ? WHERE user_id = ? AND data_type = ? AND id = ?",
        )
        .bind(&payload)
        .bind(Utc::now().to_rfc3339())
        .bind(user)
        .bind(T::DATA_TYPE.as_str())
        .bind(doc.document_id())
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                kind,
                id: doc.document_id().to_string(),
            });
        }
        Ok(())
    }

    async fn get<T: Document>(&self, user: &str, id: &str) -> Result<Option<T>, StoreError> {
        let row = sqlx::query(
            "SELECT payload FROM documents WHERE user_id = ? AND data_type = ? AND id = ?",
        )
        .bind(user)
        .bind(T::DATA_TYPE.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        match row {
            Some(row) => {
                let payload: String = row.get("payload");
                Ok(Some(serde_json::from_str(&payload)?))
            }
            None => Ok(None),
        }
    }

    /// Documents of one type matching `filter` (a SQL condition on indexed
    /// columns with `?` placeholders), in insertion order.
    async fn list<T: Document>(
        &self,
        user: &str,
        filter: Option<(&str, &str)>,
        order: &str,
        limit: Option<usize>,
    ) -> Result<Vec<T>, StoreError> {
        let mut sql =
            String::from("SELECT payload FROM documents WHERE user_id = ? AND data_type = ?");
        if let Some((condition, _)) = filter {
            sql.push_str(" AND ");
            sql.push_str(condition);
        }
        sql.push_str(" ORDER BY seq ");
        sql.push_str(order);
        if limit.is_some() {
            sql.push_str(" LIMIT ?");
        }

        let mut query = sqlx::query(&sql).bind(user).bind(T::DATA_TYPE.as_str());
        if let Some((_, value)) = filter {
            query = query.bind(value);
        }
        if let Some(limit) = limit {
            query = query.bind(limit as i64);
        }

        let rows = query.fetch_all(&self.pool).await.map_err(backend)?;
        rows.iter()
            .map(|row| {
                let payload: String = row.get("payload");
                serde_json::from_str(&payload).map_err(StoreError::from)
            })
            .collect()
    }

    async fn delete_where(&self, user: &str, condition: &str, value: &str) -> Result<u64, StoreError> {
        let sql = format!("DELETE FROM documents WHERE user_id = ? AND {condition}");
        let result = sqlx::query(&sql)
            .bind(user)
            .bind(value)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl MemoryStore for SqliteMemoryStore {
    async fn add_session(&self, session: &Session) -> Result<(), StoreError> {
        self.put(session.user_id.as_str(), session, Keys::default()).await
    }

    async fn get_session(
        &self,
        user: &UserId,
        session_id: &SessionId,
    ) -> Result<Option<Session>, StoreError> {
        self.get(user.as_str(), session_id.as_str()).await
    }

    async fn get_all_sessions(&self, user: &UserId) -> Result<Vec<Session>, StoreError> {
        self.list(user.as_str(), None, "ASC", None).await
    }

    async fn add_plan(&self, plan: &Plan) -> Result<(), StoreError> {
        let keys = Keys {
            plan_id: Some(plan.id.as_str()),
            ..Keys::default()
        };
        self.put(plan.user_id.as_str(), plan, keys).await
    }

    async fn update_plan(&self, plan: &Plan) -> Result<(), StoreError> {
        self.replace(plan.user_id.as_str(), plan, "Plan").await
    }

    async fn get_plan(&self, user: &UserId, plan_id: &PlanId) -> Result<Option<Plan>, StoreError> {
        self.get(user.as_str(), plan_id.as_str()).await
    }

    async fn get_plan_by_session(
        &self,
        user: &UserId,
        session_id: &SessionId,
    ) -> Result<Option<Plan>, StoreError> {
        let mut plans: Vec<Plan> = self
            .list(
                user.as_str(),
                Some(("session_id = ?", session_id.as_str())),
                "DESC",
                Some(1),
            )
            .await?;
        Ok(plans.pop())
    }

    async fn get_all_plans(&self, user: &UserId) -> Result<Vec<Plan>, StoreError> {
        self.list(user.as_str(), None, "ASC", None).await
    }

    async fn add_step(&self, step: &Step) -> Result<(), StoreError> {
        let keys = Keys {
            plan_id: Some(step.plan_id.as_str()),
            ..Keys::default()
        };
        self.put(step.user_id.as_str(), step, keys).await
    }

    async fn update_step(&self, step: &Step) -> Result<(), StoreError> {
        self.replace(step.user_id.as_str(), step, "Step").await
    }

    async fn get_step(&self, user: &UserId, step_id: &StepId) -> Result<Option<Step>, StoreError> {
        self.get(user.as_str(), step_id.as_str()).await
    }

    async fn get_steps_by_plan(
        &self,
        user: &UserId,
        plan_id: &PlanId,
    ) -> Result<Vec<Step>, StoreError> {
        self.list(user.as_str(), Some(("plan_id = ?", plan_id.as_str())), "ASC", None)
            .await
    }

    async fn add_agent_message(&self, message: &AgentMessage) -> Result<(), StoreError> {
        let keys = Keys {
            plan_id: Some(message.plan_id.as_str()),
            ..Keys::default()
        };
        self.put(message.user_id.as_str(), message, keys).await
    }

    async fn get_agent_messages_by_session(
        &self,
        user: &UserId,
        session_id: &SessionId,
    ) -> Result<Vec<AgentMessage>, StoreError> {
        self.list(
            user.as_str(),
            Some(("session_id = ?", session_id.as_str())),
            "ASC",
            None,
        )
        .await
    }

    async fn add_message(&self, message: &StoredMessage) -> Result<(), StoreError> {
        self.put(message.user_id.as_str(), message, Keys::default()).await
    }

    async fn get_messages(
        &self,
        user: &UserId,
        session_id: &SessionId,
        limit: Option<usize>,
    ) -> Result<Vec<StoredMessage>, StoreError> {
        let filter = Some(("session_id = ?", session_id.as_str()));
        match limit {
            Some(limit) => {
                let mut latest: Vec<StoredMessage> =
                    self.list(user.as_str(), filter, "DESC", Some(limit)).await?;
                latest.reverse();
                Ok(latest)
            }
            None => self.list(user.as_str(), filter, "ASC", None).await,
        }
    }

    async fn get_all_items(&self, user: &UserId) -> Result<Vec<Value>, StoreError> {
        let rows = sqlx::query(
            "SELECT data_type, payload FROM documents WHERE user_id = ? ORDER BY seq ASC",
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.iter()
            .map(|row| {
                let data_type: String = row.get("data_type");
                let payload: String = row.get("payload");
                let mut value: Value = serde_json::from_str(&payload)?;
                if let Value::Object(map) = &mut value {
                    map.insert("data_type".into(), Value::String(data_type));
                }
                Ok(value)
            })
            .collect()
    }

    async fn delete_all_items(&self, user: &UserId) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE user_id = ?")
            .bind(user.as_str())
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        info!("Deleted {} documents for user {}", result.rows_affected(), user);
        Ok(result.rows_affected())
    }

    async fn upsert_memory_record(
        &self,
        user: &UserId,
        record: &MemoryRecord,
    ) -> Result<(), StoreError> {
        let keys = Keys {
            collection: Some(record.collection.as_str()),
            ..Keys::default()
        };
        self.put(user.as_str(), record, keys).await
    }

    async fn get_memory_record(
        &self,
        user: &UserId,
        collection: &str,
        key: &str,
    ) -> Result<Option<MemoryRecord>, StoreError> {
        self.get(user.as_str(), &MemoryRecord::record_id(collection, key))
            .await
    }

    async fn get_memory_records(
        &self,
        user: &UserId,
        collection: &str,
    ) -> Result<Vec<MemoryRecord>, StoreError> {
        self.list(user.as_str(), Some(("collection = ?", collection)), "ASC", None)
            .await
    }

    async fn remove_memory_record(
        &self,
        user: &UserId,
        collection: &str,
        key: &str,
    ) -> Result<bool, StoreError> {
        let id = MemoryRecord::record_id(collection, key);
        let deleted = self
            .delete_where(
                user.as_str(),
                "data_type = 'memory_record' AND id = ?",
                &id,
            )
            .await?;
        Ok(deleted > 0)
    }

    async fn get_collections(&self, user: &UserId) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query(
            "SELECT DISTINCT collection FROM documents \
             WHERE user_id = ? AND data_type = ? AND collection IS NOT NULL ORDER BY collection",
        )
        .bind(user.as_str())
        .bind(DataType::MemoryRecord.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        Ok(rows
            .iter()
            .map(|row| row.get::<String, _>("collection"))
            .collect())
    }

    async fn delete_collection(&self, user: &UserId, collection: &str) -> Result<u64, StoreError> {
        self.delete_where(
            user.as_str(),
            "data_type = 'memory_record' AND collection = ?",
            collection,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentflow_domain::{AgentType, ChatMessage, PlanStatus, StepStatus};

    async fn store() -> SqliteMemoryStore {
        SqliteMemoryStore::in_memory().await.unwrap()
    }

    fn plan(session: &str) -> Plan {
        Plan::new(session, "u1", "Onboard Jessica")
    }

    #[tokio::test]
    async fn test_plan_round_trip_and_update() {
        let store = store().await;
        let mut plan = plan("s1");
        store.add_plan(&plan).await.unwrap();

        plan.overall_status = PlanStatus::Completed;
        store.update_plan(&plan).await.unwrap();

        let loaded = store.get_plan(&UserId::new("u1"), &plan.id).await.unwrap().unwrap();
        assert_eq!(loaded.overall_status, PlanStatus::Completed);
        // Partitioned by user
        assert!(store.get_plan(&UserId::new("u2"), &plan.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_step_is_not_found() {
        let store = store().await;
        let step = Step::new(&plan("s1"), "a", AgentType::Hr);
        let err = store.update_step(&step).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { kind: "Step", .. }));
    }

    #[tokio::test]
    async fn test_steps_keep_insertion_order_after_update() {
        let store = store().await;
        let plan = plan("s1");
        store.add_plan(&plan).await.unwrap();
        let mut steps: Vec<Step> = ["first", "second", "third"]
            .into_iter()
            .map(|a| Step::new(&plan, a, AgentType::Hr))
            .collect();
        for step in &steps {
            store.add_step(step).await.unwrap();
        }

        steps[0].status = StepStatus::Completed;
        store.update_step(&steps[0]).await.unwrap();

        let loaded = store.get_steps_by_plan(&UserId::new("u1"), &plan.id).await.unwrap();
        let actions: Vec<_> = loaded.iter().map(|s| s.action.as_str()).collect();
        assert_eq!(actions, ["first", "second", "third"]);
        assert_eq!(loaded[0].status, StepStatus::Completed);
    }

    #[tokio::test]
    async fn test_latest_plan_by_session() {
        let store = store().await;
        let older = plan("s1");
        let newer = plan("s1");
        store.add_plan(&older).await.unwrap();
        store.add_plan(&newer).await.unwrap();
        store.add_plan(&plan("s2")).await.unwrap();

        let latest = store
            .get_plan_by_session(&UserId::new("u1"), &SessionId::new("s1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.id, newer.id);
        assert_eq!(store.get_all_plans(&UserId::new("u1")).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_messages_limit_returns_latest_oldest_first() {
        let store = store().await;
        let (s, u) = (SessionId::new("s1"), UserId::new("u1"));
        for i in 0..5 {
            let msg = StoredMessage::new(&s, &u, AgentType::Human, &ChatMessage::user(format!("m{i}")));
            store.add_message(&msg).await.unwrap();
        }

        let last_two = store.get_messages(&u, &s, Some(2)).await.unwrap();
        let texts: Vec<_> = last_two.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(texts, ["m3", "m4"]);
        assert_eq!(store.get_messages(&u, &s, None).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_all_items_and_delete() {
        let store = store().await;
        let u = UserId::new("u1");
        let plan = plan("s1");
        store
            .add_session(&Session::new(SessionId::new("s1"), u.clone()))
            .await
            .unwrap();
        store.add_plan(&plan).await.unwrap();
        store
            .add_agent_message(&AgentMessage::new(
                &SessionId::new("s1"),
                &u,
                &plan.id,
                AgentType::Planner,
                "hello",
            ))
            .await
            .unwrap();

        let items = store.get_all_items(&u).await.unwrap();
        let kinds: Vec<_> = items.iter().map(|i| i["data_type"].as_str().unwrap()).collect();
        assert_eq!(kinds, ["session", "plan", "agent_message"]);

        assert_eq!(store.delete_all_items(&u).await.unwrap(), 3);
        assert!(store.get_all_items(&u).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_records_and_collections() {
        let store = store().await;
        let u = UserId::new("u1");
        let a = MemoryRecord::new("docs", "a", "alpha").with_embedding(vec![1.0, 0.0]);
        let b = MemoryRecord::new("docs", "b", "beta").with_embedding(vec![0.0, 1.0]);
        let c = MemoryRecord::new("notes", "c", "gamma");
        for r in [&a, &b, &c] {
            store.upsert_memory_record(&u, r).await.unwrap();
        }

        assert_eq!(store.get_collections(&u).await.unwrap(), ["docs", "notes"]);
        assert!(store.does_collection_exist(&u, "docs").await.unwrap());

        let matches = store
            .get_nearest_matches(&u, "docs", &[0.9, 0.1], 1, 0.0)
            .await
            .unwrap();
        assert_eq!(matches[0].0.key, "a");

        assert!(store.remove_memory_record(&u, "docs", "a").await.unwrap());
        assert!(!store.remove_memory_record(&u, "docs", "a").await.unwrap());
        assert_eq!(store.delete_collection(&u, "docs").await.unwrap(), 1);
        assert!(store.get_memory_record(&u, "notes", "c").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agentflow.db");
        let plan = plan("s1");
        {
            let store = SqliteMemoryStore::open(&path).await.unwrap();
            store.add_plan(&plan).await.unwrap();
        }
        let store = SqliteMemoryStore::open(&path).await.unwrap();
        assert!(store.get_plan(&UserId::new("u1"), &plan.id).await.unwrap().is_some());
    }
}
