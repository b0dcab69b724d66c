//! Document store adapters implementing [`MemoryStore`]

pub mod in_memory;
pub mod sqlite;

pub use in_memory::InMemoryStore;
pub use sqlite::SqliteMemoryStore;

use crate::config::{FileStoreConfig, StoreBackend};
use agentflow_application::{MemoryStore, StoreError};
use std::sync::Arc;
use tracing::{info, warn};

/// Open the store selected by `[store]`.
pub async fn open_store(config: &FileStoreConfig) -> Result<Arc<dyn MemoryStore>, StoreError> {
    let (backend, issues) = config.parse_backend();
    for issue in issues {
        warn!("{}", issue.message);
    }

    match backend {
        StoreBackend::Sqlite => {
            info!("Opening SQLite store at {}", config.path.display());
            Ok(Arc::new(SqliteMemoryStore::open(&config.path).await?))
        }
        StoreBackend::Memory => {
            info!("Using in-memory store; state is lost on restart");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}
