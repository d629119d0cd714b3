//! Local storage selection with an in-memory fallback.
//!
//! The CLI prefers the SQLite database in the data directory. When it cannot
//! be opened (read-only home, locked file, ...) the session still runs, just
//! without durability.

use std::path::Path;

use tracing::warn;

use murmur_core::storage::kv_store::KvStore;
use murmur_core::storage::memory::InMemoryKvStore;
use murmur_types::error::{ChatError, StoreError};

use crate::sqlite::kv::SqliteKvStore;
use crate::sqlite::pool::DatabasePool;

/// The key-value medium backing identity and history for this process.
#[derive(Clone)]
pub enum LocalKvStore {
    Sqlite(SqliteKvStore),
    Memory(InMemoryKvStore),
}

impl LocalKvStore {
    /// Open the SQLite store in `data_dir`, falling back to memory on failure.
    pub async fn open(data_dir: &Path) -> Self {
        if let Err(e) = tokio::fs::create_dir_all(data_dir).await {
            let err = ChatError::IdentityUnavailable(format!(
                "cannot create {}: {e}",
                data_dir.display()
            ));
            warn!(error = %err, "Falling back to in-memory storage");
            return Self::Memory(InMemoryKvStore::new());
        }

        match DatabasePool::open_in(data_dir).await {
            Ok(pool) => Self::Sqlite(SqliteKvStore::new(pool)),
            Err(e) => {
                let err = ChatError::IdentityUnavailable(e.to_string());
                warn!(error = %err, "Falling back to in-memory storage");
                Self::Memory(InMemoryKvStore::new())
            }
        }
    }

    /// Whether values written through this store outlive the process.
    pub fn is_durable(&self) -> bool {
        matches!(self, Self::Sqlite(_))
    }
}

impl KvStore for LocalKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self {
            Self::Sqlite(store) => store.get(key).await,
            Self::Memory(store) => store.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        match self {
            Self::Sqlite(store) => store.set(key, value).await,
            Self::Memory(store) => store.set(key, value).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        match self {
            Self::Sqlite(store) => store.delete(key).await,
            Self::Memory(store) => store.delete(key).await,
        }
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        match self {
            Self::Sqlite(store) => store.list_keys(prefix).await,
            Self::Memory(store) => store.list_keys(prefix).await,
        }
    }
}
