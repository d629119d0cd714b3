//! Key-value store trait.
//!
//! Defines the interface for the local persistence medium.
//! Implementations live in murmur-infra (SQLite) and in
//! [`super::memory`] (in-process).

use std::future::Future;
use std::sync::Arc;

use murmur_types::error::StoreError;

/// Trait for string-keyed persistent storage of string values.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
/// Callers own the key namespaces; the store treats keys as opaque.
pub trait KvStore: Send + Sync {
    /// Get a value by key. Returns None if the key does not exist.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    /// Set a value for a key (upsert).
    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Delete a key. No-op if key does not exist.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// List all keys starting with `prefix`, sorted.
    fn list_keys(&self, prefix: &str)
    -> impl Future<Output = Result<Vec<String>, StoreError>> + Send;
}

impl<T: KvStore> KvStore for Arc<T> {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>> + Send {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).delete(key)
    }

    fn list_keys(
        &self,
        prefix: &str,
    ) -> impl Future<Output = Result<Vec<String>, StoreError>> + Send {
        (**self).list_keys(prefix)
    }
}
