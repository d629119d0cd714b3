//! Visitor session persistence.
//!
//! The identity store derives a stable anonymous visitor id per
//! (account, agent); the history store keeps that visitor's message log.
//! Both sit on a [`KvStore`](crate::storage::kv_store::KvStore) and use
//! separate key namespaces.

pub mod history;
pub mod identity;
