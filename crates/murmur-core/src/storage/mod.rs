//! Local persistence abstractions for Murmur.
//!
//! Defines the key-value store trait that the identity and history stores
//! sit on, and an in-memory implementation used for tests and for the
//! degraded mode when the durable medium cannot be opened.
//! The durable implementation lives in murmur-infra.

pub mod kv_store;
pub mod memory;
