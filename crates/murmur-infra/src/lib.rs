//! Infrastructure layer for Murmur.
//!
//! Contains implementations of the port traits defined in `murmur-core`:
//! the SQLite key-value store (plus the in-memory fallback wrapper), the
//! reqwest-based agent service client, and configuration loading.

pub mod config;
pub mod http;
pub mod sqlite;
pub mod store;
