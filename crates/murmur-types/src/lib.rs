//! Shared domain types for Murmur.
//!
//! This crate contains the domain types used across the Murmur client:
//! agent profiles, visitor identities, conversation messages and meta cards,
//! client configuration, and the error taxonomy.
//!
//! Zero infrastructure dependencies -- only serde, uuid, secrecy, thiserror.

pub mod agent;
pub mod chat;
pub mod config;
pub mod error;
pub mod identity;
pub mod message;
