//! Conversation engine and port trait definitions for Murmur.
//!
//! This crate defines the "ports" (`KvStore`, `AgentApi`) that the
//! infrastructure layer implements, plus everything that runs on top of them:
//! visitor identity and history stores, the marker parser, the streaming
//! consumer, the metadata resolver, and the conversation state machine.
//! It depends only on `murmur-types` -- never on `murmur-infra` or any
//! database/HTTP crate.

pub mod agent;
pub mod api;
pub mod chat;
pub mod marker;
pub mod meta;
pub mod session;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;
