//! Conversation engine for Murmur.
//!
//! `stream` turns a chat turn's body into display updates; `conversation`
//! owns the live message log and phase and drives each turn end to end.

pub mod conversation;
pub mod stream;
