//! Agent service client.
//!
//! [`HttpAgentApi`] implements the `AgentApi` port from `murmur-core` over
//! reqwest, including the chunked chat body.

pub mod client;
pub mod types;

pub use client::HttpAgentApi;
