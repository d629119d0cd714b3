//! Anonymous visitor identity types.
//!
//! A visitor identity scopes conversation history to one
//! (account, agent) pair within a persistence scope.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable anonymous identity of the local visitor towards one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorIdentity {
    pub account_id: String,
    pub agent_id: String,
    /// Opaque id sent with every chat turn: `{account_id}-{agent_id}-{suffix}`.
    pub public_id: String,
}

impl VisitorIdentity {
    /// Compose a public id from its parts.
    pub fn compose_public_id(account_id: &str, agent_id: &str, suffix: &str) -> String {
        format!("{account_id}-{agent_id}-{suffix}")
    }

    /// Mint a brand-new identity with a random UUID v4 suffix.
    pub fn generate(account_id: &str, agent_id: &str) -> Self {
        let suffix = Uuid::new_v4().to_string();
        Self {
            account_id: account_id.to_string(),
            agent_id: agent_id.to_string(),
            public_id: Self::compose_public_id(account_id, agent_id, &suffix),
        }
    }
}
