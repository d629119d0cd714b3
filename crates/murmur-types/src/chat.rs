//! Chat turn request and conversation phase types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::identity::VisitorIdentity;

/// Body of `POST /agent/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub query: String,
    pub account_id: String,
    pub agent_id: String,
    pub public_id: String,
}

impl ChatRequest {
    pub fn new(query: impl Into<String>, visitor: &VisitorIdentity) -> Self {
        Self {
            query: query.into(),
            account_id: visitor.account_id.clone(),
            agent_id: visitor.agent_id.clone(),
            public_id: visitor.public_id.clone(),
        }
    }
}

/// What the conversation surface shows before and after the first message.
///
/// The phase only ever moves forward: `Welcome -> Prompted -> Active`, or
/// directly `Welcome -> Active`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationPhase {
    /// Nothing sent yet; welcome panel and prompt suggestions are visible.
    #[default]
    Welcome,
    /// Welcome panel dismissed; prompt suggestions still visible.
    Prompted,
    /// At least one message exists.
    Active,
}

impl ConversationPhase {
    /// Whether the welcome panel (greeting media, title, text) is shown.
    pub fn show_welcome(self) -> bool {
        self == ConversationPhase::Welcome
    }

    /// Whether prompt suggestions are shown.
    pub fn show_prompts(self) -> bool {
        self != ConversationPhase::Active
    }

    /// Move forward to `next`; never moves backwards.
    pub fn advance(self, next: ConversationPhase) -> ConversationPhase {
        self.max(next)
    }
}

impl fmt::Display for ConversationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationPhase::Welcome => write!(f, "welcome"),
            ConversationPhase::Prompted => write!(f, "prompted"),
            ConversationPhase::Active => write!(f, "active"),
        }
    }
}
