//! Conversation message and meta card types for Murmur.
//!
//! A conversation is an append-only sequence of [`Message`]s. Position in the
//! sequence is the message's identity; there are no message IDs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
    /// Resolved metadata cards attached to the preceding assistant reply.
    Meta,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Assistant => write!(f, "assistant"),
            Sender::Meta => write!(f, "meta"),
        }
    }
}

impl FromStr for Sender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Sender::User),
            "assistant" => Ok(Sender::Assistant),
            "meta" => Ok(Sender::Meta),
            other => Err(format!("invalid message sender: '{other}'")),
        }
    }
}

/// A display record resolved from a `[METAID:<id>]` marker.
///
/// Every field except `reference_id` is optional; the remote service returns
/// whatever it knows about the referenced resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaCard {
    pub reference_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
}

impl MetaCard {
    /// Best available heading for the card: title, then brand, then the reference id.
    pub fn heading(&self) -> &str {
        self.title
            .as_deref()
            .or(self.brand.as_deref())
            .unwrap_or(&self.reference_id)
    }
}

/// A single entry in the conversation log.
///
/// Invariants (checked by [`Message::is_well_formed`]):
/// - `Meta` messages have empty `text` and a non-empty `meta_cards`.
/// - `User` and `Assistant` messages never carry `meta_cards`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub text: String,
    pub sender: Sender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_cards: Option<Vec<MetaCard>>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
            meta_cards: None,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Assistant,
            meta_cards: None,
        }
    }

    /// Build a meta message carrying `cards`.
    ///
    /// Returns `None` for an empty card list, since a meta message without
    /// cards is not a valid conversation entry.
    pub fn meta(cards: Vec<MetaCard>) -> Option<Self> {
        if cards.is_empty() {
            return None;
        }
        Some(Self {
            text: String::new(),
            sender: Sender::Meta,
            meta_cards: Some(cards),
        })
    }

    /// Cards attached to this message (empty for user/assistant messages).
    pub fn cards(&self) -> &[MetaCard] {
        self.meta_cards.as_deref().unwrap_or(&[])
    }

    /// Whether this message satisfies the sender/card invariants.
    pub fn is_well_formed(&self) -> bool {
        match self.sender {
            Sender::Meta => {
                self.text.is_empty() && self.meta_cards.as_ref().is_some_and(|c| !c.is_empty())
            }
            Sender::User | Sender::Assistant => self.meta_cards.is_none(),
        }
    }
}
