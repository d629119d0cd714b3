//! Agent profile types for Murmur.
//!
//! An [`AgentProfile`] is supplied by the remote service and is read-only to
//! the client. It carries everything needed to render the welcome panel and
//! the prompt suggestions, and the account/agent ids used to derive the
//! visitor identity.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Kind of media shown on the welcome panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GreetingMediaType {
    Image,
    Video,
    #[default]
    #[serde(other)]
    None,
}

impl fmt::Display for GreetingMediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GreetingMediaType::Image => write!(f, "image"),
            GreetingMediaType::Video => write!(f, "video"),
            GreetingMediaType::None => write!(f, "none"),
        }
    }
}

/// A canned prompt suggestion offered before the first message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPrompt {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub is_active: bool,
}

/// Public profile of a remote agent, as returned by `GET /agent/details/{slug}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentProfile {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub account_id: String,
    pub display_name: String,
    pub slug: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub greeting_media_url: Option<String>,
    #[serde(default, deserialize_with = "media_type_or_null")]
    pub greeting_media_type: GreetingMediaType,
    #[serde(default)]
    pub greeting_title: Option<String>,
    #[serde(default)]
    pub welcome_text: Option<String>,
    #[serde(default)]
    pub prompts: Vec<AgentPrompt>,
}

impl AgentProfile {
    /// Prompts flagged active, in their original order.
    pub fn active_prompts(&self) -> impl Iterator<Item = &AgentPrompt> {
        self.prompts.iter().filter(|p| p.is_active)
    }
}

/// Response of `GET /agent/active-slug?slug={slug}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSlug {
    pub is_active: bool,
    pub active_slug: String,
}

/// Accept ids sent either as JSON strings or numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
        Uint(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Uint(n) => n.to_string(),
    })
}

fn media_type_or_null<'de, D>(deserializer: D) -> Result<GreetingMediaType, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<GreetingMediaType>::deserialize(deserializer)?.unwrap_or_default())
}
