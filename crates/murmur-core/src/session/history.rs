//! Conversation history store.
//!
//! Persists the ordered message log of one visitor as a JSON array under
//! `history:{public_id}`. Loading never fails: a missing entry, an
//! unreadable medium, or a payload that is not a well-formed message
//! sequence all come back as an empty history.

use tracing::{debug, warn};

use murmur_types::error::{ChatError, StoreError};
use murmur_types::message::Message;

use crate::storage::kv_store::KvStore;

/// Key namespace for histories. Distinct from the identity namespace.
const KEY_PREFIX: &str = "history:";

/// Passive persistence surface for a visitor's message log.
#[derive(Clone)]
pub struct HistoryStore<K: KvStore> {
    kv: K,
}

impl<K: KvStore> HistoryStore<K> {
    pub fn new(kv: K) -> Self {
        Self { kv }
    }

    /// Persistence key for a visitor's history.
    pub fn key(public_id: &str) -> String {
        format!("{KEY_PREFIX}{public_id}")
    }

    /// Restore the saved message log, or an empty one.
    pub async fn load(&self, public_id: &str) -> Vec<Message> {
        let key = Self::key(public_id);
        let payload = match self.kv.get(&key).await {
            Ok(Some(payload)) => payload,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, key = %key, "Could not read history, starting empty");
                return Vec::new();
            }
        };

        match parse_history(&payload) {
            Ok(messages) => {
                debug!(key = %key, count = messages.len(), "Loaded history");
                messages
            }
            Err(err) => {
                warn!(error = %err, key = %key, "Discarding stored history");
                Vec::new()
            }
        }
    }

    /// Replace the saved message log with `messages`.
    pub async fn save(&self, public_id: &str, messages: &[Message]) -> Result<(), StoreError> {
        let payload = serde_json::to_string(messages)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.kv.set(&Self::key(public_id), &payload).await
    }

    /// Remove the saved message log.
    pub async fn clear(&self, public_id: &str) -> Result<(), StoreError> {
        self.kv.delete(&Self::key(public_id)).await
    }
}

fn parse_history(payload: &str) -> Result<Vec<Message>, ChatError> {
    let messages: Vec<Message> =
        serde_json::from_str(payload).map_err(|e| ChatError::HistoryCorrupt(e.to_string()))?;

    if let Some(pos) = messages.iter().position(|m| !m.is_well_formed()) {
        return Err(ChatError::HistoryCorrupt(format!(
            "message {pos} violates sender/card invariants"
        )));
    }

    Ok(messages)
}
