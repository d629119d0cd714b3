//! Visitor identity store.
//!
//! One public id per (account, agent) pair, created on first use and reused
//! afterwards. When the medium fails, a generated id is still handed out and
//! held in memory so it stays stable until the process exits.

use dashmap::DashMap;
use tracing::{debug, warn};

use murmur_types::error::ChatError;
use murmur_types::identity::VisitorIdentity;

use crate::storage::kv_store::KvStore;

/// Key namespace for visitor ids.
const KEY_PREFIX: &str = "visitor:";

/// Derives and persists anonymous visitor identities.
pub struct IdentityStore<K: KvStore> {
    kv: K,
    /// Ids minted while the medium was unavailable, keyed like the store.
    ephemeral: DashMap<String, String>,
}

impl<K: KvStore> IdentityStore<K> {
    pub fn new(kv: K) -> Self {
        Self {
            kv,
            ephemeral: DashMap::new(),
        }
    }

    /// Persistence key for an (account, agent) pair.
    pub fn key(account_id: &str, agent_id: &str) -> String {
        format!("{KEY_PREFIX}{account_id}:{agent_id}")
    }

    /// Return the visitor id for this pair, creating and persisting one if needed.
    ///
    /// Never fails: if the medium cannot be read or written, the id is kept
    /// in memory for the rest of the process lifetime instead.
    pub async fn get_or_create_visitor_id(&self, account_id: &str, agent_id: &str) -> String {
        let key = Self::key(account_id, agent_id);

        if let Some(id) = self.ephemeral.get(&key) {
            return id.value().clone();
        }

        match self.kv.get(&key).await {
            Ok(Some(existing)) if !existing.is_empty() => return existing,
            Ok(_) => {}
            Err(e) => {
                let err = ChatError::IdentityUnavailable(e.to_string());
                warn!(error = %err, key = %key, "Using a non-persistent visitor id");
                return self.mint_ephemeral(key, account_id, agent_id);
            }
        }

        let public_id = VisitorIdentity::generate(account_id, agent_id).public_id;
        match self.kv.set(&key, &public_id).await {
            Ok(()) => {
                debug!(key = %key, "Created visitor id");
                public_id
            }
            Err(e) => {
                let err = ChatError::IdentityUnavailable(e.to_string());
                warn!(error = %err, key = %key, "Visitor id could not be saved");
                self.ephemeral.insert(key, public_id.clone());
                public_id
            }
        }
    }

    /// Like [`Self::get_or_create_visitor_id`], returning the full identity.
    pub async fn get_or_create(&self, account_id: &str, agent_id: &str) -> VisitorIdentity {
        let public_id = self.get_or_create_visitor_id(account_id, agent_id).await;
        VisitorIdentity {
            account_id: account_id.to_string(),
            agent_id: agent_id.to_string(),
            public_id,
        }
    }

    fn mint_ephemeral(&self, key: String, account_id: &str, agent_id: &str) -> String {
        self.ephemeral
            .entry(key)
            .or_insert_with(|| VisitorIdentity::generate(account_id, agent_id).public_id)
            .value()
            .clone()
    }
}
