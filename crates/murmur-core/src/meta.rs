//! Metadata resolution for marker references.
//!
//! Every reference id extracted from a reply is looked up on its own, all
//! lookups running concurrently. A lookup that fails is dropped; it never
//! takes its siblings down with it.

use futures_util::future::join_all;
use tracing::debug;

use murmur_types::error::ChatError;
use murmur_types::message::MetaCard;

use crate::api::AgentApi;

/// Resolves reference ids into display cards through an [`AgentApi`].
pub struct MetadataResolver<'a, A: AgentApi> {
    api: &'a A,
}

impl<'a, A: AgentApi> MetadataResolver<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// Look up each id (duplicates included) and return the cards that resolved,
    /// in the order of `reference_ids`.
    pub async fn resolve(&self, reference_ids: &[String]) -> Vec<MetaCard> {
        let lookups = reference_ids.iter().map(|id| async move {
            let result = self.api.lookup_meta(id).await;
            (id, result)
        });

        join_all(lookups)
            .await
            .into_iter()
            .filter_map(|(id, result)| match result {
                Ok(mut card) => {
                    card.reference_id = id.clone();
                    Some(card)
                }
                Err(e) => {
                    let err = ChatError::MetadataLookupFailure {
                        reference_id: id.clone(),
                        reason: e.to_string(),
                    };
                    debug!(error = %err, "Dropping meta card");
                    None
                }
            })
            .collect()
    }
}
