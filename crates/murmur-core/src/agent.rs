//! Agent profile lookup with slug canonicalization.
//!
//! A slug in a link may be stale (the agent was renamed). The directory asks
//! the service for the active slug first and, if it differs, loads the
//! profile under the canonical slug and reports the redirect so the caller
//! can re-navigate.

use tracing::{info, warn};

use murmur_types::agent::AgentProfile;
use murmur_types::error::ChatError;

use crate::api::AgentApi;

/// A loaded profile plus the stale slug it was reached through, if any.
#[derive(Debug, Clone)]
pub struct ResolvedAgent {
    pub profile: AgentProfile,
    pub redirected_from: Option<String>,
}

impl ResolvedAgent {
    pub fn canonical_slug(&self) -> &str {
        &self.profile.slug
    }
}

/// Loads agent profiles through an [`AgentApi`].
pub struct AgentDirectory<A: AgentApi> {
    api: A,
}

impl<A: AgentApi> AgentDirectory<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// Canonicalize `slug` and load the agent's profile.
    ///
    /// Follows at most one redirect. Any failure, or an inactive agent, is
    /// reported as [`ChatError::AgentProfileUnavailable`]; the caller should
    /// not offer a chat in that case.
    pub async fn resolve(&self, slug: &str) -> Result<ResolvedAgent, ChatError> {
        let unavailable = |reason: String| ChatError::AgentProfileUnavailable {
            slug: slug.to_string(),
            reason,
        };

        let active = self.api.active_slug(slug).await.map_err(|e| {
            warn!(slug, error = %e, "Active slug lookup failed");
            unavailable(e.to_string())
        })?;

        if !active.is_active {
            return Err(unavailable("agent is not active".to_string()));
        }

        let (canonical, redirected_from) = if active.active_slug != slug && !active.active_slug.is_empty() {
            info!(from = slug, to = %active.active_slug, "Agent slug redirected");
            (active.active_slug.clone(), Some(slug.to_string()))
        } else {
            (slug.to_string(), None)
        };

        let profile = self.api.agent_details(&canonical).await.map_err(|e| {
            warn!(slug = %canonical, error = %e, "Agent profile lookup failed");
            unavailable(e.to_string())
        })?;

        Ok(ResolvedAgent {
            profile,
            redirected_from,
        })
    }
}
