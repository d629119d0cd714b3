//! AgentApi trait definition.
//!
//! The remote agent service as seen by the engine: profile lookup, slug
//! canonicalization, the streaming chat turn, and metadata lookups.
//! Uses RPITIT for the request methods; the chat body is handed back as a
//! boxed stream of raw byte chunks so the engine can decode it incrementally.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures_util::Stream;

use murmur_types::agent::{ActiveSlug, AgentProfile};
use murmur_types::chat::ChatRequest;
use murmur_types::error::ApiError;
use murmur_types::message::MetaCard;

/// Raw body chunks of a chat turn response, in arrival order.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, ApiError>> + Send + 'static>>;

/// Trait for the remote agent service.
///
/// Implementations live in murmur-infra (e.g., `HttpAgentApi`).
pub trait AgentApi: Send + Sync {
    /// `GET /agent/active-slug?slug={slug}`.
    fn active_slug(&self, slug: &str)
    -> impl Future<Output = Result<ActiveSlug, ApiError>> + Send;

    /// `GET /agent/details/{slug}`.
    fn agent_details(
        &self,
        slug: &str,
    ) -> impl Future<Output = Result<AgentProfile, ApiError>> + Send;

    /// `POST /agent/chat`.
    ///
    /// Resolves once response headers arrive. A non-success status must be
    /// reported as [`ApiError::Status`] and an absent body as
    /// [`ApiError::MissingBody`]; body errors surface as stream items.
    fn open_chat(
        &self,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<ChunkStream, ApiError>> + Send;

    /// `GET /agent/meta?id={reference_id}`.
    fn lookup_meta(
        &self,
        reference_id: &str,
    ) -> impl Future<Output = Result<MetaCard, ApiError>> + Send;
}

impl<T: AgentApi> AgentApi for Arc<T> {
    fn active_slug(
        &self,
        slug: &str,
    ) -> impl Future<Output = Result<ActiveSlug, ApiError>> + Send {
        (**self).active_slug(slug)
    }

    fn agent_details(
        &self,
        slug: &str,
    ) -> impl Future<Output = Result<AgentProfile, ApiError>> + Send {
        (**self).agent_details(slug)
    }

    fn open_chat(
        &self,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<ChunkStream, ApiError>> + Send {
        (**self).open_chat(request)
    }

    fn lookup_meta(
        &self,
        reference_id: &str,
    ) -> impl Future<Output = Result<MetaCard, ApiError>> + Send {
        (**self).lookup_meta(reference_id)
    }
}
