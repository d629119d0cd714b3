//! HttpAgentApi -- concrete [`AgentApi`] implementation over reqwest.
//!
//! Profile, slug, and metadata lookups are plain JSON GETs bounded by the
//! configured request timeout. The chat turn is a JSON POST whose body is
//! handed back as a stream of raw chunks; it only has a connect timeout,
//! since a reply may legitimately stream for a long time.
//!
//! The access token is wrapped in [`secrecy::SecretString`] and is only
//! exposed when building the `Authorization` header.

use std::time::Duration;

use futures_util::StreamExt;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;

use murmur_core::api::{AgentApi, ChunkStream};
use murmur_types::agent::{ActiveSlug, AgentProfile};
use murmur_types::chat::ChatRequest;
use murmur_types::config::ClientConfig;
use murmur_types::error::ApiError;
use murmur_types::message::MetaCard;

use super::types::MetaEnvelope;

/// reqwest-backed client for the agent service.
///
/// Intentionally does not derive `Debug`.
pub struct HttpAgentApi {
    client: reqwest::Client,
    base_url: Url,
    access_token: Option<SecretString>,
    request_timeout: Duration,
}

impl HttpAgentApi {
    /// Build a client from configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(config.normalized_base_url())
            .map_err(|e| ApiError::Http(format!("invalid base URL {}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Http(format!(
                "invalid base URL {}: not a hierarchical URL",
                config.base_url
            )));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| ApiError::Http(format!("failed to create HTTP client: {e}")))?;

        let access_token = config
            .access_token
            .as_ref()
            .map(|token| SecretString::from(token.expose_secret().to_string()));

        Ok(Self {
            client,
            base_url,
            access_token,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }

    /// `{base}/{segments...}` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::Http(format!("cannot extend base URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Send a request and turn any non-success status into [`ApiError::Status`].
    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| ApiError::Http(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let builder = self
            .client
            .get(url)
            .query(query)
            .timeout(self.request_timeout);
        let response = self.send(builder).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(format!("failed to parse response: {e}")))
    }
}

impl AgentApi for HttpAgentApi {
    async fn active_slug(&self, slug: &str) -> Result<ActiveSlug, ApiError> {
        let url = self.endpoint(&["agent", "active-slug"])?;
        self.get_json(url, &[("slug", slug)]).await
    }

    async fn agent_details(&self, slug: &str) -> Result<AgentProfile, ApiError> {
        let url = self.endpoint(&["agent", "details", slug])?;
        self.get_json(url, &[]).await
    }

    async fn open_chat(&self, request: &ChatRequest) -> Result<ChunkStream, ApiError> {
        let url = self.endpoint(&["agent", "chat"])?;
        debug!(public_id = %request.public_id, query_len = request.query.len(), "Opening chat turn");

        let response = self.send(self.client.post(url).json(request)).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Err(ApiError::MissingBody);
        }

        let chunks = response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|e| ApiError::Stream(format!("stream read failed: {e}")))
        });
        Ok(Box::pin(chunks))
    }

    async fn lookup_meta(&self, reference_id: &str) -> Result<MetaCard, ApiError> {
        let url = self.endpoint(&["agent", "meta"])?;
        let envelope: MetaEnvelope = self.get_json(url, &[("id", reference_id)]).await?;
        Ok(envelope.data.into_card(reference_id))
    }
}
