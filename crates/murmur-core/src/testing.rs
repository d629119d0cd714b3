//! Test doubles shared by the unit tests in this crate.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Mutex;

use murmur_types::agent::{ActiveSlug, AgentProfile, AgentPrompt, GreetingMediaType};
use murmur_types::chat::ChatRequest;
use murmur_types::error::{ApiError, StoreError};
use murmur_types::message::MetaCard;

use crate::api::{AgentApi, ChunkStream};
use crate::storage::kv_store::KvStore;

/// Build a chunk stream from string chunks, optionally failing after the last one.
pub(crate) fn chunk_stream(chunks: &[&str], fail_with: Option<&str>) -> ChunkStream {
    let chunks: Vec<Vec<u8>> = chunks.iter().map(|c| c.as_bytes().to_vec()).collect();
    let fail_with = fail_with.map(str::to_string);
    Box::pin(async_stream::stream! {
        for chunk in chunks {
            yield Ok(chunk);
        }
        if let Some(message) = fail_with {
            yield Err(ApiError::Stream(message));
        }
    })
}

/// A `KvStore` whose medium is always unavailable.
pub(crate) struct UnavailableKvStore;

impl KvStore for UnavailableKvStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Connection("storage disabled".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Connection("storage disabled".to_string()))
    }

    async fn delete(&self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Connection("storage disabled".to_string()))
    }

    async fn list_keys(&self, _prefix: &str) -> Result<Vec<String>, StoreError> {
        Err(StoreError::Connection("storage disabled".to_string()))
    }
}

/// Scripted reply for one chat turn.
#[derive(Clone)]
pub(crate) enum ChatScript {
    Chunks(Vec<&'static str>),
    ChunksThenError(Vec<&'static str>, &'static str),
    Status(u16),
    MissingBody,
    ConnectError(&'static str),
}

/// Mock `AgentApi` that replays scripted responses and records requests.
pub(crate) struct ScriptedApi {
    profiles: HashMap<String, AgentProfile>,
    slugs: HashMap<String, ActiveSlug>,
    chats: Mutex<VecDeque<ChatScript>>,
    cards: HashMap<String, Result<MetaCard, u16>>,
    chat_requests: Mutex<Vec<ChatRequest>>,
    meta_lookups: Mutex<Vec<String>>,
    details_requests: Mutex<Vec<String>>,
}

impl ScriptedApi {
    pub(crate) fn new() -> Self {
        Self {
            profiles: HashMap::new(),
            slugs: HashMap::new(),
            chats: Mutex::new(VecDeque::new()),
            cards: HashMap::new(),
            chat_requests: Mutex::new(Vec::new()),
            meta_lookups: Mutex::new(Vec::new()),
            details_requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_profile(mut self, profile: AgentProfile) -> Self {
        self.slugs.entry(profile.slug.clone()).or_insert(ActiveSlug {
            is_active: true,
            active_slug: profile.slug.clone(),
        });
        self.profiles.insert(profile.slug.clone(), profile);
        self
    }

    pub(crate) fn with_slug(mut self, slug: &str, active_slug: &str, is_active: bool) -> Self {
        self.slugs.insert(
            slug.to_string(),
            ActiveSlug {
                is_active,
                active_slug: active_slug.to_string(),
            },
        );
        self
    }

    pub(crate) fn with_chat(self, script: ChatScript) -> Self {
        self.chats.lock().unwrap().push_back(script);
        self
    }

    pub(crate) fn with_card(mut self, id: &str) -> Self {
        self.cards.insert(
            id.to_string(),
            Ok(MetaCard {
                reference_id: id.to_string(),
                title: Some(format!("Title {id}")),
                target_url: Some(format!("https://example.com/{id}")),
                ..Default::default()
            }),
        );
        self
    }

    pub(crate) fn with_failing_card(mut self, id: &str, status: u16) -> Self {
        self.cards.insert(id.to_string(), Err(status));
        self
    }

    pub(crate) fn chat_requests(&self) -> Vec<ChatRequest> {
        self.chat_requests.lock().unwrap().clone()
    }

    pub(crate) fn meta_lookups(&self) -> Vec<String> {
        self.meta_lookups.lock().unwrap().clone()
    }

    pub(crate) fn details_requests(&self) -> Vec<String> {
        self.details_requests.lock().unwrap().clone()
    }
}

impl AgentApi for ScriptedApi {
    fn active_slug(&self, slug: &str) -> impl Future<Output = Result<ActiveSlug, ApiError>> + Send {
        let result = self.slugs.get(slug).cloned().ok_or(ApiError::Status {
            status: 404,
            body: "unknown slug".to_string(),
        });
        async move { result }
    }

    fn agent_details(
        &self,
        slug: &str,
    ) -> impl Future<Output = Result<AgentProfile, ApiError>> + Send {
        self.details_requests.lock().unwrap().push(slug.to_string());
        let result = self.profiles.get(slug).cloned().ok_or(ApiError::Status {
            status: 404,
            body: "agent not found".to_string(),
        });
        async move { result }
    }

    fn open_chat(
        &self,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<ChunkStream, ApiError>> + Send {
        self.chat_requests.lock().unwrap().push(request.clone());
        let script = self
            .chats
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ChatScript::Chunks(Vec::new()));
        let result = match script {
            ChatScript::Chunks(chunks) => Ok(chunk_stream(&chunks, None)),
            ChatScript::ChunksThenError(chunks, message) => {
                Ok(chunk_stream(&chunks, Some(message)))
            }
            ChatScript::Status(status) => Err(ApiError::Status {
                status,
                body: "scripted failure".to_string(),
            }),
            ChatScript::MissingBody => Err(ApiError::MissingBody),
            ChatScript::ConnectError(message) => Err(ApiError::Http(message.to_string())),
        };
        async move { result }
    }

    fn lookup_meta(
        &self,
        reference_id: &str,
    ) -> impl Future<Output = Result<MetaCard, ApiError>> + Send {
        self.meta_lookups
            .lock()
            .unwrap()
            .push(reference_id.to_string());
        let result = match self.cards.get(reference_id) {
            Some(Ok(card)) => Ok(card.clone()),
            Some(Err(status)) => Err(ApiError::Status {
                status: *status,
                body: "lookup failed".to_string(),
            }),
            None => Err(ApiError::Status {
                status: 404,
                body: "no such reference".to_string(),
            }),
        };
        async move { result }
    }
}

/// A profile with two active prompts and one inactive one.
pub(crate) fn sample_profile() -> AgentProfile {
    AgentProfile {
        id: "agent-9".to_string(),
        account_id: "acc-1".to_string(),
        display_name: "Nova".to_string(),
        slug: "nova".to_string(),
        avatar_url: None,
        greeting_media_url: Some("https://cdn.example/hello.png".to_string()),
        greeting_media_type: GreetingMediaType::Image,
        greeting_title: Some("Hi there".to_string()),
        welcome_text: Some("Ask me about books.".to_string()),
        prompts: vec![
            AgentPrompt {
                id: "p1".to_string(),
                text: "Recommend a novel".to_string(),
                is_active: true,
            },
            AgentPrompt {
                id: "p2".to_string(),
                text: "Retired prompt".to_string(),
                is_active: false,
            },
            AgentPrompt {
                id: "p3".to_string(),
                text: "What's trending?".to_string(),
                is_active: true,
            },
        ],
    }
}
