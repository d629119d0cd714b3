//! Application state wiring configuration, storage, and the service client.
//!
//! The engine types are generic over `AgentApi` and `KvStore`; AppState pins
//! them to the concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use console::style;
use secrecy::SecretString;

use murmur_core::agent::AgentDirectory;
use murmur_core::chat::conversation::{Conversation, TurnSettings};
use murmur_core::session::history::HistoryStore;
use murmur_core::session::identity::IdentityStore;
use murmur_infra::config::{load_client_config, resolve_data_dir};
use murmur_infra::http::HttpAgentApi;
use murmur_infra::store::LocalKvStore;
use murmur_types::agent::AgentProfile;
use murmur_types::config::ClientConfig;

/// The conversation type used by every command.
pub type CliConversation = Conversation<Arc<HttpAgentApi>, LocalKvStore>;

/// Values from flags or environment that take precedence over `config.toml`.
#[derive(Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub access_token: Option<String>,
}

impl ConfigOverrides {
    fn apply(self, config: &mut ClientConfig) {
        if let Some(base_url) = self.base_url.filter(|u| !u.is_empty()) {
            config.base_url = base_url;
        }
        if let Some(token) = self.access_token.filter(|t| !t.is_empty()) {
            config.access_token = Some(SecretString::from(token));
        }
    }
}

/// Shared state for all commands.
pub struct AppState {
    pub config: ClientConfig,
    pub data_dir: PathBuf,
    pub store: LocalKvStore,
    pub api: Arc<HttpAgentApi>,
    identity: IdentityStore<LocalKvStore>,
}

impl AppState {
    /// Load configuration, open local storage, and build the service client.
    pub async fn init(overrides: ConfigOverrides) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        let mut config = load_client_config(&data_dir).await;
        overrides.apply(&mut config);

        let api = HttpAgentApi::new(&config).context("Failed to create agent service client")?;

        let store = LocalKvStore::open(&data_dir).await;
        if !store.is_durable() {
            eprintln!(
                "  {} Local storage unavailable; this conversation will not be saved.",
                style("!").yellow().bold()
            );
        }

        let identity = IdentityStore::new(store.clone());

        Ok(Self {
            config,
            data_dir,
            store,
            api: Arc::new(api),
            identity,
        })
    }

    pub fn identity_store(&self) -> &IdentityStore<LocalKvStore> {
        &self.identity
    }

    pub fn history_store(&self) -> HistoryStore<LocalKvStore> {
        HistoryStore::new(self.store.clone())
    }

    /// Resolve `slug` (following a redirect) and load the agent's profile.
    pub async fn resolve_agent(&self, slug: &str) -> anyhow::Result<AgentProfile> {
        let resolved = AgentDirectory::new(self.api.clone())
            .resolve(slug)
            .await
            .with_context(|| format!("Agent '{slug}' is not available"))?;

        if let Some(from) = &resolved.redirected_from {
            eprintln!(
                "  {} '{}' is now '{}'.",
                style("i").blue().bold(),
                from,
                style(resolved.canonical_slug()).cyan()
            );
        }

        Ok(resolved.profile)
    }

    /// Open the conversation with `profile`, restoring stored history.
    pub async fn open_conversation(&self, profile: AgentProfile) -> CliConversation {
        Conversation::open(
            self.api.clone(),
            &self.identity,
            self.history_store(),
            profile,
            TurnSettings::from(&self.config),
        )
        .await
    }
}
