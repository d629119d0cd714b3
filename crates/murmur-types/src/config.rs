//! Client configuration types for Murmur.
//!
//! `ClientConfig` represents `config.toml` in the data directory. Every field
//! has a default so an empty or missing file is valid.

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

/// Glyph appended to the assistant placeholder while a reply is streaming.
pub const DEFAULT_CURSOR_GLYPH: &str = "\u{258D}";

/// Text shown in place of (or after) an assistant reply when a turn fails.
pub const DEFAULT_FAILURE_NOTICE: &str = "Sorry, something went wrong. Please try again.";

/// Top-level configuration for the Murmur client.
///
/// Loaded from `~/.murmur/config.toml`. Does not derive `Clone` or `Serialize`
/// so the access token cannot be copied around or written back out.
#[derive(Debug, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the agent service, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token sent with every request.
    #[serde(default, deserialize_with = "secret_opt")]
    pub access_token: Option<SecretString>,

    /// Overall timeout for non-streaming requests, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// TCP connect timeout, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_cursor_glyph")]
    pub cursor_glyph: String,

    #[serde(default = "default_failure_notice")]
    pub failure_notice: String,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_cursor_glyph() -> String {
    DEFAULT_CURSOR_GLYPH.to_string()
}

fn default_failure_notice() -> String {
    DEFAULT_FAILURE_NOTICE.to_string()
}

fn secret_opt<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|s| !s.is_empty())
        .map(SecretString::from))
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            access_token: None,
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            cursor_glyph: default_cursor_glyph(),
            failure_notice: default_failure_notice(),
        }
    }
}

impl ClientConfig {
    /// Base URL with any trailing slashes removed.
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
