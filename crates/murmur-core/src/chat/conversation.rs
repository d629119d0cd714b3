//! The conversation state machine.
//!
//! `Conversation` is the only mutator of the live message log and the
//! [`ConversationPhase`]. A turn runs as a stream borrowed from `&mut self`,
//! so two turns on the same conversation can never overlap. Each turn:
//!
//! 1. appends the user message and persists it,
//! 2. appends an empty assistant placeholder,
//! 3. streams the reply into the placeholder (with a trailing cursor glyph),
//! 4. on completion, drops the cursor, persists, and resolves any marker
//!    references into a single meta message.
//!
//! Failures never propagate out of a turn; they end it with an inline notice.

use futures_util::{Stream, StreamExt};
use tracing::{debug, info, warn};

use murmur_types::agent::{AgentProfile, AgentPrompt};
use murmur_types::chat::{ChatRequest, ConversationPhase};
use murmur_types::config::{ClientConfig, DEFAULT_CURSOR_GLYPH, DEFAULT_FAILURE_NOTICE};
use murmur_types::error::ChatError;
use murmur_types::identity::VisitorIdentity;
use murmur_types::message::{Message, MetaCard};

use crate::api::AgentApi;
use crate::chat::stream::{self, StreamUpdate};
use crate::meta::MetadataResolver;
use crate::session::history::HistoryStore;
use crate::session::identity::IdentityStore;
use crate::storage::kv_store::KvStore;

/// Presentation settings applied to every turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnSettings {
    /// Appended to the assistant placeholder while the reply is still streaming.
    pub cursor_glyph: String,
    /// Shown when a turn fails.
    pub failure_notice: String,
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self {
            cursor_glyph: DEFAULT_CURSOR_GLYPH.to_string(),
            failure_notice: DEFAULT_FAILURE_NOTICE.to_string(),
        }
    }
}

impl From<&ClientConfig> for TurnSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            cursor_glyph: config.cursor_glyph.clone(),
            failure_notice: config.failure_notice.clone(),
        }
    }
}

/// What changed during a turn, in order. The same change is already
/// visible through [`Conversation::messages`] once the turn stream is dropped.
#[derive(Debug)]
pub enum TurnUpdate {
    /// The user message was appended.
    UserAppended,
    /// The assistant placeholder now reads `text` (cursor glyph included).
    Streaming(String),
    /// Terminal update: the reply is complete.
    Finished {
        text: String,
        reference_ids: Vec<String>,
    },
    /// Terminal update: the turn failed and the placeholder now reads `text`.
    Failed { text: String, error: ChatError },
    /// A meta message carrying these cards was appended after the reply.
    Cards(Vec<MetaCard>),
}

/// Live conversation between the local visitor and one agent.
pub struct Conversation<A: AgentApi, K: KvStore> {
    api: A,
    history: HistoryStore<K>,
    profile: AgentProfile,
    visitor: VisitorIdentity,
    messages: Vec<Message>,
    phase: ConversationPhase,
    settings: TurnSettings,
    /// Index of an assistant placeholder whose turn has not reached its
    /// terminal update yet.
    unfinished: Option<usize>,
}

impl<A: AgentApi, K: KvStore> Conversation<A, K> {
    /// Resolve the visitor identity for `profile`, restore history, and derive the phase.
    pub async fn open<I: KvStore>(
        api: A,
        identity: &IdentityStore<I>,
        history: HistoryStore<K>,
        profile: AgentProfile,
        settings: TurnSettings,
    ) -> Self {
        let visitor = identity.get_or_create(&profile.account_id, &profile.id).await;
        let messages = history.load(&visitor.public_id).await;
        let phase = if messages.is_empty() {
            ConversationPhase::Welcome
        } else {
            ConversationPhase::Active
        };

        info!(
            agent = %profile.slug,
            visitor = %visitor.public_id,
            restored = messages.len(),
            phase = %phase,
            "Conversation opened"
        );

        Self {
            api,
            history,
            profile,
            visitor,
            messages,
            phase,
            settings,
            unfinished: None,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn phase(&self) -> ConversationPhase {
        self.phase
    }

    /// Whether the welcome panel should be rendered.
    pub fn show_welcome(&self) -> bool {
        self.phase.show_welcome()
    }

    /// Whether prompt suggestions should be rendered.
    pub fn show_prompts(&self) -> bool {
        self.phase.show_prompts()
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    pub fn visitor(&self) -> &VisitorIdentity {
        &self.visitor
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Active prompt suggestions, in profile order.
    pub fn active_prompts(&self) -> Vec<&AgentPrompt> {
        self.profile.active_prompts().collect()
    }

    /// Hide the welcome panel but keep the prompt suggestions.
    pub fn dismiss_welcome(&mut self) {
        self.phase = self.phase.advance(ConversationPhase::Prompted);
    }

    /// Empty the conversation and delete the stored history.
    ///
    /// The phase is left as it is: a cleared conversation does not go back
    /// to showing the welcome panel.
    pub async fn clear(&mut self) {
        self.messages.clear();
        self.unfinished = None;
        if let Err(e) = self.history.clear(&self.visitor.public_id).await {
            warn!(error = %e, visitor = %self.visitor.public_id, "Failed to clear stored history");
        }
    }

    /// Send the text of an active prompt suggestion.
    pub fn send_prompt(
        &mut self,
        prompt_id: &str,
    ) -> Result<impl Stream<Item = TurnUpdate> + Send + '_, ChatError> {
        let text = self
            .profile
            .active_prompts()
            .find(|p| p.id == prompt_id)
            .map(|p| p.text.clone())
            .ok_or_else(|| ChatError::UnknownPrompt(prompt_id.to_string()))?;
        Ok(self.send(text))
    }

    /// Run one turn. The returned stream must be polled to completion for
    /// the turn to finish. Dropping it early abandons the reply; the partial
    /// text is kept (without the cursor) once the next turn starts.
    pub fn send(
        &mut self,
        text: impl Into<String>,
    ) -> impl Stream<Item = TurnUpdate> + Send + '_ {
        let query: String = text.into();

        async_stream::stream! {
            self.settle_abandoned_turn();
            self.messages.push(Message::user(query.clone()));
            self.phase = self.phase.advance(ConversationPhase::Active);
            self.persist().await;
            yield TurnUpdate::UserAppended;

            self.messages.push(Message::assistant(String::new()));
            let placeholder = self.messages.len() - 1;
            self.unfinished = Some(placeholder);

            let request = ChatRequest::new(query, &self.visitor);
            let chunks = match self.api.open_chat(&request).await {
                Ok(chunks) => chunks,
                Err(e) => {
                    warn!(error = %e, visitor = %self.visitor.public_id, "Chat request failed");
                    let text = self.settings.failure_notice.clone();
                    self.messages[placeholder].text = text.clone();
                    self.unfinished = None;
                    self.persist().await;
                    yield TurnUpdate::Failed { text, error: ChatError::StreamFailure(e) };
                    return;
                }
            };

            let mut updates = stream::consume(chunks);
            let mut reference_ids = Vec::new();

            while let Some(update) = updates.next().await {
                match update {
                    StreamUpdate::Partial(display) => {
                        let text = format!("{display}{}", self.settings.cursor_glyph);
                        self.messages[placeholder].text = text.clone();
                        yield TurnUpdate::Streaming(text);
                    }
                    StreamUpdate::Completed(stripped) => {
                        self.messages[placeholder].text = stripped.display_text.clone();
                        self.unfinished = None;
                        self.persist().await;
                        reference_ids = stripped.reference_ids.clone();
                        yield TurnUpdate::Finished {
                            text: stripped.display_text,
                            reference_ids: stripped.reference_ids,
                        };
                    }
                    StreamUpdate::Failed { display_text, error } => {
                        let text = if display_text.trim().is_empty() {
                            self.settings.failure_notice.clone()
                        } else {
                            format!("{display_text}\n\n{}", self.settings.failure_notice)
                        };
                        self.messages[placeholder].text = text.clone();
                        self.unfinished = None;
                        self.persist().await;
                        yield TurnUpdate::Failed { text, error: ChatError::StreamFailure(error) };
                        return;
                    }
                }
            }

            if reference_ids.is_empty() {
                return;
            }

            let cards = MetadataResolver::new(&self.api).resolve(&reference_ids).await;
            debug!(
                requested = reference_ids.len(),
                resolved = cards.len(),
                "Resolved meta cards"
            );
            if let Some(meta) = Message::meta(cards.clone()) {
                self.messages.push(meta);
                self.persist().await;
                yield TurnUpdate::Cards(cards);
            }
        }
    }

    /// Close out a turn whose stream was dropped before its terminal update.
    ///
    /// The placeholder keeps whatever reply text was shown, without the
    /// cursor glyph. A placeholder that never showed any text is removed.
    fn settle_abandoned_turn(&mut self) {
        let Some(index) = self.unfinished.take() else {
            return;
        };
        let Some(message) = self.messages.get_mut(index) else {
            return;
        };

        let text = message
            .text
            .strip_suffix(self.settings.cursor_glyph.as_str())
            .unwrap_or(&message.text)
            .trim_end()
            .to_string();
        debug!(visitor = %self.visitor.public_id, kept = text.len(), "Settling abandoned turn");
        if text.is_empty() {
            self.messages.remove(index);
        } else {
            message.text = text;
        }
    }

    async fn persist(&self) {
        if let Err(e) = self
            .history
            .save(&self.visitor.public_id, &self.messages)
            .await
        {
            warn!(error = %e, visitor = %self.visitor.public_id, "Failed to save history");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::InMemoryKvStore;
    use crate::testing::{sample_profile, ChatScript, ScriptedApi, UnavailableKvStore};
    use murmur_types::message::Sender;

    type TestConversation = Conversation<ScriptedApi, InMemoryKvStore>;

    async fn open_with(api: ScriptedApi, kv: &InMemoryKvStore) -> TestConversation {
        let identity = IdentityStore::new(kv.clone());
        Conversation::open(
            api,
            &identity,
            HistoryStore::new(kv.clone()),
            sample_profile(),
            TurnSettings::default(),
        )
        .await
    }

    async fn run_turn(conversation: &mut TestConversation, text: &str) -> Vec<TurnUpdate> {
        conversation.send(text).collect().await
    }

    #[tokio::test]
    async fn test_split_marker_turn() {
        let kv = InMemoryKvStore::new();
        let api = ScriptedApi::new()
            .with_chat(ChatScript::Chunks(vec!["Hello ", "there [MET", "AID:42] friend"]))
            .with_card("42");
        let mut conversation = open_with(api, &kv).await;

        let updates = run_turn(&mut conversation, "hi").await;

        let finished = updates.iter().find_map(|u| match u {
            TurnUpdate::Finished { text, reference_ids } => Some((text, reference_ids)),
            _ => None,
        });
        let (text, ids) = finished.expect("turn should finish");
        assert_eq!(text, "Hello there friend");
        assert_eq!(ids, &vec!["42".to_string()]);

        let messages = conversation.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0], Message::user("hi"));
        assert_eq!(messages[1], Message::assistant("Hello there friend"));
        assert_eq!(messages[2].sender, Sender::Meta);
        assert_eq!(messages[2].cards()[0].reference_id, "42");
    }

    #[tokio::test]
    async fn test_streaming_updates_carry_cursor_until_terminal() {
        let kv = InMemoryKvStore::new();
        let api = ScriptedApi::new().with_chat(ChatScript::Chunks(vec!["One", " two", " three"]));
        let mut conversation = open_with(api, &kv).await;

        let updates = run_turn(&mut conversation, "count").await;
        assert!(matches!(updates[0], TurnUpdate::UserAppended));

        let streaming: Vec<&String> = updates
            .iter()
            .filter_map(|u| match u {
                TurnUpdate::Streaming(text) => Some(text),
                _ => None,
            })
            .collect();
        assert_eq!(streaming.len(), 3);
        for pair in streaming.windows(2) {
            assert!(pair[0].len() <= pair[1].len());
        }
        assert!(streaming.iter().all(|t| t.ends_with(DEFAULT_CURSOR_GLYPH)));

        assert!(matches!(updates.last(), Some(TurnUpdate::Finished { .. })));
        assert_eq!(conversation.messages()[1].text, "One two three");
        assert!(!conversation.messages()[1].text.contains(DEFAULT_CURSOR_GLYPH));
    }

    #[tokio::test]
    async fn test_partial_meta_failure_keeps_resolved_cards() {
        let kv = InMemoryKvStore::new();
        let api = ScriptedApi::new()
            .with_chat(ChatScript::Chunks(vec!["Two picks [METAID:42] [METAID:43]"]))
            .with_card("42")
            .with_failing_card("43", 500);
        let mut conversation = open_with(api, &kv).await;

        let updates = run_turn(&mut conversation, "books?").await;

        let cards = updates.iter().find_map(|u| match u {
            TurnUpdate::Cards(cards) => Some(cards),
            _ => None,
        });
        assert_eq!(cards.unwrap().len(), 1);

        let meta: Vec<&Message> = conversation
            .messages()
            .iter()
            .filter(|m| m.sender == Sender::Meta)
            .collect();
        assert_eq!(meta.len(), 1);
        assert_eq!(meta[0].cards().len(), 1);
        assert_eq!(meta[0].cards()[0].reference_id, "42");
    }

    #[tokio::test]
    async fn test_all_meta_failures_append_nothing() {
        let kv = InMemoryKvStore::new();
        let api = ScriptedApi::new()
            .with_chat(ChatScript::Chunks(vec!["See [METAID:9]"]))
            .with_failing_card("9", 404);
        let mut conversation = open_with(api, &kv).await;

        let updates = run_turn(&mut conversation, "q").await;
        assert!(!updates.iter().any(|u| matches!(u, TurnUpdate::Cards(_))));
        assert_eq!(conversation.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_http_500_ends_with_failure_notice() {
        let kv = InMemoryKvStore::new();
        let api = ScriptedApi::new().with_chat(ChatScript::Status(500));
        let mut conversation = open_with(api, &kv).await;

        let updates = run_turn(&mut conversation, "hello").await;

        match updates.last() {
            Some(TurnUpdate::Failed { text, error }) => {
                assert_eq!(text, DEFAULT_FAILURE_NOTICE);
                assert!(matches!(error, ChatError::StreamFailure(_)));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        let messages = conversation.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1], Message::assistant(DEFAULT_FAILURE_NOTICE));
        assert!(messages.iter().all(|m| m.sender != Sender::Meta));
        assert!(conversation.api().meta_lookups().is_empty());
    }

    #[tokio::test]
    async fn test_missing_body_and_connect_error_fail_turn() {
        let kv = InMemoryKvStore::new();
        let api = ScriptedApi::new()
            .with_chat(ChatScript::MissingBody)
            .with_chat(ChatScript::ConnectError("connection refused"));
        let mut conversation = open_with(api, &kv).await;

        for prompt in ["first", "second"] {
            let updates = run_turn(&mut conversation, prompt).await;
            assert!(matches!(updates.last(), Some(TurnUpdate::Failed { .. })));
        }
        assert_eq!(conversation.messages().len(), 4);
        assert_eq!(conversation.messages()[3].text, DEFAULT_FAILURE_NOTICE);
    }

    #[tokio::test]
    async fn test_mid_stream_error_keeps_partial_text() {
        let kv = InMemoryKvStore::new();
        let api = ScriptedApi::new()
            .with_chat(ChatScript::ChunksThenError(
                vec!["Partial answer [METAID:1]"],
                "connection reset",
            ))
            .with_card("1");
        let mut conversation = open_with(api, &kv).await;

        let updates = run_turn(&mut conversation, "q").await;

        let expected = format!("Partial answer\n\n{DEFAULT_FAILURE_NOTICE}");
        assert!(matches!(updates.last(), Some(TurnUpdate::Failed { text, .. }) if *text == expected));
        assert_eq!(conversation.messages()[1].text, expected);
        assert!(conversation.api().meta_lookups().is_empty());

        let restored = HistoryStore::new(kv.clone())
            .load(&conversation.visitor().public_id)
            .await;
        assert_eq!(restored, conversation.messages());
    }

    #[tokio::test]
    async fn test_phase_moves_to_active_on_first_send_and_stays() {
        let kv = InMemoryKvStore::new();
        let api = ScriptedApi::new()
            .with_chat(ChatScript::Chunks(vec!["one"]))
            .with_chat(ChatScript::Chunks(vec!["two"]));
        let mut conversation = open_with(api, &kv).await;

        assert_eq!(conversation.phase(), ConversationPhase::Welcome);
        assert!(conversation.show_welcome());
        assert!(conversation.show_prompts());

        {
            let turn = conversation.send("first");
            futures_util::pin_mut!(turn);
            assert!(matches!(turn.next().await, Some(TurnUpdate::UserAppended)));
        }
        assert_eq!(conversation.phase(), ConversationPhase::Active);
        assert!(!conversation.show_welcome());

        run_turn(&mut conversation, "second").await;
        assert_eq!(conversation.phase(), ConversationPhase::Active);
        assert!(!conversation.show_welcome());
        assert!(!conversation.show_prompts());
    }

    #[tokio::test]
    async fn test_history_persisted_and_restored() {
        let kv = InMemoryKvStore::new();
        let api = ScriptedApi::new()
            .with_chat(ChatScript::Chunks(vec!["Read [METAID:5]"]))
            .with_card("5");
        let mut conversation = open_with(api, &kv).await;
        run_turn(&mut conversation, "suggest").await;
        let saved = conversation.messages().to_vec();
        let visitor = conversation.visitor().clone();
        drop(conversation);

        let reopened = open_with(ScriptedApi::new(), &kv).await;
        assert_eq!(reopened.visitor(), &visitor);
        assert_eq!(reopened.messages(), saved.as_slice());
        assert_eq!(reopened.phase(), ConversationPhase::Active);
    }

    #[tokio::test]
    async fn test_dropped_turn_is_settled_before_next_send() {
        let kv = InMemoryKvStore::new();
        let api = ScriptedApi::new()
            .with_chat(ChatScript::Chunks(vec!["Half ", "and the rest"]))
            .with_chat(ChatScript::Chunks(vec!["Second reply"]));
        let mut conversation = open_with(api, &kv).await;

        {
            let turn = conversation.send("first");
            futures_util::pin_mut!(turn);
            assert!(matches!(turn.next().await, Some(TurnUpdate::UserAppended)));
            match turn.next().await {
                Some(TurnUpdate::Streaming(text)) => assert!(text.ends_with(DEFAULT_CURSOR_GLYPH)),
                other => panic!("expected streaming update, got {other:?}"),
            }
        }

        run_turn(&mut conversation, "second").await;

        let stored = HistoryStore::new(kv.clone())
            .load(&conversation.visitor().public_id)
            .await;
        assert_eq!(stored, conversation.messages());
        assert!(stored.iter().all(|m| !m.text.contains(DEFAULT_CURSOR_GLYPH)));
        assert_eq!(
            stored,
            vec![
                Message::user("first"),
                Message::assistant("Half"),
                Message::user("second"),
                Message::assistant("Second reply"),
            ]
        );
    }

    #[tokio::test]
    async fn test_dropped_turn_without_text_leaves_no_placeholder() {
        let kv = InMemoryKvStore::new();
        let api = ScriptedApi::new()
            .with_chat(ChatScript::Chunks(vec!["[METAID:7]", " never shown"]))
            .with_chat(ChatScript::Chunks(vec!["ok"]));
        let mut conversation = open_with(api, &kv).await;

        {
            let turn = conversation.send("first");
            futures_util::pin_mut!(turn);
            assert!(matches!(turn.next().await, Some(TurnUpdate::UserAppended)));
            match turn.next().await {
                Some(TurnUpdate::Streaming(text)) => assert_eq!(text, DEFAULT_CURSOR_GLYPH),
                other => panic!("expected streaming update, got {other:?}"),
            }
        }

        run_turn(&mut conversation, "second").await;
        assert_eq!(
            conversation.messages(),
            &[
                Message::user("first"),
                Message::user("second"),
                Message::assistant("ok"),
            ]
        );
    }

    #[tokio::test]
    async fn test_request_carries_visitor_identity() {
        let kv = InMemoryKvStore::new();
        let mut conversation = open_with(ScriptedApi::new(), &kv).await;
        run_turn(&mut conversation, "who am I?").await;

        let requests = conversation.api().chat_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].query, "who am I?");
        assert_eq!(requests[0].account_id, "acc-1");
        assert_eq!(requests[0].agent_id, "agent-9");
        assert_eq!(requests[0].public_id, conversation.visitor().public_id);
        assert!(requests[0].public_id.starts_with("acc-1-agent-9-"));
    }

    #[tokio::test]
    async fn test_prompts_and_dismiss_welcome() {
        let kv = InMemoryKvStore::new();
        let api = ScriptedApi::new().with_chat(ChatScript::Chunks(vec!["Try Dune."]));
        let mut conversation = open_with(api, &kv).await;

        let ids: Vec<&str> = conversation
            .active_prompts()
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, vec!["p1", "p3"]);

        conversation.dismiss_welcome();
        assert_eq!(conversation.phase(), ConversationPhase::Prompted);
        assert!(!conversation.show_welcome());
        assert!(conversation.show_prompts());

        assert!(matches!(
            conversation.send_prompt("p2").err(),
            Some(ChatError::UnknownPrompt(_))
        ));
        assert!(conversation.messages().is_empty());

        let updates: Vec<TurnUpdate> = conversation.send_prompt("p1").unwrap().collect().await;
        assert!(matches!(updates.last(), Some(TurnUpdate::Finished { .. })));
        assert_eq!(conversation.messages()[0], Message::user("Recommend a novel"));
        assert_eq!(conversation.phase(), ConversationPhase::Active);

        conversation.dismiss_welcome();
        assert_eq!(conversation.phase(), ConversationPhase::Active);
    }

    #[tokio::test]
    async fn test_clear_keeps_phase() {
        let kv = InMemoryKvStore::new();
        let api = ScriptedApi::new().with_chat(ChatScript::Chunks(vec!["hey"]));
        let mut conversation = open_with(api, &kv).await;
        run_turn(&mut conversation, "hi").await;

        conversation.clear().await;
        assert!(conversation.messages().is_empty());
        assert_eq!(conversation.phase(), ConversationPhase::Active);

        let stored = HistoryStore::new(kv.clone())
            .load(&conversation.visitor().public_id)
            .await;
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_storage_still_chats() {
        let identity = IdentityStore::new(UnavailableKvStore);
        let api = ScriptedApi::new().with_chat(ChatScript::Chunks(vec!["still here"]));
        let mut conversation = Conversation::open(
            api,
            &identity,
            HistoryStore::new(UnavailableKvStore),
            sample_profile(),
            TurnSettings::default(),
        )
        .await;

        let updates: Vec<TurnUpdate> = conversation.send("ping").collect().await;
        assert!(matches!(updates.last(), Some(TurnUpdate::Finished { text, .. }) if text == "still here"));
        assert_eq!(conversation.messages().len(), 2);
    }

    #[test]
    fn test_turn_settings_from_config() {
        let config = ClientConfig {
            cursor_glyph: "_".to_string(),
            failure_notice: "nope".to_string(),
            ..Default::default()
        };
        let settings = TurnSettings::from(&config);
        assert_eq!(settings.cursor_glyph, "_");
        assert_eq!(settings.failure_notice, "nope");
    }
}
