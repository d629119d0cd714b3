//! One-shot `murmur ask`: send a single message and print the reply.

use anyhow::Result;
use futures_util::StreamExt;

use murmur_core::chat::conversation::TurnUpdate;

use crate::state::AppState;

use super::chat::renderer::TurnRenderer;

/// Send `text` to the agent at `slug` and print the reply and any cards.
///
/// The turn is recorded in the stored conversation like any chat turn.
/// With `json`, prints the messages the turn appended.
///
/// # Examples
///
/// ```bash
/// murmur ask nova "Recommend a novel"
/// murmur ask nova "Recommend a novel" --json
/// ```
pub async fn ask(state: &AppState, slug: &str, text: &str, json: bool) -> Result<()> {
    let profile = state.resolve_agent(slug).await?;
    let mut conversation = state.open_conversation(profile).await;
    let before = conversation.messages().len();

    let mut failure = None;
    if json {
        let updates: Vec<TurnUpdate> = conversation.send(text).collect().await;
        for update in updates {
            if let TurnUpdate::Failed { error, .. } = update {
                failure = Some(error);
            }
        }
        let appended = &conversation.messages()[before..];
        println!("{}", serde_json::to_string_pretty(appended)?);
    } else {
        let mut renderer = TurnRenderer::new(
            conversation.profile().display_name.clone(),
            state.config.cursor_glyph.clone(),
        );
        let updates = conversation.send(text);
        futures_util::pin_mut!(updates);
        while let Some(update) = updates.next().await {
            if let Some(error) = renderer.apply(update) {
                failure = Some(error);
            }
        }
        renderer.end();
    }

    match failure {
        Some(error) => Err(anyhow::Error::new(error).context("Chat turn failed")),
        None => Ok(()),
    }
}
