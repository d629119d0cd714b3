//! Main chat loop orchestration.
//!
//! Resolves the agent, opens the conversation (restoring history), shows the
//! welcome panel and prompt suggestions while the phase allows it, then reads
//! input until the user exits.

use console::style;
use futures_util::{Stream, StreamExt};
use tracing::info;

use murmur_core::chat::conversation::TurnUpdate;
use murmur_types::error::ChatError;

use crate::state::{AppState, CliConversation};

use super::banner::{print_agent_header, print_prompts, print_welcome};
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};
use super::renderer::{print_transcript, TurnRenderer};

/// Run the interactive chat loop with the agent at `slug`.
pub async fn run_chat_loop(state: &AppState, slug: &str) -> anyhow::Result<()> {
    let profile = state.resolve_agent(slug).await?;
    let mut conversation = state.open_conversation(profile).await;
    let mut renderer = TurnRenderer::new(
        conversation.profile().display_name.clone(),
        state.config.cursor_glyph.clone(),
    );

    print_agent_header(conversation.profile(), &conversation.visitor().public_id);
    show_phase_panels(&conversation);
    if !conversation.messages().is_empty() {
        println!(
            "  {} Continuing your conversation ({} messages). /history to review.",
            style("i").blue().bold(),
            conversation.messages().len()
        );
        println!();
    }

    let prompt = format!("  {} ", style("You >").green().bold());
    let (mut chat_input, _writer) = ChatInput::new(prompt)
        .map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    loop {
        let text = match chat_input.read_line().await {
            InputEvent::Eof => {
                println!("\n  {}", style("Chat ended.").dim());
                break;
            }
            InputEvent::Interrupted => {
                println!("\n  {}", style("Press Ctrl+D to exit, or keep chatting.").dim());
                continue;
            }
            InputEvent::Message(text) if text.is_empty() => continue,
            InputEvent::Message(text) => text,
        };

        let Some(cmd) = commands::parse(&text) else {
            let failure = run_turn(&mut renderer, conversation.send(text)).await;
            report_failure(failure);
            continue;
        };

        match cmd {
            ChatCommand::Help => commands::print_help(),
            ChatCommand::Prompts => {
                if conversation.show_prompts() {
                    println!();
                    print_prompts(&conversation.active_prompts());
                } else {
                    println!(
                        "\n  {} Suggestions are only offered before the conversation starts.\n",
                        style("i").blue().bold()
                    );
                }
            }
            ChatCommand::SendPrompt(n) => {
                let Some(prompt_id) = prompt_id_at(&conversation, n) else {
                    println!(
                        "\n  {} No suggestion number {n}. Type /prompts to list them.\n",
                        style("?").yellow().bold()
                    );
                    continue;
                };
                match conversation.send_prompt(&prompt_id) {
                    Ok(updates) => report_failure(run_turn(&mut renderer, updates).await),
                    Err(e) => println!("\n  {} {e}\n", style("!").red().bold()),
                }
            }
            ChatCommand::Dismiss => {
                conversation.dismiss_welcome();
                println!();
                show_phase_panels(&conversation);
            }
            ChatCommand::History => {
                print_transcript(conversation.messages(), &conversation.profile().display_name);
            }
            ChatCommand::Clear => {
                conversation.clear().await;
                chat_input.clear();
                println!("\n  {} Conversation cleared.\n", style("*").cyan().bold());
            }
            ChatCommand::Exit => {
                println!("\n  {}", style("Chat ended.").dim());
                break;
            }
            ChatCommand::Unknown(name) => {
                println!(
                    "\n  {} Unknown command: {}. Type /help for available commands.\n",
                    style("?").yellow().bold(),
                    style(name).dim()
                );
            }
        }
    }

    info!(
        agent = %conversation.profile().slug,
        messages = conversation.messages().len(),
        "Chat closed"
    );
    Ok(())
}

/// Drive one turn to completion, rendering each update. Returns the error
/// of a failed turn.
async fn run_turn(
    renderer: &mut TurnRenderer,
    updates: impl Stream<Item = TurnUpdate>,
) -> Option<ChatError> {
    futures_util::pin_mut!(updates);
    let mut failure = None;
    while let Some(update) = updates.next().await {
        if let Some(error) = renderer.apply(update) {
            failure = Some(error);
        }
    }
    renderer.end();
    failure
}

/// The notice is already on screen; keep the cause for the log and point
/// at `-v` for it.
fn report_failure(failure: Option<ChatError>) {
    let Some(error) = failure else {
        return;
    };
    info!(error = %error, "Chat turn failed");
    println!(
        "  {}",
        style("Your message was saved. Send it again to retry, or run with -v for details.").dim()
    );
    println!();
}

/// Welcome panel and prompt suggestions, as far as the phase shows them.
fn show_phase_panels(conversation: &CliConversation) {
    if conversation.show_welcome() {
        print_welcome(conversation.profile());
    }
    if conversation.show_prompts() {
        let prompts = conversation.active_prompts();
        print_prompts(&prompts);
        if !prompts.is_empty() {
            println!(
                "  {}",
                style("Type /1 to send a suggestion, /dismiss to hide the welcome.").dim()
            );
            println!();
        }
    }
}

/// Id of the n-th (1-based) suggestion, only while suggestions are shown.
fn prompt_id_at(conversation: &CliConversation, n: usize) -> Option<String> {
    if !conversation.show_prompts() {
        return None;
    }
    conversation
        .active_prompts()
        .get(n.checked_sub(1)?)
        .map(|p| p.id.clone())
}
