//! Visitor-scoped commands: history, forget, whoami.
//!
//! Each resolves the agent first, since the stored conversation is keyed by
//! the visitor id for the agent's (account, agent) pair.

use anyhow::{Context, Result};
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;
use dialoguer::Confirm;

use murmur_core::session::identity::IdentityStore;
use murmur_core::storage::kv_store::KvStore;
use murmur_infra::store::LocalKvStore;
use murmur_types::message::{MetaCard, Sender};

use crate::state::AppState;

use super::chat::renderer::preview;

/// Show the stored conversation with an agent.
///
/// # Examples
///
/// ```bash
/// murmur history nova
/// murmur history nova --json
/// ```
pub async fn show_history(state: &AppState, slug: &str, json: bool) -> Result<()> {
    let profile = state.resolve_agent(slug).await?;
    let visitor = state
        .identity_store()
        .get_or_create(&profile.account_id, &profile.id)
        .await;
    let messages = state.history_store().load(&visitor.public_id).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    if messages.is_empty() {
        println!();
        println!(
            "  {} No conversation with '{}' yet. Start one with: murmur chat {}",
            style("i").blue().bold(),
            style(&profile.display_name).cyan(),
            profile.slug
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("#").fg(Color::White),
        Cell::new("From").fg(Color::White),
        Cell::new("Message").fg(Color::White),
    ]);

    for (i, message) in messages.iter().enumerate() {
        let (from, text) = match message.sender {
            Sender::User => (Cell::new("you").fg(Color::Green), preview(&message.text, 80)),
            Sender::Assistant => (
                Cell::new(&profile.display_name).fg(Color::Cyan),
                preview(&message.text, 80),
            ),
            Sender::Meta => {
                let headings: Vec<&str> = message.cards().iter().map(MetaCard::heading).collect();
                (Cell::new("cards").fg(Color::DarkGrey), headings.join(", "))
            }
        };

        table.add_row(vec![
            Cell::new(i + 1).fg(Color::DarkGrey),
            from,
            Cell::new(text).fg(Color::White),
        ]);
    }

    println!();
    println!(
        "  Conversation with '{}'",
        style(&profile.display_name).cyan().bold()
    );
    println!();
    println!("{table}");
    println!();
    println!(
        "  {} message{}",
        style(messages.len()).bold(),
        if messages.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Delete the stored conversation with an agent, optionally with the visitor id.
///
/// # Examples
///
/// ```bash
/// murmur forget nova
/// murmur forget nova --force --identity
/// ```
pub async fn forget(
    state: &AppState,
    slug: &str,
    force: bool,
    identity: bool,
    json: bool,
) -> Result<()> {
    let profile = state.resolve_agent(slug).await?;
    let visitor = state
        .identity_store()
        .get_or_create(&profile.account_id, &profile.id)
        .await;
    let history = state.history_store();
    let count = history.load(&visitor.public_id).await.len();

    if !force && !json {
        let what = if identity {
            "the conversation and visitor id"
        } else {
            "the conversation"
        };
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete {what} with '{}' ({} messages)? This cannot be undone.",
                style(&profile.display_name).red().bold(),
                style(count).bold()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    history
        .clear(&visitor.public_id)
        .await
        .context("Failed to delete stored conversation")?;

    if identity {
        state
            .store
            .delete(&IdentityStore::<LocalKvStore>::key(&profile.account_id, &profile.id))
            .await
            .context("Failed to delete visitor id")?;
    }

    if json {
        println!(
            "{}",
            serde_json::json!({
                "agent": profile.slug,
                "deleted": count,
                "identity": identity,
            })
        );
    } else {
        println!(
            "  {} Deleted {} message{} with '{}'{}.",
            style("x").red().bold(),
            count,
            if count == 1 { "" } else { "s" },
            profile.display_name,
            if identity { " and the visitor id" } else { "" }
        );
    }

    Ok(())
}

/// Print the visitor id used with an agent, creating it if needed.
///
/// # Examples
///
/// ```bash
/// murmur whoami nova
/// ```
pub async fn whoami(state: &AppState, slug: &str, json: bool) -> Result<()> {
    let profile = state.resolve_agent(slug).await?;
    let visitor = state
        .identity_store()
        .get_or_create(&profile.account_id, &profile.id)
        .await;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "agent": profile.slug,
                "visitor": visitor,
                "durable": state.store.is_durable(),
                "dataDir": state.data_dir.display().to_string(),
            })
        );
        return Ok(());
    }

    println!("{}", visitor.public_id);
    if !state.store.is_durable() {
        eprintln!(
            "  {} Not saved: this id only lasts for this run.",
            style("!").yellow().bold()
        );
    }

    Ok(())
}
