//! Terminal rendering of chat turns.
//!
//! The terminal can only append, while the conversation's streaming text may
//! still change at its end (a marker that has not finished arriving, or the
//! separator run before it). [`StreamPrinter`] only ever prints the prefix
//! that can no longer change and reconciles with the final text once the
//! turn ends.

use std::io::Write;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use murmur_core::chat::conversation::TurnUpdate;
use murmur_core::marker::stable_prefix_len;
use murmur_types::error::ChatError;
use murmur_types::message::{Message, MetaCard, Sender};

/// How the final text relates to what has already been printed.
#[derive(Debug, PartialEq, Eq)]
pub enum Tail {
    /// The final text extends what was printed; print just this.
    Append(String),
    /// The final text diverged; print it again in full on a new line.
    Reprint(String),
}

/// Tracks what part of a streaming reply has been written to the terminal.
#[derive(Debug)]
pub struct StreamPrinter {
    cursor_glyph: String,
    printed: String,
}

impl StreamPrinter {
    pub fn new(cursor_glyph: impl Into<String>) -> Self {
        Self {
            cursor_glyph: cursor_glyph.into(),
            printed: String::new(),
        }
    }

    /// New text to print for a streaming update, if any.
    pub fn advance(&mut self, streaming_text: &str) -> Option<String> {
        let display = streaming_text
            .strip_suffix(self.cursor_glyph.as_str())
            .unwrap_or(streaming_text);
        let stable = &display[..stable_prefix_len(display)];
        let rest = stable.strip_prefix(self.printed.as_str())?;
        if rest.is_empty() {
            return None;
        }

        let rest = rest.to_string();
        self.printed.push_str(&rest);
        Some(rest)
    }

    /// Reconcile with the terminal text of the turn and reset.
    pub fn finish(&mut self, final_text: &str) -> Tail {
        let tail = match final_text.strip_prefix(self.printed.as_str()) {
            Some(rest) => Tail::Append(rest.to_string()),
            None => Tail::Reprint(final_text.to_string()),
        };
        self.printed.clear();
        tail
    }
}

/// Prints the updates of one turn as they arrive.
pub struct TurnRenderer {
    agent_name: String,
    printer: StreamPrinter,
    spinner: Option<ProgressBar>,
    reply_started: bool,
}

impl TurnRenderer {
    pub fn new(agent_name: impl Into<String>, cursor_glyph: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            printer: StreamPrinter::new(cursor_glyph),
            spinner: None,
            reply_started: false,
        }
    }

    /// Render one update. Returns the error of a failed turn.
    pub fn apply(&mut self, update: TurnUpdate) -> Option<ChatError> {
        match update {
            TurnUpdate::UserAppended => self.start_spinner(),
            TurnUpdate::Streaming(text) => {
                if let Some(chunk) = self.printer.advance(&text) {
                    self.begin_reply();
                    print!("{chunk}");
                    let _ = std::io::stdout().flush();
                }
            }
            TurnUpdate::Finished { text, reference_ids } => {
                self.begin_reply();
                match self.printer.finish(&text) {
                    Tail::Append(rest) => print!("{rest}"),
                    Tail::Reprint(full) => print!("\n  {full}"),
                }
                println!();
                println!();
                if !reference_ids.is_empty() {
                    debug!(count = reference_ids.len(), "Reply referenced cards");
                }
            }
            TurnUpdate::Failed { text, error } => {
                self.begin_reply();
                match self.printer.finish(&text) {
                    Tail::Append(rest) => print!("{}", style(rest).yellow()),
                    Tail::Reprint(full) => print!("\n  {}", style(full).yellow()),
                }
                println!();
                println!();
                return Some(error);
            }
            TurnUpdate::Cards(cards) => print_cards(&cards),
        }
        None
    }

    /// Clear any leftover spinner, e.g. when a turn was abandoned.
    pub fn end(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
        self.reply_started = false;
    }

    fn start_spinner(&mut self) {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message("thinking...");
        spinner.enable_steady_tick(Duration::from_millis(80));
        self.spinner = Some(spinner);
        self.reply_started = false;
    }

    fn begin_reply(&mut self) {
        if self.reply_started {
            return;
        }
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
        print!("\n  {} ", style(&self.agent_name).cyan().bold());
        let _ = std::io::stdout().flush();
        self.reply_started = true;
    }
}

/// Print resolved cards as a block under the reply.
pub fn print_cards(cards: &[MetaCard]) {
    for card in cards {
        print!("  {} {}", style("▸").cyan(), style(card.heading()).bold());
        if let (Some(brand), Some(_)) = (&card.brand, &card.title) {
            print!(" {}", style(format!("({brand})")).dim());
        }
        println!();
        if let Some(description) = card.description.as_deref().filter(|d| !d.is_empty()) {
            println!("    {}", style(preview(description, 120)).dim());
        }
        if let Some(url) = &card.target_url {
            println!("    {}", style(url).underlined());
        }
    }
    println!();
}

/// Print the conversation log, one line per message.
pub fn print_transcript(messages: &[Message], agent_name: &str) {
    println!();
    if messages.is_empty() {
        println!("  {}", style("No messages yet.").dim());
        println!();
        return;
    }

    for message in messages {
        match message.sender {
            Sender::User => {
                println!("  {} {}", style("You").green().bold(), preview(&message.text, 100));
            }
            Sender::Assistant => {
                println!("  {} {}", style(agent_name).cyan().bold(), preview(&message.text, 100));
            }
            Sender::Meta => {
                let headings: Vec<&str> = message.cards().iter().map(MetaCard::heading).collect();
                println!("  {} {}", style("Cards").dim(), style(headings.join(", ")).dim());
            }
        }
    }
    println!();
}

/// First `max` characters of the first line of `text`, with an ellipsis if cut.
pub fn preview(text: &str, max: usize) -> String {
    let first_line = text.lines().next().unwrap_or_default();
    let mut out: String = first_line.chars().take(max).collect();
    if first_line.chars().count() > max || text.lines().nth(1).is_some() {
        out.push_str("...");
    }
    out
}
