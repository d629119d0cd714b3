//! Slash command parsing for the chat loop.

use console::style;

/// Slash commands available in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    Help,
    /// Show the prompt suggestions again.
    Prompts,
    /// Send the n-th (1-based) prompt suggestion.
    SendPrompt(usize),
    /// Hide the welcome panel, keep the suggestions.
    Dismiss,
    History,
    /// Clear the conversation and its stored history.
    Clear,
    Exit,
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let cmd = trimmed
        .split_whitespace()
        .next()
        .unwrap_or(trimmed)
        .to_lowercase();

    if let Ok(n) = cmd[1..].parse::<usize>() {
        return Some(if n == 0 {
            ChatCommand::Unknown(cmd)
        } else {
            ChatCommand::SendPrompt(n)
        });
    }

    match cmd.as_str() {
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/prompts" | "/p" => Some(ChatCommand::Prompts),
        "/dismiss" => Some(ChatCommand::Dismiss),
        "/history" => Some(ChatCommand::History),
        "/clear" | "/reset" => Some(ChatCommand::Clear),
        "/exit" | "/quit" | "/q" => Some(ChatCommand::Exit),
        _ => Some(ChatCommand::Unknown(cmd)),
    }
}

/// Print the help text listing all available commands.
pub fn print_help() {
    let rows = [
        ("/help", "Show this help message"),
        ("/prompts", "Show the suggested prompts"),
        ("/<n>", "Send suggested prompt number n"),
        ("/dismiss", "Hide the welcome message"),
        ("/history", "Show the conversation so far"),
        ("/clear", "Delete this conversation and start over"),
        ("/exit", "End the chat"),
    ];

    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    for (cmd, help) in rows {
        println!("  {:<10} {}", style(cmd).cyan(), help);
    }
    println!();
    println!("  {}", style("Ctrl+D to exit").dim());
    println!();
}
