//! Agent header, welcome panel, and prompt suggestions.

use console::style;

use murmur_types::agent::{AgentProfile, AgentPrompt, GreetingMediaType};

/// Print the agent's name and the visitor id at the start of a chat.
pub fn print_agent_header(profile: &AgentProfile, public_id: &str) {
    println!();
    println!("  {}", style(&profile.display_name).cyan().bold());
    println!(
        "  {}  {}",
        style("Visitor:").bold(),
        style(short_id(public_id)).dim()
    );
    println!();
    println!("  {}", style("Type /help for commands, Ctrl+D to exit").dim());
    println!("  {}", style("---").dim());
    println!();
}

/// Print the greeting title, welcome text, and greeting media link.
pub fn print_welcome(profile: &AgentProfile) {
    if let Some(title) = profile.greeting_title.as_deref().filter(|t| !t.is_empty()) {
        println!("  {}", style(title).bold());
    }
    if let Some(text) = profile.welcome_text.as_deref().filter(|t| !t.is_empty()) {
        for line in text.lines() {
            println!("  {line}");
        }
    }
    if let Some(url) = profile.greeting_media_url.as_deref().filter(|u| !u.is_empty()) {
        let label = match profile.greeting_media_type {
            GreetingMediaType::Image => "Image",
            GreetingMediaType::Video => "Video",
            GreetingMediaType::None => "Media",
        };
        println!("  {} {}", style(format!("{label}:")).dim(), style(url).underlined());
    }
    println!();
}

/// Print the numbered prompt suggestions, if there are any.
pub fn print_prompts(prompts: &[&AgentPrompt]) {
    if prompts.is_empty() {
        return;
    }

    println!("  {}", style("Try asking:").bold());
    for (i, prompt) in prompts.iter().enumerate() {
        println!("  {} {}", style(format!("/{}", i + 1)).cyan(), prompt.text);
    }
    println!();
}

/// Last group of the random UUID that ends a public id.
fn short_id(public_id: &str) -> &str {
    match public_id.rsplit_once('-') {
        Some((_, tail)) if !tail.is_empty() => tail,
        _ => public_id,
    }
}
