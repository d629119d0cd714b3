//! CLI command definitions for the `murmur` binary.
//!
//! Uses clap derive macros for argument parsing. Every command takes the
//! agent's slug; a stale slug is followed to the agent's current one.

pub mod ask;
pub mod chat;
pub mod visitor;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use murmur_observe::tracing_setup::LogFormat;

/// Chat with remote AI agents from the terminal.
#[derive(Parser)]
#[command(name = "murmur", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all log output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed log output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log line format on stderr (pretty or json).
    #[arg(long, global = true, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Agent service base URL (overrides config.toml).
    #[arg(long, global = true, env = "MURMUR_BASE_URL")]
    pub base_url: Option<String>,

    /// Bearer token for the agent service (overrides config.toml).
    #[arg(long, global = true, env = "MURMUR_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat with an agent.
    Chat {
        /// Agent slug.
        slug: String,
    },

    /// Send a single message and print the reply.
    Ask {
        /// Agent slug.
        slug: String,

        /// The message to send.
        text: String,
    },

    /// Show the stored conversation with an agent.
    History {
        /// Agent slug.
        slug: String,
    },

    /// Delete the stored conversation with an agent.
    Forget {
        /// Agent slug.
        slug: String,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,

        /// Also drop the visitor id, so the next chat starts as a new visitor.
        #[arg(long)]
        identity: bool,
    },

    /// Print the anonymous visitor id used with an agent.
    Whoami {
        /// Agent slug.
        slug: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_chat() {
        let cli = Cli::try_parse_from(["murmur", "chat", "nova"]).unwrap();
        assert!(matches!(cli.command, Commands::Chat { ref slug } if slug == "nova"));
        assert_eq!(cli.log_format, LogFormat::Pretty);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_parse_ask_with_global_flags() {
        let cli = Cli::try_parse_from([
            "murmur",
            "ask",
            "nova",
            "any good books?",
            "--json",
            "-vv",
            "--log-format",
            "json",
            "--base-url",
            "https://agents.example.com",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(cli.base_url.as_deref(), Some("https://agents.example.com"));
        match cli.command {
            Commands::Ask { slug, text } => {
                assert_eq!(slug, "nova");
                assert_eq!(text, "any good books?");
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn test_parse_forget_flags() {
        let cli = Cli::try_parse_from(["murmur", "forget", "nova", "--force", "--identity"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Forget { force: true, identity: true, .. }
        ));
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        assert!(Cli::try_parse_from(["murmur", "--log-format", "xml", "whoami", "nova"]).is_err());
    }
}
