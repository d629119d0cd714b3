//! Murmur CLI entry point.
//!
//! Binary name: `murmur`
//!
//! Parses CLI arguments, initializes logging, local storage, and the agent
//! service client, then dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use state::{AppState, ConfigOverrides};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,murmur_core=debug,murmur_infra=debug",
        _ => "trace",
    };
    murmur_observe::tracing_setup::init_tracing(cli.log_format, filter)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "murmur", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init(ConfigOverrides {
        base_url: cli.base_url,
        access_token: cli.access_token,
    })
    .await?;

    match cli.command {
        Commands::Chat { slug } => {
            cli::chat::loop_runner::run_chat_loop(&state, &slug).await?;
        }
        Commands::Ask { slug, text } => {
            cli::ask::ask(&state, &slug, &text, cli.json).await?;
        }
        Commands::History { slug } => {
            cli::visitor::show_history(&state, &slug, cli.json).await?;
        }
        Commands::Forget { slug, force, identity } => {
            cli::visitor::forget(&state, &slug, force, identity, cli.json).await?;
        }
        Commands::Whoami { slug } => {
            cli::visitor::whoami(&state, &slug, cli.json).await?;
        }
        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}
