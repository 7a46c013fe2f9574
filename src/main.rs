//! agent-deck — terminal session manager for AI coding agents

use agent_deck::cli::{self, Cli, Commands};
use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    if std::env::var("AGENT_DECK_DEBUG").is_ok() {
        tracing_subscriber::fmt()
            .with_env_filter("agent_deck=debug")
            .init();
    }

    let cli = Cli::parse();
    let profile = cli.profile.unwrap_or_default();

    match cli.command {
        Some(Commands::Status(args)) => cli::status::run(&profile, args).await,
        Some(Commands::Session { command }) => cli::session::run(&profile, command).await,
        Some(Commands::Group { command }) => cli::group::run(&profile, command).await,
        Some(Commands::Mcp { command }) => cli::mcp::run(&profile, command).await,
        None => {
            println!("agent-deck: run with --help to see available commands.");
            Ok(())
        }
    }
}
