//! `agent-deck mcp ...` — materialize or invalidate a project's merged
//! `.mcp.json` (C7).

use anyhow::Result;
use clap::Subcommand;

use crate::config::get_config;
use crate::mcp::Materializer;
use crate::session::SessionStore;

#[derive(Debug, Subcommand)]
pub enum McpCommands {
    /// Merge MCP server sources for a session's project and write `.mcp.json`.
    Materialize { id: String },
    /// Drop a project's cached MCP merge so the next materialize re-reads disk.
    Invalidate { id: String },
}

pub async fn run(profile: &str, command: McpCommands) -> Result<()> {
    let store = SessionStore::open_profile(profile)?;
    let (instances, _groups) = store.load()?;
    let materializer = Materializer::new();
    let enabled = get_config().mcp.to_enablement();

    match command {
        McpCommands::Materialize { id } => {
            let target = crate::cli::resolve_session(&instances, &id)?;
            let names = materializer.materialize(&target.project_path, &enabled)?;
            println!("materialized {} server(s): {}", names.len(), names.join(", "));
        }
        McpCommands::Invalidate { id } => {
            let target = crate::cli::resolve_session(&instances, &id)?;
            materializer.invalidate(&target.project_path);
            println!("invalidated mcp cache for {}", target.title);
        }
    }

    Ok(())
}
