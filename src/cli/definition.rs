//! CLI argument definitions. Reduced from the teacher's `Cli`/`Commands`
//! (which also covers Add/Init/List/Remove/Profile/Worktree/Tmux/Uninstall
//! for its own TUI-first product) down to the operations this crate's
//! supervision engine actually exposes: status, session lifecycle, group
//! management, and MCP materialization.

use clap::{Parser, Subcommand};

use crate::cli::group::GroupCommands;
use crate::cli::mcp::McpCommands;
use crate::cli::session::SessionCommands;
use crate::cli::status::StatusArgs;

#[derive(Debug, Parser)]
#[command(name = "agent-deck", about = "Supervise terminal AI coding agents running under tmux")]
pub struct Cli {
    /// Named profile to operate on (default: the default profile).
    #[arg(long, global = true, env = "AGENT_DECK_PROFILE")]
    pub profile: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Summarize session status counts.
    Status(StatusArgs),
    /// Create, start, stop, restart, attach to, or fork sessions.
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },
    /// Manage the group tree.
    Group {
        #[command(subcommand)]
        command: GroupCommands,
    },
    /// Materialize or invalidate MCP server configs.
    Mcp {
        #[command(subcommand)]
        command: McpCommands,
    },
}
