//! Plain shell / custom-command tool spec. Used for `ToolKind::Shell` and
//! any `ToolKind::Custom` tool a user has defined in `config.toml`'s
//! `[tools.<name>]` table — the command line comes entirely from
//! `Instance::command`, nothing is synthesized here.

use regex::Regex;
use std::path::PathBuf;

use super::{CommandContext, ToolKind, ToolSpec};

pub struct ShellTool;

impl ToolSpec for ShellTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Shell
    }

    fn build_command(&self, ctx: &CommandContext) -> String {
        if ctx.extra_args.is_empty() {
            std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string())
        } else {
            ctx.extra_args.join(" ")
        }
    }

    fn busy_patterns(&self) -> &'static [Regex] {
        &[]
    }

    fn prompt_patterns(&self) -> &'static [Regex] {
        &[]
    }

    fn can_fork(&self) -> bool {
        false
    }

    fn can_restart(&self) -> bool {
        true
    }

    fn session_file_root(&self, _project_path: &str) -> Option<PathBuf> {
        None
    }
}
