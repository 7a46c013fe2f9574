//! Codex CLI tool spec.

use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;

use super::command::CommandBuilder;
use super::{CommandContext, ToolKind, ToolSpec};

pub struct CodexTool;

fn busy_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| vec![Regex::new(r"(?i)codex is working").unwrap()])
}

fn prompt_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| vec![Regex::new(r"(?i)approve\?").unwrap()])
}

impl ToolSpec for CodexTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Codex
    }

    fn build_command(&self, ctx: &CommandContext) -> String {
        let mut builder = CommandBuilder::new("codex");
        if let Some(session_id) = ctx.resume_session_id {
            builder = builder.arg("resume").arg(session_id);
        }
        builder = builder.flag_if(ctx.dangerous_mode, "--dangerously-bypass-approvals-and-sandbox");
        for extra in ctx.extra_args {
            builder = builder.arg(extra.clone());
        }
        builder.build()
    }

    fn busy_patterns(&self) -> &'static [Regex] {
        busy_patterns()
    }

    fn prompt_patterns(&self) -> &'static [Regex] {
        prompt_patterns()
    }

    fn can_fork(&self) -> bool {
        false
    }

    fn can_restart(&self) -> bool {
        true
    }

    fn session_file_root(&self, _project_path: &str) -> Option<PathBuf> {
        let home = dirs::home_dir()?;
        Some(home.join(".codex").join("sessions"))
    }
}
