//! OpenCode CLI tool spec. OpenCode's session id is discovered via its own
//! CLI after launch rather than passed on the command line (C8's sync
//! module polls for it with retry/backoff), so `build_command` never
//! takes a `resume_session_id` — OpenCode resumes by project path alone.

use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;

use super::command::CommandBuilder;
use super::{CommandContext, ToolKind, ToolSpec};

pub struct OpenCodeTool;

fn busy_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| vec![Regex::new(r"(?i)working\.\.\.").unwrap()])
}

fn prompt_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| vec![Regex::new(r"(?i)allow this (tool|command)\?").unwrap()])
}

impl ToolSpec for OpenCodeTool {
    fn kind(&self) -> ToolKind {
        ToolKind::OpenCode
    }

    fn build_command(&self, ctx: &CommandContext) -> String {
        let mut builder = CommandBuilder::new("opencode");
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
        // OpenCode keeps a global session store, not a per-project
        // directory; C8's opencode sync discovers sessions through the
        // `opencode` CLI instead of reading files directly.
        None
    }
}
