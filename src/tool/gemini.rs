//! Gemini CLI tool spec. Gemini keys its per-project transcript directory
//! by the SHA-256 hash of the absolute project path rather than a
//! slug-encoded path (unlike Claude) — ported from the teacher's hashing
//! helper in `session/repo_config.rs`, which uses the same `sha2` crate
//! for a different purpose (hook-trust fingerprints).

use regex::Regex;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::OnceLock;

use super::command::CommandBuilder;
use super::{CommandContext, ToolKind, ToolSpec};

pub struct GeminiTool;

fn busy_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| vec![Regex::new(r"(?i)generating\.\.\.").unwrap()])
}

fn prompt_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| vec![Regex::new(r"(?i)apply this change\?").unwrap()])
}

impl ToolSpec for GeminiTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Gemini
    }

    fn build_command(&self, ctx: &CommandContext) -> String {
        // Gemini has no session-resume flag; every launch is a fresh
        // conversation (spec.md Open Question, resolved: "simpler
        // fresh-start path" — see DESIGN.md).
        let mut builder = CommandBuilder::new("gemini");
        builder = builder.flag_if(ctx.dangerous_mode, "--yolo");
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

    fn session_file_root(&self, project_path: &str) -> Option<PathBuf> {
        let home = dirs::home_dir()?;
        Some(home.join(".gemini").join("tmp").join(hash_project_path(project_path)))
    }
}

pub fn hash_project_path(project_path: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(project_path.as_bytes());
    format!("{:x}", hasher.finalize())
}
