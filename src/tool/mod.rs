//! Tool registry (C4): a tagged enum plus a trait object per kind, rather
//! than the string `match`-on-name the teacher sprinkles through
//! `session::instance` (`if self.tool == "claude" { ... }`). DESIGN NOTES
//! §9 calls this out directly as a redesign target; the pattern itself
//! (a `ToolSpec`-like trait object per backend) is grounded on the
//! `querymt` provider-registry example in the pack.

pub mod claude;
pub mod codex;
pub mod command;
pub mod gemini;
pub mod opencode;
pub mod shell;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::PathBuf;

use command::CommandBuilder;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Claude,
    Gemini,
    OpenCode,
    Codex,
    Shell,
    Custom(String),
}

impl Serialize for ToolKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ToolKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ToolKind::parse(&s))
    }
}

impl ToolKind {
    pub fn as_str(&self) -> &str {
        match self {
            ToolKind::Claude => "claude",
            ToolKind::Gemini => "gemini",
            ToolKind::OpenCode => "opencode",
            ToolKind::Codex => "codex",
            ToolKind::Shell => "shell",
            ToolKind::Custom(name) => name,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "claude" => ToolKind::Claude,
            "gemini" => ToolKind::Gemini,
            "opencode" => ToolKind::OpenCode,
            "codex" => ToolKind::Codex,
            "shell" => ToolKind::Shell,
            other => ToolKind::Custom(other.to_string()),
        }
    }
}

/// Everything needed to build a launch command line for a tool, without
/// the tool spec reaching back into `Instance` directly.
pub struct CommandContext<'a> {
    pub project_path: &'a str,
    pub resume_session_id: Option<&'a str>,
    /// A freshly minted UUID the caller wants this launch pinned to, for
    /// tools using the pre-generated-UUID pattern (§4.4 point 3). Only
    /// meaningful when `resume_session_id` is `None` — a fresh start, not
    /// a resume.
    pub pregenerated_session_id: Option<&'a str>,
    pub dangerous_mode: bool,
    pub extra_args: &'a [String],
}

/// Capability-bundle slots (spec.md §4.4's table). Every slot defaults to
/// "not supported"; a tool overrides only the ones it actually has.
pub trait ToolSpec: Send + Sync {
    fn kind(&self) -> ToolKind;
    fn build_command(&self, ctx: &CommandContext) -> String;
    fn busy_patterns(&self) -> &'static [Regex];
    fn prompt_patterns(&self) -> &'static [Regex];
    fn can_fork(&self) -> bool {
        false
    }
    fn can_restart(&self) -> bool {
        true
    }
    /// Root directory this tool stores per-project session transcripts
    /// under, if it is file-based (used by the sync module, C8).
    fn session_file_root(&self, project_path: &str) -> Option<PathBuf>;

    /// Multiplexer env var the supervisor writes/reads to learn this
    /// tool's current session id.
    fn session_id_env(&self) -> Option<&'static str> {
        None
    }
    /// Flag used to resume a known session (e.g. `--resume`).
    fn resume_flag(&self) -> Option<&'static str> {
        None
    }
    /// Flag that forks from the session named by `resume_flag`.
    fn fork_flag(&self) -> Option<&'static str> {
        None
    }
    /// Flag that pre-assigns a session id on a fresh launch.
    fn session_id_cli_flag(&self) -> Option<&'static str> {
        None
    }
    /// Flag that bypasses the tool's own permission prompts.
    fn dangerous_flag(&self) -> Option<&'static str> {
        None
    }

    /// Build the shell command a forked child pane execs: `cd` to the
    /// parent's project directory, mint a new id via `uuidgen`, write it
    /// to the multiplexer env, then resume-and-fork onto it. Never emits
    /// a bare `resume_flag` — the default only fires when a tool actually
    /// declares `resume_flag`/`fork_flag`/`session_id_env` (spec.md §4.6:
    /// "Fork never emits a bare `--resume`").
    fn build_fork_command(
        &self,
        parent_project_path: &str,
        parent_session_id: &str,
        ctx: &CommandContext,
    ) -> String {
        let mut script = vec![
            format!("cd {}", command::quote(parent_project_path)),
            "NEW_ID=$(uuidgen)".to_string(),
        ];
        if let Some(env_var) = self.session_id_env() {
            script.push(format!("tmux set-environment {env_var} \"$NEW_ID\""));
        }

        let mut builder = CommandBuilder::new(self.kind().as_str());
        if let Some(resume) = self.resume_flag() {
            builder = builder.arg(resume).arg(parent_session_id);
        }
        if let Some(fork_flag) = self.fork_flag() {
            builder = builder.arg(fork_flag);
        }
        if let Some(session_flag) = self.session_id_cli_flag() {
            builder = builder.arg(session_flag).raw_arg("\"$NEW_ID\"");
        }
        if let Some(dangerous) = self.dangerous_flag() {
            builder = builder.flag_if(ctx.dangerous_mode, dangerous);
        }
        for extra in ctx.extra_args {
            builder = builder.arg(extra.clone());
        }

        script.push(builder.build());
        script.join(" && ")
    }
}

pub fn lookup(kind: &ToolKind) -> Box<dyn ToolSpec> {
    match kind {
        ToolKind::Claude => Box::new(claude::ClaudeTool),
        ToolKind::Gemini => Box::new(gemini::GeminiTool),
        ToolKind::OpenCode => Box::new(opencode::OpenCodeTool),
        ToolKind::Codex => Box::new(codex::CodexTool),
        ToolKind::Shell | ToolKind::Custom(_) => Box::new(shell::ShellTool),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_known_kinds() {
        for kind in [
            ToolKind::Claude,
            ToolKind::Gemini,
            ToolKind::OpenCode,
            ToolKind::Codex,
            ToolKind::Shell,
        ] {
            assert_eq!(ToolKind::parse(kind.as_str()), kind);
        }
    }

    #[test]
    fn unknown_tool_name_becomes_custom() {
        assert_eq!(
            ToolKind::parse("my-internal-bot"),
            ToolKind::Custom("my-internal-bot".to_string())
        );
    }
}
