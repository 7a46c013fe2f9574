//! Claude Code tool spec. Command shape and resume flag are ported from
//! the teacher's `session::instance::Instance::start`/`restart`, which
//! hand-builds `claude --resume <id> --dangerously-skip-permissions`.

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::command::CommandBuilder;
use super::{CommandContext, ToolKind, ToolSpec};

pub struct ClaudeTool;

fn busy_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            Regex::new(r"(?i)esc to interrupt").unwrap(),
            Regex::new(r"(?i)(thinking|pondering|cogitating)\.\.\.").unwrap(),
        ]
    })
}

fn prompt_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            Regex::new(r"(?i)do you want to proceed").unwrap(),
            Regex::new(r"\[y/n\]").unwrap(),
            Regex::new(r"❯\s*1\.\s*Yes").unwrap(),
        ]
    })
}

/// Base directory Claude itself reads/writes under — `CLAUDE_CONFIG_DIR`
/// when the user set it (spec.md §4.4 point 2, §6), else `~/.claude`.
fn config_dir() -> Option<PathBuf> {
    match std::env::var("CLAUDE_CONFIG_DIR") {
        Ok(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::home_dir().map(|h| h.join(".claude")),
    }
}

/// Every non-`[A-Za-z0-9-]` byte of `project_path` becomes `-` (spec.md
/// §4.8, §8's "path-to-directory encoding" invariant).
fn encode_project_path(project_path: &str) -> String {
    project_path
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect()
}

/// Content-based "is this a real conversation" probe, shared with
/// `sync::claude`'s zombie guard: a session file only counts once it has
/// at least one line mentioning `"sessionId"` (spec.md §4.8, §8).
pub(crate) fn has_session_id_line(path: &Path) -> bool {
    match fs::read_to_string(path) {
        Ok(content) => content.lines().any(|line| line.contains("\"sessionId\"")),
        Err(_) => false,
    }
}

impl ToolSpec for ClaudeTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Claude
    }

    fn build_command(&self, ctx: &CommandContext) -> String {
        let mut builder = CommandBuilder::new("claude");
        if let Some(session_id) = ctx.resume_session_id {
            // Resume preflight (spec.md §4.4): a `--resume` against a
            // session file with no conversation records fails with "No
            // conversation found" — fall back to pinning the same id
            // instead of resuming nothing.
            let has_conversation = self
                .session_file_root(ctx.project_path)
                .map(|root| has_session_id_line(&root.join(format!("{session_id}.jsonl"))))
                .unwrap_or(false);
            if has_conversation {
                builder = builder.arg("--resume").arg(session_id);
            } else {
                builder = builder.arg("--session-id").arg(session_id);
            }
        } else if let Some(new_id) = ctx.pregenerated_session_id {
            builder = builder.arg("--session-id").arg(new_id);
        }
        builder = builder.flag_if(ctx.dangerous_mode, "--dangerously-skip-permissions");
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
        true
    }

    fn can_restart(&self) -> bool {
        true
    }

    fn session_file_root(&self, project_path: &str) -> Option<PathBuf> {
        let base = config_dir()?;
        Some(base.join("projects").join(encode_project_path(project_path)))
    }

    fn session_id_env(&self) -> Option<&'static str> {
        Some("CLAUDE_SESSION_ID")
    }

    fn resume_flag(&self) -> Option<&'static str> {
        Some("--resume")
    }

    fn fork_flag(&self) -> Option<&'static str> {
        Some("--fork-session")
    }

    fn session_id_cli_flag(&self) -> Option<&'static str> {
        Some("--session-id")
    }

    fn dangerous_flag(&self) -> Option<&'static str> {
        Some("--dangerously-skip-permissions")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn seed_session_file(home: &Path, project_path: &str, session_id: &str, content: &str) {
        let dir = home
            .join(".claude")
            .join("projects")
            .join(encode_project_path(project_path));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{session_id}.jsonl")), content).unwrap();
    }

    #[test]
    #[serial]
    fn build_command_with_resume_and_dangerous_mode() {
        let home = TempDir::new().unwrap();
        std::env::set_var("HOME", home.path());
        std::env::remove_var("CLAUDE_CONFIG_DIR");
        seed_session_file(home.path(), "/tmp/proj", "abc-123", "{\"sessionId\":\"abc-123\"}\n");

        let ctx = CommandContext {
            project_path: "/tmp/proj",
            resume_session_id: Some("abc-123"),
            pregenerated_session_id: None,
            dangerous_mode: true,
            extra_args: &[],
        };
        assert_eq!(
            ClaudeTool.build_command(&ctx),
            "claude --resume abc-123 --dangerously-skip-permissions"
        );
    }

    #[test]
    #[serial]
    fn build_command_falls_back_to_session_id_when_resume_preflight_fails() {
        let home = TempDir::new().unwrap();
        std::env::set_var("HOME", home.path());
        std::env::remove_var("CLAUDE_CONFIG_DIR");
        // No session file seeded at all for "abc-123" — the preflight
        // probe must fail and fall back rather than emit a bare --resume.

        let ctx = CommandContext {
            project_path: "/tmp/proj",
            resume_session_id: Some("abc-123"),
            pregenerated_session_id: None,
            dangerous_mode: false,
            extra_args: &[],
        };
        assert_eq!(
            ClaudeTool.build_command(&ctx),
            "claude --session-id abc-123"
        );
    }

    #[test]
    fn build_command_fresh_start_has_no_resume_flag() {
        let ctx = CommandContext {
            project_path: "/tmp/proj",
            resume_session_id: None,
            pregenerated_session_id: None,
            dangerous_mode: false,
            extra_args: &[],
        };
        assert_eq!(ClaudeTool.build_command(&ctx), "claude");
    }

    #[test]
    fn build_command_fresh_start_with_pregenerated_id_pins_session_id() {
        let ctx = CommandContext {
            project_path: "/tmp/proj",
            resume_session_id: None,
            pregenerated_session_id: Some("new-uuid"),
            dangerous_mode: false,
            extra_args: &[],
        };
        assert_eq!(
            ClaudeTool.build_command(&ctx),
            "claude --session-id new-uuid"
        );
    }

    #[test]
    #[serial]
    fn session_file_root_replaces_every_non_alnum_dash_character() {
        std::env::set_var("HOME", "/home/test");
        std::env::remove_var("CLAUDE_CONFIG_DIR");
        let root = ClaudeTool
            .session_file_root("/tmp/Test Path.With_Spaces")
            .unwrap();
        assert!(root.ends_with("-tmp-Test-Path-With-Spaces"));
    }

    #[test]
    #[serial]
    fn session_file_root_honors_claude_config_dir_override() {
        std::env::set_var("CLAUDE_CONFIG_DIR", "/custom/claude");
        let root = ClaudeTool.session_file_root("/tmp/proj").unwrap();
        assert_eq!(root, PathBuf::from("/custom/claude/projects/-tmp-proj"));
        std::env::remove_var("CLAUDE_CONFIG_DIR");
    }

    #[test]
    fn build_fork_command_matches_the_pre_generated_uuid_pattern() {
        let ctx = CommandContext {
            project_path: "/tmp/Test Path With Spaces",
            resume_session_id: None,
            pregenerated_session_id: None,
            dangerous_mode: false,
            extra_args: &[],
        };
        let cmd = ClaudeTool.build_fork_command(
            "/tmp/Test Path With Spaces",
            "abc-123",
            &ctx,
        );
        assert!(cmd.contains("cd '/tmp/Test Path With Spaces'"));
        assert!(cmd.contains("uuidgen"));
        assert!(cmd.contains("tmux set-environment CLAUDE_SESSION_ID"));
        assert!(cmd.contains("--session-id"));
        assert!(cmd.contains("--resume abc-123 --fork-session"));
        assert!(!cmd.contains("-p \".\""));
        assert!(!cmd.contains("jq"));
    }
}
