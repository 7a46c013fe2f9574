//! Real tmux-backed `PaneHandle`. Adapted from the teacher's
//! `tmux::session::Session`: same subprocess shape (`tmux new-session`,
//! `kill-session`, `capture-pane -p -S -N`), generalized from a
//! Claude-only naming scheme to any tool.

use std::process::Command;

use super::error::{Result, TmuxError};
use super::{truncate_id, PaneHandle, SESSION_PREFIX};

pub struct Session {
    name: String,
}

impl Session {
    pub fn new(id: &str, title: &str) -> Self {
        Self {
            name: generate_name(id, title),
        }
    }

    pub fn from_name(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    pub fn rename(&mut self, new_title: &str, id: &str) -> Result<()> {
        let new_name = generate_name(id, new_title);
        let output = Command::new("tmux")
            .args(["rename-session", "-t", &self.name, &new_name])
            .output()?;
        if !output.status.success() {
            return Err(TmuxError::CommandFailed(stderr_string(&output)));
        }
        self.name = new_name;
        Ok(())
    }

    pub fn attach(&self) -> Result<()> {
        let inside_tmux = std::env::var("TMUX").is_ok();
        let status = if inside_tmux {
            Command::new("tmux")
                .args(["switch-client", "-t", &self.name])
                .status()?
        } else {
            Command::new("tmux")
                .args(["attach-session", "-t", &self.name])
                .status()?
        };
        if !status.success() {
            return Err(TmuxError::CommandFailed(format!(
                "failed to attach to {}",
                self.name
            )));
        }
        Ok(())
    }

    pub fn create_with_size(
        &self,
        cwd: &str,
        command: &str,
        env: &[(String, String)],
        cols: u16,
        rows: u16,
    ) -> Result<()> {
        let args = build_create_args(&self.name, cwd, command, env, Some((cols, rows)));
        let arg_refs: Vec<&str> = args.iter().map(|s| s.as_str()).collect();
        let output = Command::new("tmux").args(&arg_refs).output()?;
        if !output.status.success() {
            return Err(TmuxError::CommandFailed(stderr_string(&output)));
        }
        Ok(())
    }

    pub fn capture_pane_with_size(&self, lines: i32, _cols: u16, _rows: u16) -> Result<String> {
        self.capture_pane(lines)
    }

    pub fn get_foreground_pid(&self) -> Result<i32> {
        self.get_pane_pid()
    }
}

impl PaneHandle for Session {
    fn name(&self) -> &str {
        &self.name
    }

    fn exists(&self) -> bool {
        Command::new("tmux")
            .args(["has-session", "-t", &self.name])
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn create(&self, cwd: &str, command: &str, env: &[(String, String)]) -> Result<()> {
        let args = build_create_args(&self.name, cwd, command, env, None);
        let arg_refs: Vec<&str> = args.iter().map(|s| s.as_str()).collect();
        let output = Command::new("tmux").args(&arg_refs).output()?;
        if !output.status.success() {
            return Err(TmuxError::CommandFailed(stderr_string(&output)));
        }
        Ok(())
    }

    fn kill(&self) -> Result<()> {
        let output = Command::new("tmux")
            .args(["kill-session", "-t", &self.name])
            .output()?;
        // Killing a session that's already gone is not an error for callers.
        if !output.status.success() && !stderr_string(&output).contains("session not found") {
            return Err(TmuxError::CommandFailed(stderr_string(&output)));
        }
        Ok(())
    }

    fn send_keys(&self, keys: &str) -> Result<()> {
        let output = Command::new("tmux")
            .args(["send-keys", "-t", &self.name, keys, "Enter"])
            .output()?;
        if !output.status.success() {
            return Err(TmuxError::CommandFailed(stderr_string(&output)));
        }
        Ok(())
    }

    fn capture_pane(&self, lines: i32) -> Result<String> {
        let output = Command::new("tmux")
            .args([
                "capture-pane",
                "-p",
                "-t",
                &self.name,
                "-S",
                &format!("-{lines}"),
            ])
            .output()?;
        if !output.status.success() {
            return Err(TmuxError::NotFound(self.name.clone()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn get_pane_pid(&self) -> Result<i32> {
        let output = Command::new("tmux")
            .args(["list-panes", "-t", &self.name, "-F", "#{pane_pid}"])
            .output()?;
        if !output.status.success() {
            return Err(TmuxError::NotFound(self.name.clone()));
        }
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .and_then(|s| s.trim().parse().ok())
            .ok_or_else(|| TmuxError::NotFound(self.name.clone()))
    }

    fn get_env(&self, key: &str) -> Result<Option<String>> {
        let output = Command::new("tmux")
            .args(["show-environment", "-t", &self.name, key])
            .output()?;
        if !output.status.success() {
            // tmux exits non-zero both when the session is gone and when
            // the variable is simply unset — either way, nothing to read.
            return Ok(None);
        }
        let line = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if let Some(rest) = line.strip_prefix(&format!("{key}=")) {
            Ok(Some(rest.to_string()))
        } else {
            // A leading `-` means tmux knows the name but it's unset.
            Ok(None)
        }
    }
}

fn stderr_string(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

/// `<prefix><sanitized title>-<8-char id>`, matching the teacher's
/// `generate_name`. tmux session names may not contain `.` or `:`, so
/// anything outside `[A-Za-z0-9_-]` is mapped to `-`.
fn generate_name(id: &str, title: &str) -> String {
    let sanitized: String = title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let trimmed = sanitized.trim_matches('-');
    let short_id = truncate_id(id, 8);
    if trimmed.is_empty() {
        format!("{SESSION_PREFIX}{short_id}")
    } else {
        format!("{SESSION_PREFIX}{trimmed}-{short_id}")
    }
}

fn build_create_args(
    name: &str,
    cwd: &str,
    command: &str,
    env: &[(String, String)],
    size: Option<(u16, u16)>,
) -> Vec<String> {
    let mut args = vec![
        "new-session".to_string(),
        "-d".to_string(),
        "-s".to_string(),
        name.to_string(),
        "-c".to_string(),
        cwd.to_string(),
    ];
    if let Some((cols, rows)) = size {
        args.push("-x".to_string());
        args.push(cols.to_string());
        args.push("-y".to_string());
        args.push(rows.to_string());
    }
    for (key, value) in env {
        args.push("-e".to_string());
        args.push(format!("{key}={value}"));
    }
    args.push(command.to_string());
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_name_sanitizes_and_truncates_id() {
        let name = generate_name("0123456789abcdef", "My Feature! Branch");
        assert_eq!(name, "agent-deck-my-feature--branch-01234567");
    }

    #[test]
    fn generate_name_falls_back_when_title_has_no_safe_characters() {
        let name = generate_name("0123456789abcdef", "!!!");
        assert_eq!(name, "agent-deck-01234567");
    }

    #[test]
    fn build_create_args_includes_size_and_env_flags() {
        let args = build_create_args(
            "agent-deck-x",
            "/tmp/proj",
            "claude",
            &[("INSTANCE_ID".to_string(), "abc".to_string())],
            Some((120, 40)),
        );
        assert!(args.contains(&"-x".to_string()));
        assert!(args.contains(&"120".to_string()));
        assert!(args.contains(&"-e".to_string()));
        assert!(args.contains(&"INSTANCE_ID=abc".to_string()));
        assert_eq!(args.last(), Some(&"claude".to_string()));
    }

    #[test]
    fn build_create_args_without_size_omits_dimension_flags() {
        let args = build_create_args("agent-deck-x", "/tmp", "claude", &[], None);
        assert!(!args.contains(&"-x".to_string()));
    }
}
