//! tmux pane lifecycle (C2).
//!
//! Adapted from the teacher's `tmux::session` module: every operation
//! shells out to the `tmux` binary and parses its plaintext output. The
//! `PaneHandle` trait is new — the teacher calls `Session` methods
//! directly everywhere, which is fine for a single binary but makes the
//! status/lifecycle code in this crate impossible to unit test without a
//! real tmux server. Status detection and lifecycle management depend on
//! `PaneHandle` instead of the concrete `Session`, so tests can swap in a
//! `FakePane`.

pub mod error;
pub mod session;

pub use error::{Result, TmuxError};
pub use session::Session;

use std::collections::HashSet;
use std::process::Command;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub const SESSION_PREFIX: &str = "agent-deck-";

/// Anything that looks like a multiplexer pane the status/lifecycle layers
/// need to drive. `Session` is the real tmux-backed implementation;
/// `FakePane` (test-only) is an in-memory stand-in.
pub trait PaneHandle {
    fn name(&self) -> &str;
    fn exists(&self) -> bool;
    fn create(&self, cwd: &str, command: &str, env: &[(String, String)]) -> Result<()>;
    fn kill(&self) -> Result<()>;
    fn send_keys(&self, keys: &str) -> Result<()>;
    fn capture_pane(&self, lines: i32) -> Result<String>;
    fn get_pane_pid(&self) -> Result<i32>;
    /// Read a variable out of this pane's multiplexer environment (spec.md
    /// §4.5's per-tick side effect: `get_env(session_id_env)`). `Ok(None)`
    /// means the variable is simply unset, not an error.
    fn get_env(&self, key: &str) -> Result<Option<String>>;
}

/// Truncate an id to `len` characters without panicking on short ids.
pub fn truncate_id(id: &str, len: usize) -> &str {
    if id.len() <= len {
        id
    } else {
        &id[..len]
    }
}

fn run_tmux(args: &[&str]) -> Result<std::process::Output> {
    Command::new("tmux")
        .args(args)
        .output()
        .map_err(TmuxError::from)
}

/// A short-lived cache of live tmux session names, so a status poll over
/// N instances issues one `tmux list-sessions` instead of N
/// `tmux has-session` subprocess spawns.
pub struct SessionCache {
    names: Mutex<(HashSet<String>, Instant)>,
    ttl: Duration,
}

impl Default for SessionCache {
    fn default() -> Self {
        Self {
            names: Mutex::new((HashSet::new(), Instant::now() - Duration::from_secs(3600))),
            ttl: Duration::from_millis(500),
        }
    }
}

impl SessionCache {
    pub fn refresh(&self) -> Result<()> {
        let output = run_tmux(&["list-sessions", "-F", "#{session_name}"])?;
        let names = if output.status.success() {
            String::from_utf8_lossy(&output.stdout)
                .lines()
                .map(|s| s.to_string())
                .collect()
        } else {
            HashSet::new()
        };
        *self.names.lock().unwrap() = (names, Instant::now());
        Ok(())
    }

    fn ensure_fresh(&self) {
        let stale = {
            let guard = self.names.lock().unwrap();
            guard.1.elapsed() > self.ttl
        };
        if stale {
            let _ = self.refresh();
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ensure_fresh();
        self.names.lock().unwrap().0.contains(name)
    }
}

/// The tmux session name of the pane we are currently running inside, if
/// any (used to decide `switch-client` vs `attach-session` on attach).
pub fn get_current_session_name() -> Option<String> {
    if std::env::var("TMUX").is_err() {
        return None;
    }
    let output = run_tmux(&["display-message", "-p", "#{session_name}"]).ok()?;
    if !output.status.success() {
        return None;
    }
    let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}
