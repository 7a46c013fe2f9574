//! Claude session-file discovery. Claude writes one `.jsonl` transcript
//! per conversation under `~/.claude/projects/<encoded-path>/`; the
//! newest fresh file that actually contains conversation data is treated
//! as the session currently attached to a pane. A file Claude created but
//! never wrote a turn into (or one that only holds file-history-snapshot
//! bookkeeping entries, never a `"sessionId"` line) is a zombie and must
//! never be treated as live — spec.md §4.8 calls this the "zombie guard".

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use crate::tool::claude::{has_session_id_line, ClaudeTool};
use crate::tool::ToolSpec;

/// Candidates older than this are treated as stale even if they're the
/// only thing on disk — spec.md §4.8's 5-minute freshness window.
const FRESHNESS_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Find the session id Claude itself currently believes is attached to
/// `project_path`. `current_id` is the supervisor's own last-known id for
/// this instance (never displaced by an empty/zombie candidate, even a
/// newer one); `exclude` is session ids already claimed by sibling
/// instances sharing the same project directory.
pub fn discover_latest_session_id(
    project_path: &str,
    current_id: Option<&str>,
    exclude: &HashSet<String>,
) -> Option<String> {
    let root = ClaudeTool.session_file_root(project_path)?;
    latest_live_session(&root, current_id, exclude)
}

fn latest_live_session(
    root: &std::path::Path,
    current_id: Option<&str>,
    exclude: &HashSet<String>,
) -> Option<String> {
    let now = SystemTime::now();
    let mut candidates: Vec<(PathBuf, SystemTime)> = fs::read_dir(root)
        .ok()?
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .extension()
                .map(|ext| ext == "jsonl")
                .unwrap_or(false)
        })
        .filter(|e| {
            let stem = e
                .path()
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            !stem.starts_with("agent-") && !exclude.contains(&stem)
        })
        .filter_map(|e| {
            let meta = e.metadata().ok()?;
            let modified = meta.modified().ok()?;
            let stale = now
                .duration_since(modified)
                .map(|age| age > FRESHNESS_WINDOW)
                .unwrap_or(false);
            if stale {
                return None;
            }
            // Zombie guard: a candidate with no `"sessionId"` line is
            // never live, no matter how fresh its mtime.
            if !has_session_id_line(&e.path()) {
                return None;
            }
            Some((e.path(), modified))
        })
        .collect();

    candidates.sort_by_key(|(_, modified)| *modified);
    match candidates.pop() {
        Some((path, _)) => path.file_stem().and_then(|s| s.to_str()).map(String::from),
        None => current_id.map(String::from),
    }
}
