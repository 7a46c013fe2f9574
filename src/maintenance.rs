//! Background maintenance sweep (ambient, runs every 15 minutes per
//! SPEC_FULL.md §5). Prunes stale hook-event files, archives oversized
//! tool-session transcripts, and trims old config/state backups — the
//! same "don't let small per-write artifacts accumulate forever" concern
//! the teacher addresses with its `.bak` rotation in
//! `tests/session_lifecycle.rs`, generalized into a standalone sweep
//! rather than inline backup-on-write logic.

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use anyhow::Result;

const EVENT_FILE_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);
const KEEP_BACKUPS: usize = 3;

/// Default sweep cadence (spec.md §5/§6).
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Tool-session transcripts bigger than this get archived so C8's sync
/// discovery doesn't re-scan a runaway file on every status poll.
pub const DEFAULT_MAX_SESSION_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Delete hook-event files under `events_dir` older than 24 hours. A hook
/// event only matters to the freshness window in `status::hooks`
/// (seconds, not hours), so anything this old is pure litter.
pub fn prune_stale_event_files(events_dir: &Path) -> Result<usize> {
    if !events_dir.exists() {
        return Ok(0);
    }
    let mut removed = 0;
    for entry in fs::read_dir(events_dir)? {
        let entry = entry?;
        let meta = entry.metadata()?;
        let age = SystemTime::now()
            .duration_since(meta.modified()?)
            .unwrap_or_default();
        if age > EVENT_FILE_MAX_AGE {
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Rename any tool-session file over `max_bytes` to `<name>.archived`, so
/// a runaway transcript doesn't get re-read in full on every status poll
/// (C8's sync discovery only needs to look at the *freshest* file, not
/// scan one that's already oversized every tick).
pub fn archive_oversized_session_files(dir: &Path, max_bytes: u64) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }
    let mut archived = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("archived") {
            continue;
        }
        if entry.metadata()?.len() > max_bytes {
            let archived_path = path.with_extension(format!(
                "{}.archived",
                path.extension().and_then(|e| e.to_str()).unwrap_or("")
            ));
            fs::rename(&path, archived_path)?;
            archived += 1;
        }
    }
    Ok(archived)
}

/// Keep only the `KEEP_BACKUPS` most recent `<stem>.bak*` files next to
/// `target`, deleting older ones.
pub fn trim_backups(target: &Path) -> Result<usize> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let Some(file_name) = target.file_name().and_then(|n| n.to_str()) else {
        return Ok(0);
    };
    let prefix = format!("{file_name}.bak");

    if !dir.exists() {
        return Ok(0);
    }
    let mut backups: Vec<(std::path::PathBuf, SystemTime)> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_name()
                .to_str()
                .map(|n| n.starts_with(&prefix))
                .unwrap_or(false)
        })
        .filter_map(|e| Some((e.path(), e.metadata().ok()?.modified().ok()?)))
        .collect();

    backups.sort_by_key(|(_, modified)| *modified);
    let mut removed = 0;
    while backups.len() > KEEP_BACKUPS {
        let (path, _) = backups.remove(0);
        fs::remove_file(path)?;
        removed += 1;
    }
    Ok(removed)
}

/// Run the full sweep against one profile directory.
pub fn run_sweep(profile_dir: &Path, max_session_file_bytes: u64) -> Result<()> {
    let events_dir = profile_dir.join("events");
    let removed = prune_stale_event_files(&events_dir)?;
    if removed > 0 {
        tracing::debug!(removed, "pruned stale hook-event files");
    }

    let archived = archive_oversized_session_files(profile_dir, max_session_file_bytes)?;
    if archived > 0 {
        tracing::debug!(archived, "archived oversized session files");
    }

    let removed_backups = trim_backups(&profile_dir.join("state.db"))?;
    if removed_backups > 0 {
        tracing::debug!(removed_backups, "trimmed old state backups");
    }

    Ok(())
}

/// Run `run_sweep` forever at `interval`, logging and continuing past any
/// single sweep's error rather than letting a transient filesystem
/// problem kill the whole maintenance task (the CLI's one-shot commands
/// already surface filesystem errors directly; this loop is background
/// housekeeping and should outlive a single bad tick).
pub async fn run_maintenance_loop(
    profile_dir: std::path::PathBuf,
    max_session_file_bytes: u64,
    interval: Duration,
) -> ! {
    loop {
        tokio::time::sleep(interval).await;
        if let Err(e) = run_sweep(&profile_dir, max_session_file_bytes) {
            tracing::warn!(error = %e, profile_dir = %profile_dir.display(), "maintenance sweep failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test(start_paused = true)]
    async fn run_maintenance_loop_trims_backups_on_its_first_tick() {
        let dir = TempDir::new().unwrap();
        for i in 0..5 {
            fs::write(dir.path().join(format!("state.db.bak{i}")), "x").unwrap();
            std::thread::sleep(Duration::from_millis(5));
        }

        let handle = tokio::spawn(run_maintenance_loop(
            dir.path().to_path_buf(),
            DEFAULT_MAX_SESSION_FILE_BYTES,
            Duration::from_secs(1),
        ));
        tokio::time::advance(Duration::from_secs(2)).await;
        handle.abort();

        let remaining: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_str().unwrap().starts_with("state.db.bak"))
            .collect();
        assert_eq!(remaining.len(), KEEP_BACKUPS);
    }

    #[test]
    fn prune_stale_event_files_removes_only_old_ones() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("recent.json"), "{}").unwrap();
        let removed = prune_stale_event_files(dir.path()).unwrap();
        assert_eq!(removed, 0);
        assert!(dir.path().join("recent.json").exists());
    }

    #[test]
    fn archive_oversized_session_files_renames_large_files_only() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("small.jsonl"), vec![0u8; 10]).unwrap();
        fs::write(dir.path().join("big.jsonl"), vec![0u8; 1000]).unwrap();

        let archived = archive_oversized_session_files(dir.path(), 100).unwrap();
        assert_eq!(archived, 1);
        assert!(dir.path().join("small.jsonl").exists());
        assert!(!dir.path().join("big.jsonl").exists());
    }

    #[test]
    fn trim_backups_keeps_only_the_newest_three() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("state.db");
        for i in 0..5 {
            fs::write(dir.path().join(format!("state.db.bak{i}")), "x").unwrap();
            std::thread::sleep(Duration::from_millis(5));
        }
        let removed = trim_backups(&target).unwrap();
        assert_eq!(removed, 2);

        let remaining: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_str().unwrap().starts_with("state.db.bak"))
            .collect();
        assert_eq!(remaining.len(), KEEP_BACKUPS);
    }
}
