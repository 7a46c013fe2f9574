//! Embedded SQL state store (C1).
//!
//! The teacher persists sessions as a single `sessions.json` file written
//! atomically on every mutation (`session/mod.rs`, `tests/session_lifecycle.rs`
//! backup-file checks). This crate needs concurrent readers (status loop,
//! CLI invocations, a possible future TUI) to observe writes without
//! re-parsing a whole file on every poll, so state moves into a
//! `rusqlite` database opened in WAL mode — grounded on the `rusqlite`
//! (bundled + chrono features) usage in the `claude-supervisor` and
//! `claude-session-manager` reference manifests rather than the teacher,
//! which has no SQL dependency at all. The on-disk *shape* (one opaque
//! JSON blob per row) keeps the teacher's "instances are just structs that
//! round-trip through serde" philosophy; only the container changes.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::{params, Connection};

use super::error::{Result, SessionError};
use super::group::Group;
use super::instance::Instance;

const SCHEMA_VERSION: i64 = 1;

pub struct Storage {
    conn: Mutex<Connection>,
}

impl Storage {
    /// Open (creating if absent) the database for a profile, in WAL mode
    /// with a busy timeout so concurrent short-lived CLI processes don't
    /// trip `SQLITE_BUSY` against a long-running supervisor.
    pub fn open(profile_dir: &Path) -> Result<Self> {
        fs::create_dir_all(profile_dir)?;
        let db_path = profile_dir.join("state.db");
        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "busy_timeout", 5000)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                data TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS groups (
                path TEXT PRIMARY KEY,
                data TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS metadata (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;

        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.ensure_schema_version()?;
        migrate_legacy_json(profile_dir, &storage)?;
        Ok(storage)
    }

    fn ensure_schema_version(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO metadata (key, value) VALUES ('schema_version', ?1)",
            params![SCHEMA_VERSION.to_string()],
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO metadata (key, value) VALUES ('touch', '0')",
            [],
        )?;
        Ok(())
    }

    /// Replace the full session and group set, bumping the touch counter
    /// so other processes sharing this profile know to reload.
    pub fn save_all(&self, instances: &[Instance], groups: &[Group]) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM sessions", [])?;
        for inst in instances {
            let data = serde_json::to_string(inst)
                .map_err(|e| SessionError::InvariantViolation(e.to_string()))?;
            tx.execute(
                "INSERT INTO sessions (id, data) VALUES (?1, ?2)",
                params![inst.id, data],
            )?;
        }
        write_groups(&tx, groups)?;
        bump_touch(&tx)?;
        tx.commit()?;
        Ok(())
    }

    /// Persist only the group tree (renames, reorders, expand/collapse) —
    /// does not bump the touch counter, since group-only edits don't need
    /// to interrupt another process's in-flight status poll.
    pub fn save_groups_only(&self, groups: &[Group]) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        write_groups(&tx, groups)?;
        tx.commit()?;
        Ok(())
    }

    pub fn delete_session(&self, id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
        bump_touch(&conn)?;
        Ok(())
    }

    pub fn load_all(&self) -> Result<(Vec<Instance>, Vec<Group>)> {
        let conn = self.conn.lock().unwrap();
        let mut inst_stmt = conn.prepare("SELECT data FROM sessions")?;
        let instances: Vec<Instance> = inst_stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .filter_map(|json| serde_json::from_str(&json).ok())
            .collect();

        let mut group_stmt = conn.prepare("SELECT data FROM groups")?;
        let groups: Vec<Group> = group_stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .filter_map(|json| serde_json::from_str(&json).ok())
            .collect();

        Ok((instances, groups))
    }

    /// Lightweight listing view (id, title, status) for fast status
    /// summaries that don't need the full instance payload deserialized.
    pub fn load_lite(&self) -> Result<Vec<(String, String, crate::session::instance::Status)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT data FROM sessions")?;
        let rows: Vec<(String, String, crate::session::instance::Status)> = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .filter_map(|json| serde_json::from_str::<serde_json::Value>(&json).ok())
            .filter_map(|v| {
                let id = v.get("id")?.as_str()?.to_string();
                let title = v.get("title")?.as_str()?.to_string();
                let status = serde_json::from_value(v.get("status")?.clone()).ok()?;
                Some((id, title, status))
            })
            .collect();
        Ok(rows)
    }

    /// The touch counter, bumped on every `save_all`/`delete_session`.
    /// Other processes sharing a profile dir poll this to detect writes
    /// without re-reading the full session set on every tick.
    pub fn last_modified(&self) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let value: String = conn.query_row(
            "SELECT value FROM metadata WHERE key = 'touch'",
            [],
            |row| row.get(0),
        )?;
        Ok(value.parse().unwrap_or(0))
    }
}

fn write_groups(tx: &rusqlite::Transaction, groups: &[Group]) -> Result<()> {
    tx.execute("DELETE FROM groups", [])?;
    for g in groups {
        let data = serde_json::to_string(g)
            .map_err(|e| SessionError::InvariantViolation(e.to_string()))?;
        tx.execute(
            "INSERT INTO groups (path, data) VALUES (?1, ?2)",
            params![g.path, data],
        )?;
    }
    Ok(())
}

fn bump_touch(conn: &Connection) -> Result<()> {
    conn.execute(
        "UPDATE metadata SET value = CAST(CAST(value AS INTEGER) + 1 AS TEXT) WHERE key = 'touch'",
        [],
    )?;
    Ok(())
}

/// One-time migration of the teacher-style flat `sessions.json` into the
/// database. A corrupted legacy file must never block startup: it is left
/// in place (not renamed to `.migrated`) so an operator can inspect it,
/// and migration is simply skipped for this run.
fn migrate_legacy_json(profile_dir: &Path, storage: &Storage) -> Result<()> {
    let legacy_path = profile_dir.join("sessions.json");
    if !legacy_path.exists() {
        return Ok(());
    }

    let content = match fs::read_to_string(&legacy_path) {
        Ok(c) => c,
        Err(_) => return Ok(()),
    };
    let legacy: LegacyFile = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, path = %legacy_path.display(), "legacy sessions.json is corrupted, skipping migration");
            return Ok(());
        }
    };

    storage.save_all(&legacy.instances, &legacy.groups)?;
    let migrated_path = profile_dir.join("sessions.json.migrated");
    let _ = fs::rename(&legacy_path, &migrated_path);
    Ok(())
}

#[derive(serde::Deserialize)]
struct LegacyFile {
    #[serde(default)]
    instances: Vec<Instance>,
    #[serde(default)]
    groups: Vec<Group>,
}

/// Write `bytes` to `path` via a temp file in the same directory followed
/// by a rename, so a crash mid-write never leaves a truncated file in
/// place (spec.md invariant: "writers never leave a torn file visible").
pub fn atomic_write(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    let tmp_path: PathBuf = dir.join(format!(
        ".{}.tmp",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("write")
    ));
    fs::write(&tmp_path, bytes)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}
