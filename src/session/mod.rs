//! Session state: instances, groups, persistence, and profile directories.

pub mod error;
pub mod group;
pub mod instance;
pub mod profile;
pub mod storage;
pub mod worktree;

pub use error::{Result, SessionError};
pub use group::{dedup_tool_sessions, flatten_tree, Group, GroupTree, Item, MoveDirection};
pub use instance::{Instance, Status, ToolSessionRecord, WorktreeInfo, DEFAULT_GROUP};
pub use profile::{
    create_profile, delete_profile, get_app_dir, get_profile_dir, list_profiles,
    set_default_profile, DEFAULT_PROFILE,
};
pub use storage::Storage;
pub use worktree::{looks_like_worktree_path, resolve_worktree_info};

use std::sync::Arc;

/// Ties together the store and the in-memory session/group sets for one
/// profile. Constructed explicitly by the CLI and the lifecycle manager —
/// never a global singleton (DESIGN NOTES §9). Cheaply `Clone`-able (an
/// `Arc` around the one open connection) so a caller can hand the same
/// handle to a `lifecycle::Manager` without opening the database twice.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<Storage>,
}

impl SessionStore {
    pub fn open_profile(profile: &str) -> anyhow::Result<Self> {
        let dir = get_profile_dir(profile)?;
        let storage = Storage::open(&dir)?;
        Ok(Self {
            storage: Arc::new(storage),
        })
    }

    /// Wrap an already-open `Storage` directly — used by tests that need
    /// a store backed by a scratch directory rather than a real profile.
    pub fn open_with_storage(storage: Storage) -> Self {
        Self {
            storage: Arc::new(storage),
        }
    }

    pub fn storage(&self) -> Arc<Storage> {
        self.storage.clone()
    }

    /// Load instances and groups, applying the cross-tool session-id
    /// dedup pass (spec.md §4.3) before returning.
    pub fn load(&self) -> Result<(Vec<Instance>, Vec<Group>)> {
        let (mut instances, groups) = self.storage.load_all()?;
        dedup_tool_sessions(&mut instances);
        Ok((instances, groups))
    }

    pub fn save(&self, instances: &[Instance], groups: &[Group]) -> Result<()> {
        self.storage.save_all(instances, groups)
    }

    /// Poll the storage touch counter forever at `interval`, calling
    /// `on_change` whenever another process (a second CLI invocation, a
    /// future daemon) has written to this profile since the last check.
    /// Cheaper than reloading the full instance set on every tick of the
    /// status loop — callers reload only once this fires.
    pub async fn watch_for_external_writes(
        &self,
        interval: std::time::Duration,
        mut on_change: impl FnMut() + Send,
    ) -> Result<()> {
        let mut watermark = self.storage.last_modified()?;
        loop {
            tokio::time::sleep(interval).await;
            let current = self.storage.last_modified()?;
            if current != watermark {
                watermark = current;
                on_change();
            }
        }
    }
}
