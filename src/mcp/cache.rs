//! TTL cache with ancestor invalidation for materialized MCP server sets
//! (spec.md §4.7: "a monorepo's root `.mcp.json` can affect every nested
//! project, so a write there must invalidate more than just its own
//! cache entry").

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const DEFAULT_TTL: Duration = Duration::from_secs(30);

struct Entry {
    names: Vec<String>,
    cached_at: Instant,
}

pub struct McpCache {
    entries: Mutex<HashMap<String, Entry>>,
    ttl: Duration,
}

impl Default for McpCache {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: DEFAULT_TTL,
        }
    }
}

impl McpCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn get(&self, project_path: &str) -> Option<Vec<String>> {
        let entries = self.entries.lock().unwrap();
        entries.get(project_path).and_then(|e| {
            if e.cached_at.elapsed() < self.ttl {
                Some(e.names.clone())
            } else {
                None
            }
        })
    }

    pub fn put(&self, project_path: &str, names: Vec<String>) {
        self.entries.lock().unwrap().insert(
            project_path.to_string(),
            Entry {
                names,
                cached_at: Instant::now(),
            },
        );
    }

    pub fn invalidate(&self, project_path: &str) {
        self.entries.lock().unwrap().remove(project_path);
    }

    /// Drop every cached entry for `changed_dir` itself or any descendant
    /// project path beneath it.
    pub fn invalidate_ancestor(&self, changed_dir: &str) {
        let prefix = format!("{}/", changed_dir.trim_end_matches('/'));
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|path, _| path != changed_dir && !path.starts_with(&prefix));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_entries_are_returned_and_stale_ones_are_not() {
        let cache = McpCache::with_ttl(Duration::from_millis(20));
        cache.put("/repo/proj", vec!["server-a".to_string()]);
        assert_eq!(cache.get("/repo/proj"), Some(vec!["server-a".to_string()]));
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(cache.get("/repo/proj"), None);
    }

    #[test]
    fn ancestor_invalidation_clears_descendants_but_not_siblings() {
        let cache = McpCache::new();
        cache.put("/repo", vec!["root-server".to_string()]);
        cache.put("/repo/pkg-a", vec!["a".to_string()]);
        cache.put("/repo/pkg-b", vec!["b".to_string()]);
        cache.put("/repo-other", vec!["unrelated".to_string()]);

        cache.invalidate_ancestor("/repo");

        assert_eq!(cache.get("/repo"), None);
        assert_eq!(cache.get("/repo/pkg-a"), None);
        assert_eq!(cache.get("/repo/pkg-b"), None);
        assert_eq!(cache.get("/repo-other"), Some(vec!["unrelated".to_string()]));
    }
}
