//! MCP config materializer (C7). Claude reads MCP server definitions from
//! a layered set of files (global `~/.claude/mcp.json`, any ancestor
//! `.mcp.json` up to the project root, and a project-local override); this
//! module unions them, applies the enable/disable policy from
//! `config.toml`, and writes the merged result atomically. Caches the
//! merge behind a TTL (C7's `McpCache`) since this runs on every pane
//! creation and restart, not just at config-change time.

pub mod cache;
pub mod gemini;

pub use cache::McpCache;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde_json::Value;

use crate::session::storage::atomic_write;

/// Enable/disable policy for MCP servers, loaded from `config.toml`'s
/// `[mcp]` table. A server on the blacklist is excluded even if it also
/// appears on the whitelist.
#[derive(Debug, Clone, Default)]
pub struct McpEnablement {
    pub whitelist: Option<Vec<String>>,
    pub blacklist: Vec<String>,
}

impl McpEnablement {
    pub fn all_enabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        if self.blacklist.iter().any(|b| b == name) {
            return false;
        }
        match &self.whitelist {
            Some(list) => list.iter().any(|w| w == name),
            None => true,
        }
    }
}

pub struct Materializer {
    cache: McpCache,
}

impl Default for Materializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Materializer {
    pub fn new() -> Self {
        Self {
            cache: McpCache::new(),
        }
    }

    /// Merge global + ancestor + local MCP sources for `project_path`,
    /// apply `enabled`, and atomically write `.mcp.json` into the
    /// project. Returns the enabled server names (sorted, for stable
    /// display and for the zero-diff write check).
    pub fn materialize(&self, project_path: &str, enabled: &McpEnablement) -> Result<Vec<String>> {
        if let Some(cached) = self.cache.get(project_path) {
            return Ok(cached);
        }

        let mut servers: HashMap<String, Value> = HashMap::new();
        for source in candidate_sources(project_path) {
            merge_servers_from(&source, &mut servers);
        }
        servers.retain(|name, _| enabled.is_enabled(name));

        let mut names: Vec<String> = servers.keys().cloned().collect();
        names.sort();

        let merged = serde_json::json!({ "mcpServers": servers });
        let target = Path::new(project_path).join(".mcp.json");
        let rendered = serde_json::to_string_pretty(&merged)?;

        // Skip the write if nothing would actually change — avoids
        // bumping the file's mtime (and therefore any watcher relying on
        // it) on every no-op poll.
        let unchanged = std::fs::read_to_string(&target)
            .map(|existing| existing == rendered)
            .unwrap_or(false);
        if !unchanged {
            atomic_write(&target, rendered.as_bytes())?;
        }

        self.cache.put(project_path, names.clone());
        Ok(names)
    }

    pub fn invalidate(&self, project_path: &str) {
        self.cache.invalidate(project_path);
    }

    pub fn invalidate_ancestor(&self, changed_dir: &str) {
        self.cache.invalidate_ancestor(changed_dir);
    }
}

fn merge_servers_from(path: &Path, out: &mut HashMap<String, Value>) {
    let Ok(content) = std::fs::read_to_string(path) else {
        return;
    };
    let Ok(parsed) = serde_json::from_str::<Value>(&content) else {
        return;
    };
    if let Some(obj) = parsed.get("mcpServers").and_then(|v| v.as_object()) {
        for (name, def) in obj {
            out.insert(name.clone(), def.clone());
        }
    }
}

/// Global file first (lowest precedence), then ancestor `.mcp.json`s from
/// the filesystem root down to the project (so a closer file overrides a
/// further one), then the project-local override last (highest
/// precedence) — later sources win in `merge_servers_from`'s insert.
fn candidate_sources(project_path: &str) -> Vec<PathBuf> {
    let mut sources = Vec::new();
    if let Some(home) = dirs::home_dir() {
        sources.push(home.join(".claude").join("mcp.json"));
    }

    let mut ancestors = Vec::new();
    let mut dir = PathBuf::from(project_path);
    loop {
        ancestors.push(dir.join(".mcp.json"));
        if !dir.pop() {
            break;
        }
    }
    ancestors.reverse();
    sources.extend(ancestors);

    sources.push(
        PathBuf::from(project_path)
            .join(".claude")
            .join("settings.local.json"),
    );
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn project_local_source_overrides_global_for_the_same_server_name() {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join("proj");
        std::fs::create_dir_all(project.join(".claude")).unwrap();
        std::fs::write(
            project.join(".mcp.json"),
            serde_json::json!({"mcpServers": {"fs": {"command": "global-fs"}}}).to_string(),
        )
        .unwrap();
        std::fs::write(
            project.join(".claude").join("settings.local.json"),
            serde_json::json!({"mcpServers": {"fs": {"command": "local-fs"}}}).to_string(),
        )
        .unwrap();

        let materializer = Materializer::new();
        let names = materializer
            .materialize(project.to_str().unwrap(), &McpEnablement::all_enabled())
            .unwrap();
        assert_eq!(names, vec!["fs".to_string()]);

        let written = std::fs::read_to_string(project.join(".mcp.json")).unwrap();
        let parsed: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed["mcpServers"]["fs"]["command"], "local-fs");
    }

    #[test]
    fn blacklisted_server_is_excluded_even_if_whitelisted() {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join("proj");
        std::fs::create_dir_all(&project).unwrap();
        std::fs::write(
            project.join(".mcp.json"),
            serde_json::json!({"mcpServers": {"fs": {}, "net": {}}}).to_string(),
        )
        .unwrap();

        let enabled = McpEnablement {
            whitelist: Some(vec!["fs".to_string(), "net".to_string()]),
            blacklist: vec!["net".to_string()],
        };
        let materializer = Materializer::new();
        let names = materializer
            .materialize(project.to_str().unwrap(), &enabled)
            .unwrap();
        assert_eq!(names, vec!["fs".to_string()]);
    }

    #[test]
    fn second_materialize_call_is_served_from_cache() {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join("proj");
        std::fs::create_dir_all(&project).unwrap();
        std::fs::write(
            project.join(".mcp.json"),
            serde_json::json!({"mcpServers": {"fs": {}}}).to_string(),
        )
        .unwrap();

        let materializer = Materializer::new();
        let first = materializer
            .materialize(project.to_str().unwrap(), &McpEnablement::all_enabled())
            .unwrap();

        // Mutate the source after the first call; a cached second call
        // must not see the change until invalidated.
        std::fs::write(
            project.join(".mcp.json"),
            serde_json::json!({"mcpServers": {"fs": {}, "net": {}}}).to_string(),
        )
        .unwrap();
        let second = materializer
            .materialize(project.to_str().unwrap(), &McpEnablement::all_enabled())
            .unwrap();
        assert_eq!(first, second);

        materializer.invalidate(project.to_str().unwrap());
        let third = materializer
            .materialize(project.to_str().unwrap(), &McpEnablement::all_enabled())
            .unwrap();
        assert_eq!(third, vec!["fs".to_string(), "net".to_string()]);
    }
}
