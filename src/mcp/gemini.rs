//! Gemini's MCP config lives inline in one global
//! `~/.gemini/settings.json`, unlike Claude's layered global/project/local
//! files (spec.md §4.7 "Gemini materialization"). Materializing here means
//! merging the desired `mcpServers` object into that single file while
//! leaving every other top-level key untouched — the teacher's
//! `session::config` load/save already establishes the "round-trip
//! unrelated keys" discipline this needs.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use serde_json::Value;

use crate::session::storage::atomic_write;

pub fn settings_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("no home directory"))?;
    Ok(home.join(".gemini").join("settings.json"))
}

pub fn materialize_into_global_settings(servers: &Value) -> Result<PathBuf> {
    let path = settings_path()?;
    let mut doc: Value = std::fs::read_to_string(&path)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_else(|| Value::Object(serde_json::Map::new()));

    match &mut doc {
        Value::Object(map) => {
            map.insert("mcpServers".to_string(), servers.clone());
        }
        _ => return Err(anyhow!("existing settings.json is not a JSON object")),
    }

    atomic_write(&path, serde_json::to_string_pretty(&doc)?.as_bytes())?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn setup_temp_home() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::env::set_var("HOME", dir.path());
        dir
    }

    #[test]
    #[serial]
    fn unrelated_top_level_keys_survive_materialization() {
        let home = setup_temp_home();
        let gemini_dir = home.path().join(".gemini");
        std::fs::create_dir_all(&gemini_dir).unwrap();
        std::fs::write(
            gemini_dir.join("settings.json"),
            serde_json::json!({ "theme": "dark", "mcpServers": { "old": {} } }).to_string(),
        )
        .unwrap();

        let servers = serde_json::json!({ "fs": { "command": "mcp-fs" } });
        materialize_into_global_settings(&servers).unwrap();

        let content = std::fs::read_to_string(gemini_dir.join("settings.json")).unwrap();
        let parsed: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["theme"], "dark");
        assert_eq!(parsed["mcpServers"]["fs"]["command"], "mcp-fs");
        assert!(parsed["mcpServers"].get("old").is_none());
    }

    #[test]
    #[serial]
    fn materializing_with_no_existing_file_creates_one() {
        let _home = setup_temp_home();
        let servers = serde_json::json!({ "fs": { "command": "mcp-fs" } });
        let path = materialize_into_global_settings(&servers).unwrap();
        assert!(path.exists());
    }
}
