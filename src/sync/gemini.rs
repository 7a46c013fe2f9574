//! Gemini session-file discovery and analytics extraction. Gemini's
//! per-project directory is keyed by the SHA-256 hash of the absolute
//! project path (`tool::gemini::hash_project_path`) rather than a
//! slug-encoded path, so discovery hashes first and then applies the same
//! newest-non-empty-file rule as Claude's sync.

use std::fs;
use std::time::SystemTime;

use serde_json::Value;

use crate::tool::gemini::hash_project_path;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeminiAnalytics {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

pub fn discover_latest_session(project_path: &str) -> Option<(String, GeminiAnalytics)> {
    let home = dirs::home_dir()?;
    let dir = home
        .join(".gemini")
        .join("tmp")
        .join(hash_project_path(project_path));

    let mut candidates: Vec<(std::path::PathBuf, SystemTime)> = fs::read_dir(&dir)
        .ok()?
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let meta = e.metadata().ok()?;
            if meta.len() == 0 {
                return None;
            }
            Some((e.path(), meta.modified().ok()?))
        })
        .collect();
    candidates.sort_by_key(|(_, modified)| *modified);
    let (path, _) = candidates.pop()?;

    let session_id = path.file_stem()?.to_str()?.to_string();
    let analytics = extract_analytics(&path).unwrap_or_default();
    Some((session_id, analytics))
}

fn extract_analytics(path: &std::path::Path) -> Option<GeminiAnalytics> {
    let content = fs::read_to_string(path).ok()?;
    let value: Value = serde_json::from_str(&content).ok()?;
    Some(GeminiAnalytics {
        input_tokens: value.get("inputTokens").and_then(|v| v.as_u64()).unwrap_or(0),
        output_tokens: value.get("outputTokens").and_then(|v| v.as_u64()).unwrap_or(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_analytics_reads_token_counts() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, serde_json::json!({"inputTokens": 120, "outputTokens": 45}).to_string())
            .unwrap();
        assert_eq!(
            extract_analytics(&path),
            Some(GeminiAnalytics {
                input_tokens: 120,
                output_tokens: 45
            })
        );
    }

    #[test]
    fn extract_analytics_defaults_missing_fields_to_zero() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{}").unwrap();
        assert_eq!(extract_analytics(&path), Some(GeminiAnalytics::default()));
    }
}
