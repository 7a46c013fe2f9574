//! OpenCode session discovery. OpenCode has no stable on-disk format this
//! supervisor should depend on, so discovery shells out to its own CLI
//! and retries with exponential backoff — right after a pane starts, the
//! CLI can legitimately report an empty session list for a moment.

use std::process::Command;
use std::time::Duration;

use serde_json::Value;

const MAX_ATTEMPTS: u32 = 3;
const BASE_BACKOFF: Duration = Duration::from_millis(200);

pub fn discover_latest_session(project_path: &str) -> Option<String> {
    for attempt in 0..MAX_ATTEMPTS {
        if let Some(id) = query_cli(project_path) {
            return Some(id);
        }
        if attempt + 1 < MAX_ATTEMPTS {
            std::thread::sleep(BASE_BACKOFF * 2u32.pow(attempt));
        }
    }
    None
}

fn query_cli(project_path: &str) -> Option<String> {
    let output = Command::new("opencode")
        .args(["session", "list", "--json", "--cwd", project_path])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    parse_session_list(&String::from_utf8_lossy(&output.stdout))
}

/// Pulled out of `query_cli` so the parsing logic (the part worth
/// testing) doesn't require a real `opencode` binary on PATH.
fn parse_session_list(json: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(json).ok()?;
    parsed.as_array()?.last()?.get("id")?.as_str().map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_session_list_returns_the_last_entrys_id() {
        let json = r#"[{"id":"s1"},{"id":"s2"}]"#;
        assert_eq!(parse_session_list(json), Some("s2".to_string()));
    }

    #[test]
    fn parse_session_list_handles_empty_array() {
        assert_eq!(parse_session_list("[]"), None);
    }

    #[test]
    fn parse_session_list_handles_malformed_json() {
        assert_eq!(parse_session_list("not json"), None);
    }
}
