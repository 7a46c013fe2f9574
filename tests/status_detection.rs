//! Integration tests for the status detection pipeline against real files
//! on disk (hook events under `~/.agent-deck/events/`), exercised through
//! the public `agent_deck` API with a local `PaneHandle` test double (the
//! in-tree `FakePane` is `#[cfg(test)]`-private to the crate and not
//! visible from here).

use agent_deck::status::{detect, DetectionInput, Status};
use agent_deck::tmux::{PaneHandle, Result as TmuxResult, TmuxError};
use agent_deck::tool::claude::ClaudeTool;
use chrono::Utc;
use serial_test::serial;
use std::sync::Mutex;
use tempfile::TempDir;

struct StubPane {
    alive: bool,
    content: String,
}

impl PaneHandle for StubPane {
    fn name(&self) -> &str {
        "stub"
    }
    fn exists(&self) -> bool {
        self.alive
    }
    fn create(&self, _cwd: &str, _command: &str, _env: &[(String, String)]) -> TmuxResult<()> {
        Ok(())
    }
    fn kill(&self) -> TmuxResult<()> {
        Ok(())
    }
    fn send_keys(&self, _keys: &str) -> TmuxResult<()> {
        Ok(())
    }
    fn capture_pane(&self, _lines: i32) -> TmuxResult<String> {
        Ok(self.content.clone())
    }
    fn get_pane_pid(&self) -> TmuxResult<i32> {
        Err(TmuxError::NotFound("stub".to_string()))
    }
    fn get_env(&self, _key: &str) -> TmuxResult<Option<String>> {
        Ok(None)
    }
}

fn setup_temp_home() -> TempDir {
    let temp = TempDir::new().unwrap();
    std::env::set_var("HOME", temp.path());
    #[cfg(target_os = "linux")]
    std::env::set_var("XDG_CONFIG_HOME", temp.path().join(".config"));
    temp
}

// Hook-event reads go through `~/.agent-deck/events/<id>.json`; serialize
// these tests so one doesn't see another's HOME mutation mid-flight.
static HOME_LOCK: Mutex<()> = Mutex::new(());

#[test]
#[serial]
fn fresh_hook_event_wins_over_pane_content_pattern_matching() {
    let _guard = HOME_LOCK.lock().unwrap();
    let _temp = setup_temp_home();
    let app_dir = agent_deck::session::get_app_dir().unwrap();
    let events_dir = app_dir.join("events");
    std::fs::create_dir_all(&events_dir).unwrap();
    std::fs::write(
        events_dir.join("hooked.json"),
        serde_json::json!({"event": "waiting", "timestamp": Utc::now().to_rfc3339()}).to_string(),
    )
    .unwrap();

    let pane = StubPane {
        alive: true,
        // Pane content alone would match the busy pattern, not waiting.
        content: "esc to interrupt".to_string(),
    };
    let tool = ClaudeTool;
    let input = DetectionInput {
        instance_id: "hooked",
        last_start: None,
        pane: &pane,
        tool: &tool,
    };
    assert_eq!(detect(&input), Status::Waiting);
}

#[test]
#[serial]
fn stale_hook_event_is_ignored_and_pane_content_is_used_instead() {
    let _guard = HOME_LOCK.lock().unwrap();
    let _temp = setup_temp_home();
    let app_dir = agent_deck::session::get_app_dir().unwrap();
    let events_dir = app_dir.join("events");
    std::fs::create_dir_all(&events_dir).unwrap();
    std::fs::write(
        events_dir.join("stale.json"),
        serde_json::json!({
            "event": "waiting",
            "timestamp": (Utc::now() - chrono::Duration::seconds(60)).to_rfc3339(),
        })
        .to_string(),
    )
    .unwrap();

    let pane = StubPane {
        alive: true,
        content: "esc to interrupt".to_string(),
    };
    let tool = ClaudeTool;
    let input = DetectionInput {
        instance_id: "stale",
        last_start: None,
        pane: &pane,
        tool: &tool,
    };
    assert_eq!(detect(&input), Status::Running);
}

#[test]
#[serial]
fn no_hook_event_file_falls_through_to_pane_content() {
    let _guard = HOME_LOCK.lock().unwrap();
    let _temp = setup_temp_home();

    let pane = StubPane {
        alive: true,
        content: "Do you want to proceed? [y/n]".to_string(),
    };
    let tool = ClaudeTool;
    let input = DetectionInput {
        instance_id: "no-hook",
        last_start: None,
        pane: &pane,
        tool: &tool,
    };
    assert_eq!(detect(&input), Status::Waiting);
}
