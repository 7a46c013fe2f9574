//! Hook fast-path: tool-emitted lifecycle events written to
//! `~/.agent-deck/events/<instance_id>.json`, checked before falling back
//! to pane-content pattern matching (spec.md §4.4 stage 3). Grounded on
//! the teacher's claude-session-id detection in
//! `session::instance::Instance::update_status`, which reads a sidecar
//! file rather than re-deriving everything from the pane.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::PathBuf;

use super::Status;

const HOOK_EVENT_MAX_AGE_SECS: i64 = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct HookEvent {
    pub event: String,
    pub timestamp: DateTime<Utc>,
}

impl HookEvent {
    pub fn as_status(&self) -> Option<Status> {
        match self.event.as_str() {
            "busy" | "tool_use" | "assistant_message" => Some(Status::Running),
            "waiting" | "permission_request" | "notification" => Some(Status::Waiting),
            "idle" | "stop" => Some(Status::Idle),
            "error" => Some(Status::Error),
            _ => None,
        }
    }

    fn is_fresh(&self) -> bool {
        Utc::now().signed_duration_since(self.timestamp).num_seconds() <= HOOK_EVENT_MAX_AGE_SECS
    }
}

fn events_dir() -> Option<PathBuf> {
    crate::session::get_app_dir().ok().map(|d| d.join("events"))
}

/// Read the most recent hook event for an instance, discarding it if it's
/// older than the freshness window (a stale event from a previous run
/// must never pin the status forever).
pub fn read_hook_event(instance_id: &str) -> Option<HookEvent> {
    let path = events_dir()?.join(format!("{instance_id}.json"));
    let content = std::fs::read_to_string(path).ok()?;
    let event: HookEvent = serde_json::from_str(&content).ok()?;
    if event.is_fresh() {
        Some(event)
    } else {
        None
    }
}
