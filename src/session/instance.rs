//! Session instance definition.
//!
//! Generalizes the teacher's single-tool `claude_session_id` /
//! `claude_detected_at` pair into a per-tool bag (`tool_sessions`), since
//! this supervisor must track Claude, Gemini, OpenCode, Codex, and custom
//! tools side by side rather than Claude alone (spec.md §3, "Tool
//! session-id bag").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_GROUP: &str = "my-sessions";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Starting,
    Running,
    Waiting,
    #[default]
    Idle,
    Error,
}

/// A single tool's recorded conversation id, and when the supervisor
/// learned about it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSessionRecord {
    pub session_id: String,
    pub detected_at: DateTime<Utc>,
}

/// Informational worktree triple. No worktree mutation happens in this
/// crate (out of scope, spec.md §1) — these fields exist purely so a
/// caller that *does* manage worktrees can stash the result here for
/// default-path resolution (spec.md §4.3) and display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorktreeInfo {
    pub worktree_path: String,
    pub worktree_repo_root: String,
    pub worktree_branch: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub id: String,
    pub title: String,
    pub project_path: String,

    #[serde(default)]
    pub group_path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_project_path: Option<String>,

    #[serde(default)]
    pub tool: String,
    #[serde(default)]
    pub command: String,

    #[serde(default)]
    pub status: Status,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waiting_since: Option<DateTime<Utc>>,

    /// Per-tool conversation id bag (spec.md §3: "Two IDs are not allowed
    /// to coexist for the same tool across instances").
    #[serde(default, skip_serializing_if = "std::collections::HashMap::is_empty")]
    pub tool_sessions: std::collections::HashMap<String, ToolSessionRecord>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worktree: Option<WorktreeInfo>,

    /// Opaque per-tool options blob, preserved verbatim across save/load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_options: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub loaded_mcp_names: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_prompt: Option<String>,

    // Runtime-only state, never persisted.
    #[serde(skip)]
    pub last_start: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub last_error_check: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub skip_mcp_regenerate: bool,
}

impl Instance {
    pub fn new(title: &str, project_path: &str) -> Self {
        Self {
            id: generate_id(),
            title: title.to_string(),
            project_path: project_path.to_string(),
            group_path: String::new(),
            parent_id: None,
            parent_project_path: None,
            tool: "shell".to_string(),
            command: String::new(),
            status: Status::Idle,
            created_at: Utc::now(),
            last_activity: None,
            waiting_since: None,
            tool_sessions: std::collections::HashMap::new(),
            worktree: None,
            tool_options: None,
            loaded_mcp_names: Vec::new(),
            latest_prompt: None,
            last_start: None,
            last_error_check: None,
            skip_mcp_regenerate: false,
        }
    }

    /// `group_path` normalized per invariant 1: empty maps to the default group.
    pub fn effective_group_path(&self) -> &str {
        if self.group_path.is_empty() {
            DEFAULT_GROUP
        } else {
            &self.group_path
        }
    }

    pub fn is_sub_session(&self) -> bool {
        self.parent_id.is_some()
    }

    pub fn tool_session(&self, tool: &str) -> Option<&ToolSessionRecord> {
        self.tool_sessions.get(tool)
    }

    pub fn set_tool_session(&mut self, tool: &str, session_id: String) {
        self.tool_sessions.insert(
            tool.to_string(),
            ToolSessionRecord {
                session_id,
                detected_at: Utc::now(),
            },
        );
    }

    pub fn clear_tool_session(&mut self, tool: &str) {
        self.tool_sessions.remove(tool);
    }

    /// True when this session can be forked per spec.md §4.6: supported
    /// tool, a known session id, detected within the last 5 minutes.
    pub fn can_fork(&self) -> bool {
        match self.tool_sessions.get(&self.tool) {
            Some(rec) => Utc::now().signed_duration_since(rec.detected_at).num_seconds() < 300,
            None => false,
        }
    }

    /// The multiplexer pane's expected `INSTANCE_ID` environment value
    /// (spec.md invariant 7). Kept as a plain accessor rather than a
    /// back-pointer into the pane handle (DESIGN NOTES §9).
    pub fn instance_id_env(&self) -> (&'static str, &str) {
        ("INSTANCE_ID", &self.id)
    }
}

fn generate_id() -> String {
    Uuid::new_v4().to_string().replace('-', "")[..16].to_string()
}
