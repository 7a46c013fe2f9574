//! Tool-file synchronizer (C8): pull each tool's own record of what
//! session id is attached to a project and fold it back into the
//! instance's `tool_sessions` bag. Runs on a timer alongside status
//! detection (see `lifecycle`/`main`), independent of the status pipeline
//! itself — a tool can be mid-response (status `Running`) while its
//! session file hasn't rolled over to a new id yet, and vice versa.

pub mod claude;
pub mod gemini;
pub mod opencode;

use crate::session::Instance;
use crate::tool::ToolKind;

/// Discover the tool's current session id for this instance and record it
/// if it differs from what's already known. Returns `true` if the
/// instance's `tool_sessions` bag changed.
pub fn sync_instance(instance: &mut Instance) -> bool {
    let kind = ToolKind::parse(&instance.tool);
    let current_id = instance.tool_session(&instance.tool).map(|r| r.session_id.clone());
    let discovered = match kind {
        ToolKind::Claude => claude::discover_latest_session_id(
            &instance.project_path,
            current_id.as_deref(),
            // No cross-instance disambiguation yet: siblings sharing a
            // project directory can still race each other onto the same
            // session file.
            &std::collections::HashSet::new(),
        ),
        ToolKind::Gemini => {
            gemini::discover_latest_session(&instance.project_path).map(|(id, _)| id)
        }
        ToolKind::OpenCode => opencode::discover_latest_session(&instance.project_path),
        ToolKind::Codex | ToolKind::Shell | ToolKind::Custom(_) => None,
    };

    match discovered {
        Some(id)
            if instance.tool_session(&instance.tool).map(|r| r.session_id.as_str())
                != Some(id.as_str()) =>
        {
            let tool = instance.tool.clone();
            instance.set_tool_session(&tool, id);
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codex_and_shell_tools_are_never_synced_from_files() {
        let mut instance = Instance::new("demo", "/tmp/demo");
        instance.tool = "codex".to_string();
        assert!(!sync_instance(&mut instance));

        instance.tool = "shell".to_string();
        assert!(!sync_instance(&mut instance));
    }
}
