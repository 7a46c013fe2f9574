//! Lifecycle manager (C6): create/start/restart/fork/kill. Ported from
//! the teacher's `Instance::{start,restart,fork,kill}` and
//! `session::builder::build_instance`, reshaped around the store and a
//! pane-handle factory (rather than a hard dependency on the real tmux
//! binary) so the ready-wait state machine is unit-testable.

use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use uuid::Uuid;

use crate::session::{Instance, SessionStore, Status};
use crate::tmux::{PaneHandle, Session};
use crate::tool::{self, CommandContext, ToolKind};

/// Ceiling on how long `start_with_message` waits for the pane to print
/// its first byte of output before sending the queued prompt (spec.md
/// §4.2: "never block a caller indefinitely on a wedged tool").
const READY_WAIT_TIMEOUT: Duration = Duration::from_secs(60);
const READY_POLL_INTERVAL: Duration = Duration::from_millis(200);

type PaneFactory = Box<dyn Fn(&str, &str) -> Box<dyn PaneHandle> + Send + Sync>;

pub struct Manager {
    store: SessionStore,
    pane_factory: PaneFactory,
}

impl Manager {
    pub fn new(store: SessionStore) -> Self {
        Self::with_pane_factory(store, |id, title| {
            Box::new(Session::new(id, title)) as Box<dyn PaneHandle>
        })
    }

    pub fn with_pane_factory(
        store: SessionStore,
        factory: impl Fn(&str, &str) -> Box<dyn PaneHandle> + Send + Sync + 'static,
    ) -> Self {
        Self {
            store,
            pane_factory: Box::new(factory),
        }
    }

    fn pane_for(&self, instance: &Instance) -> Box<dyn PaneHandle> {
        (self.pane_factory)(&instance.id, &instance.title)
    }

    pub fn create(&self, title: &str, project_path: &str, tool: &str) -> Result<Instance> {
        let mut instance = Instance::new(title, project_path);
        instance.tool = tool.to_string();
        instance.worktree = crate::session::resolve_worktree_info(project_path, None);
        self.persist(&instance)?;
        Ok(instance)
    }

    pub fn start(&self, instance: &mut Instance) -> Result<()> {
        self.start_with_message(instance, None)
    }

    /// Launch the tool in a fresh pane and, if `message` is given, wait
    /// for the pane to produce its first output before sending it —
    /// sending a prompt into a pane that hasn't exec'd the tool yet is
    /// swallowed by the shell, not the tool (spec.md invariant: "a queued
    /// first message is never lost to a race with process startup").
    pub fn start_with_message(&self, instance: &mut Instance, message: Option<&str>) -> Result<()> {
        let pane = self.pane_for(instance);
        if pane.exists() {
            bail!("a pane already exists for instance {}", instance.id);
        }

        let kind = ToolKind::parse(&instance.tool);
        let spec = tool::lookup(&kind);
        let resume_id = instance
            .tool_session(&instance.tool)
            .map(|r| r.session_id.clone());

        // Pre-generated-UUID pattern (spec.md §4.4 point 3): a fresh start
        // on a tool that can accept a pre-assigned id mints one now, so
        // fork/restart don't have to wait for the tool's first turn.
        let pregenerated = if resume_id.is_none() && spec.session_id_cli_flag().is_some() {
            Some(Uuid::new_v4().to_string())
        } else {
            None
        };

        let ctx = CommandContext {
            project_path: &instance.project_path,
            resume_session_id: resume_id.as_deref(),
            pregenerated_session_id: pregenerated.as_deref(),
            dangerous_mode: false,
            extra_args: &[],
        };
        let command = spec.build_command(&ctx);

        let (env_key, env_val) = instance.instance_id_env();
        let mut env = vec![(env_key.to_string(), env_val.to_string())];
        let session_id_for_env = resume_id.clone().or_else(|| pregenerated.clone());
        if let (Some(env_var), Some(id)) = (spec.session_id_env(), session_id_for_env) {
            env.push((env_var.to_string(), id));
        }

        pane.create(&instance.project_path, &command, &env)?;

        if let Some(new_id) = pregenerated {
            let tool = instance.tool.clone();
            instance.set_tool_session(&tool, new_id);
        }

        instance.status = Status::Starting;
        instance.last_start = Some(Utc::now());

        if let Some(msg) = message {
            wait_until_ready(pane.as_ref())?;
            pane.send_keys(msg)?;
        }

        self.persist(instance)
    }

    /// Kill the pane (if any) and start fresh, preserving the instance's
    /// recorded tool session id so the relaunch resumes the same
    /// conversation (spec.md §4.2, ported from `Instance::restart`).
    pub fn restart(&self, instance: &mut Instance) -> Result<()> {
        let pane = self.pane_for(instance);
        if pane.exists() {
            pane.kill()?;
        }
        instance.skip_mcp_regenerate = false;
        self.start(instance)
    }

    /// Spawn a child instance resuming the parent's conversation via a
    /// dedicated fork command (spec.md §4.4 point 5, §4.6): never a bare
    /// `--resume` of the parent's id. The fork command mints its own new
    /// session id at shell runtime (`uuidgen`) and writes it to the
    /// multiplexer env itself, so the parent instance is left completely
    /// unmutated (spec.md §8 "Fork safety") and the child's own tool
    /// session id is left unset here — the status loop discovers it from
    /// the pane's env once the child is running.
    pub fn fork(&self, parent: &Instance) -> Result<Instance> {
        if !parent.can_fork() {
            bail!("session is not forkable: {}", parent.id);
        }
        let parent_session_id = parent
            .tool_session(&parent.tool)
            .map(|r| r.session_id.clone())
            .ok_or_else(|| anyhow!("fork requires a known parent session id: {}", parent.id))?;

        let mut child = Instance::new(&format!("{} (fork)", parent.title), &parent.project_path);
        child.tool = parent.tool.clone();
        child.group_path = parent.group_path.clone();
        child.parent_id = Some(parent.id.clone());
        child.parent_project_path = Some(parent.project_path.clone());

        let pane = self.pane_for(&child);
        if pane.exists() {
            bail!("a pane already exists for instance {}", child.id);
        }

        let spec = tool::lookup(&ToolKind::parse(&child.tool));
        let ctx = CommandContext {
            project_path: &child.project_path,
            resume_session_id: None,
            pregenerated_session_id: None,
            dangerous_mode: false,
            extra_args: &[],
        };
        let command = spec.build_fork_command(&parent.project_path, &parent_session_id, &ctx);

        let (env_key, env_val) = child.instance_id_env();
        pane.create(
            &child.project_path,
            &command,
            &[(env_key.to_string(), env_val.to_string())],
        )?;

        child.status = Status::Starting;
        child.last_start = Some(Utc::now());
        self.persist(&child)?;
        Ok(child)
    }

    pub fn kill(&self, instance_id: &str) -> Result<()> {
        let (mut instances, groups) = self.store.load()?;
        let idx = instances
            .iter()
            .position(|i| i.id == instance_id)
            .ok_or_else(|| anyhow!("session not found: {instance_id}"))?;
        let instance = instances.remove(idx);
        let pane = self.pane_for(&instance);
        if pane.exists() {
            pane.kill()?;
        }
        self.store.save(&instances, &groups)?;
        Ok(())
    }

    fn persist(&self, instance: &Instance) -> Result<()> {
        let (mut instances, groups) = self.store.load()?;
        match instances.iter_mut().find(|i| i.id == instance.id) {
            Some(existing) => *existing = instance.clone(),
            None => instances.push(instance.clone()),
        }
        self.store.save(&instances, &groups)?;
        Ok(())
    }
}

fn wait_until_ready(pane: &dyn PaneHandle) -> Result<()> {
    let start = Instant::now();
    loop {
        if let Ok(content) = pane.capture_pane(20) {
            if !content.trim().is_empty() {
                return Ok(());
            }
        }
        if start.elapsed() > READY_WAIT_TIMEOUT {
            bail!("timed out waiting for pane to become ready");
        }
        std::thread::sleep(READY_POLL_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tmux::fake::FakePane;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn manager_with_fakes() -> (Manager, TempDir, Arc<std::sync::Mutex<Vec<Arc<FakePane>>>>) {
        let dir = TempDir::new().unwrap();
        let storage = crate::session::Storage::open(dir.path()).unwrap();
        let store = crate::session::SessionStore::open_with_storage(storage);
        let panes: Arc<std::sync::Mutex<Vec<Arc<FakePane>>>> = Arc::new(std::sync::Mutex::new(Vec::new()));
        let panes_clone = panes.clone();
        let manager = Manager::with_pane_factory(store, move |id, _title| {
            let pane = Arc::new(FakePane::new(id));
            panes_clone.lock().unwrap().push(pane.clone());
            Box::new(ClonePane(pane)) as Box<dyn PaneHandle>
        });
        (manager, dir, panes)
    }

    /// Wraps an `Arc<FakePane>` so the factory closure can keep its own
    /// handle for assertions while the trait object is handed to `Manager`.
    struct ClonePane(Arc<FakePane>);

    impl PaneHandle for ClonePane {
        fn name(&self) -> &str {
            self.0.name()
        }
        fn exists(&self) -> bool {
            self.0.exists()
        }
        fn create(&self, cwd: &str, command: &str, env: &[(String, String)]) -> crate::tmux::Result<()> {
            self.0.create(cwd, command, env)
        }
        fn kill(&self) -> crate::tmux::Result<()> {
            self.0.kill()
        }
        fn send_keys(&self, keys: &str) -> crate::tmux::Result<()> {
            self.0.send_keys(keys)
        }
        fn capture_pane(&self, lines: i32) -> crate::tmux::Result<String> {
            self.0.capture_pane(lines)
        }
        fn get_pane_pid(&self) -> crate::tmux::Result<i32> {
            self.0.get_pane_pid()
        }
        fn get_env(&self, key: &str) -> crate::tmux::Result<Option<String>> {
            self.0.get_env(key)
        }
    }

    #[test]
    fn start_creates_pane_and_marks_starting() {
        let (manager, _dir, panes) = manager_with_fakes();
        let mut instance = Instance::new("demo", "/tmp/demo");
        instance.tool = "shell".to_string();

        manager.start(&mut instance).unwrap();
        assert_eq!(instance.status, Status::Starting);
        assert!(instance.last_start.is_some());
        assert!(panes.lock().unwrap()[0].exists());
    }

    #[test]
    fn start_twice_without_kill_fails() {
        let (manager, _dir, _panes) = manager_with_fakes();
        let mut instance = Instance::new("demo", "/tmp/demo");
        manager.start(&mut instance).unwrap();
        assert!(manager.start(&mut instance).is_err());
    }

    #[test]
    fn start_with_message_sends_once_pane_has_output() {
        let (manager, _dir, panes) = manager_with_fakes();
        let mut instance = Instance::new("demo", "/tmp/demo");

        // Pre-seed content so wait_until_ready returns immediately.
        let factory_panes = panes.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            if let Some(pane) = factory_panes.lock().unwrap().first() {
                pane.set_pane_content("$ ");
            }
        });

        manager
            .start_with_message(&mut instance, Some("hello\n"))
            .unwrap();
        let pane = panes.lock().unwrap()[0].clone();
        assert_eq!(pane.sent_keys(), vec!["hello\n".to_string()]);
    }

    #[test]
    fn fork_requires_can_fork() {
        let (manager, _dir, panes) = manager_with_fakes();
        let mut parent = Instance::new("demo", "/tmp/demo");
        parent.tool = "claude".to_string();
        assert!(manager.fork(&parent).is_err());

        parent.set_tool_session("claude", "abc".to_string());
        let child = manager.fork(&parent).unwrap();
        assert_eq!(child.parent_id, Some(parent.id.clone()));
        assert_eq!(child.parent_project_path, Some(parent.project_path.clone()));
        // The fork command mints its own id at shell runtime; the manager
        // never guesses it, so the child's own session bag starts empty.
        assert!(child.tool_session("claude").is_none());

        let pane = panes.lock().unwrap().last().unwrap().clone();
        assert!(pane.exists());
    }

    #[test]
    fn fork_never_mutates_the_parent() {
        let (manager, _dir, _panes) = manager_with_fakes();
        let mut parent = Instance::new("demo", "/tmp/demo");
        parent.tool = "claude".to_string();
        parent.set_tool_session("claude", "abc".to_string());
        let before = parent.clone();

        manager.fork(&parent).unwrap();
        assert_eq!(parent.id, before.id);
        assert_eq!(
            parent.tool_session("claude").map(|r| r.session_id.clone()),
            before.tool_session("claude").map(|r| r.session_id.clone())
        );
    }

    #[test]
    fn fork_command_never_contains_a_bare_resume() {
        let (manager, _dir, panes) = manager_with_fakes();
        let mut parent = Instance::new("demo", "/tmp/demo");
        parent.tool = "claude".to_string();
        parent.set_tool_session("claude", "abc-123".to_string());

        manager.fork(&parent).unwrap();
        let pane = panes.lock().unwrap().last().unwrap().clone();
        let command = pane.last_command();
        assert!(command.contains("--fork-session"));
        assert!(command.contains("uuidgen"));
        assert_ne!(command.trim(), "claude --resume abc-123");
    }

    #[test]
    fn kill_removes_instance_and_kills_pane() {
        let (manager, _dir, panes) = manager_with_fakes();
        let mut instance = Instance::new("demo", "/tmp/demo");
        manager.start(&mut instance).unwrap();
        manager.kill(&instance.id).unwrap();
        assert!(!panes.lock().unwrap()[0].exists());

        let (instances, _) = manager.store.load().unwrap();
        assert!(instances.is_empty());
    }
}
