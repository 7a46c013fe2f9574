//! The status loop (C5 concurrency): the long-running counterpart to the
//! one-shot `detect` pipeline. The teacher's TUI drives status polling
//! from its own render loop (`tui::app` ticks); this crate has no UI
//! thread to piggyback on, so polling becomes an explicit `tokio` task
//! any embedder (the CLI's long-running commands, or a future daemon)
//! can spawn. One `tokio::task::JoinSet` entry per session per tick
//! keeps a single slow pane from blocking the rest, and each entry is
//! capped at the subprocess ceiling so a wedged `tmux` call can't stall
//! the tick indefinitely.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::task::JoinSet;

use super::notifier::{Notifier, Transition};
use super::{detect, DetectionInput};
use crate::session::SessionStore;
use crate::tmux::PaneHandle;
use crate::tool::{self, ToolKind};

/// Per-tick ceiling on a single session's pane-capture + env-read, per
/// the ≤2s subprocess budget. A task that blows through this is left to
/// finish on its blocking thread; its result is simply not waited on for
/// this tick, and the next tick picks the session back up.
const SUBPROCESS_CEILING: Duration = Duration::from_secs(2);

/// Builds a fresh pane handle for a given instance id/title, without
/// tying the loop to a concrete `tmux::Session` so tests can swap in a
/// fake pane factory.
pub type PaneFactory = Arc<dyn Fn(&str, &str) -> Box<dyn PaneHandle> + Send + Sync>;

/// Run one status-detection pass over every instance in `store`,
/// returning the transitions worth surfacing. Pane construction and
/// detection for each instance run on the blocking thread pool inside a
/// `JoinSet`; `notifier` carries state across ticks so `run_status_loop`
/// can call this repeatedly.
async fn tick(
    store: &SessionStore,
    pane_factory: &PaneFactory,
    notifier: &mut Notifier,
) -> Result<Vec<Transition>> {
    let (mut instances, groups) = store.load()?;
    if instances.is_empty() {
        return Ok(Vec::new());
    }

    let mut set = JoinSet::new();
    for inst in instances.clone() {
        let factory = pane_factory.clone();
        set.spawn_blocking(move || {
            let pane = factory(&inst.id, &inst.title);
            let spec = tool::lookup(&ToolKind::parse(&inst.tool));
            let outcome = detect(&DetectionInput {
                instance_id: &inst.id,
                last_start: inst.last_start,
                previous_status: inst.status,
                last_error_check: inst.last_error_check,
                pane: pane.as_ref(),
                tool: spec.as_ref(),
            });
            (inst.id, inst.tool, outcome)
        });
    }

    let mut outcomes = HashMap::new();
    loop {
        match tokio::time::timeout(SUBPROCESS_CEILING, set.join_next()).await {
            Ok(Some(Ok((id, tool, outcome)))) => {
                outcomes.insert(id, (tool, outcome));
            }
            Ok(Some(Err(_join_err))) => continue,
            Ok(None) => break,
            Err(_elapsed) => {
                // One session's pane capture is past the ceiling; stop
                // waiting for it this tick rather than stall the rest.
                break;
            }
        }
    }

    let mut transitions = Vec::new();
    for inst in instances.iter_mut() {
        let Some((tool, outcome)) = outcomes.get(&inst.id) else {
            continue;
        };
        if let Some(transition) = notifier.observe(&inst.id, &inst.title, outcome.status) {
            transitions.push(transition);
        }
        inst.status = outcome.status;
        inst.last_error_check = outcome.next_last_error_check;
        if let Some(id) = &outcome.discovered_session_id {
            if inst.tool_session(tool).map(|r| r.session_id.as_str()) != Some(id.as_str()) {
                inst.set_tool_session(tool, id.clone());
            }
        }
    }

    store.save(&instances, &groups)?;
    Ok(transitions)
}

/// Poll every session in `store` forever, at `tick_interval`, feeding
/// each observed transition to `on_transition`. Returns only on a store
/// error — callers that want a cancellable loop should run this inside
/// `tokio::select!` against their own shutdown signal.
pub async fn run_status_loop(
    store: SessionStore,
    pane_factory: PaneFactory,
    tick_interval: Duration,
    mut on_transition: impl FnMut(Transition) + Send,
) -> Result<()> {
    let mut notifier = Notifier::new();
    loop {
        let transitions = tick(&store, &pane_factory, &mut notifier).await?;
        for t in transitions {
            on_transition(t);
        }
        tokio::time::sleep(tick_interval).await;
    }
}
