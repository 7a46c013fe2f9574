//! Status detection (C5): a priority pipeline, not a single pattern match.
//! Ported from the teacher's `Instance::update_status` (grace period,
//! error short-circuit, pane-content matching) and generalized with a
//! hook fast-path and tool-specific pattern catalogs (C4).

pub mod hooks;
pub mod loop_runner;
pub mod notifier;

pub use crate::session::instance::Status;
pub use loop_runner::{run_status_loop, PaneFactory};

use chrono::{DateTime, Utc};

use crate::process::{self, ProcessInputState};
use crate::tmux::PaneHandle;
use crate::tool::ToolSpec;

/// Instances younger than this are reported `Starting` regardless of pane
/// content — tools print nothing meaningful in their first moments.
const STARTING_GRACE_MS: i64 = 1500;

/// How long an `error` status is trusted without rechecking the pane
/// (spec.md §4.5 #2): a dead pane doesn't come back on its own, so there's
/// no point re-running the full probe chain every tick.
const ERROR_RECHECK_SECS: i64 = 30;

pub struct DetectionInput<'a> {
    pub instance_id: &'a str,
    pub last_start: Option<DateTime<Utc>>,
    pub previous_status: Status,
    pub last_error_check: Option<DateTime<Utc>>,
    pub pane: &'a dyn PaneHandle,
    pub tool: &'a dyn ToolSpec,
}

/// Result of one `detect()` call: the status plus the side effects the
/// tick driver needs to persist back onto the instance.
pub struct DetectionOutcome {
    pub status: Status,
    /// New value for `Instance.last_error_check` (spec.md §4.5 #2: set
    /// when a fresh probe lands on `error`, cleared the moment a pane is
    /// observed, left as-is while the short-circuit is in effect).
    pub next_last_error_check: Option<DateTime<Utc>>,
    /// The tool's own session id, read from the multiplexer env this tick
    /// (spec.md §4.5 "side effects per tick"), if the tool declares a
    /// `session_id_env` and the pane had one set.
    pub discovered_session_id: Option<String>,
}

/// Run the five-stage pipeline and return the detected status plus its
/// side effects.
///
/// 1. Starting grace period (pane not yet up).
/// 2. Error short-circuit (previous tick was `error`, recheck window not
///    yet elapsed).
/// 3. Pane-gone check.
/// 4. Hook fast-path (tool-emitted lifecycle events).
/// 5. Pane content pattern matching (`busy_patterns` before
///    `prompt_patterns`), then foreground-process input-wait inspection,
///    then default to `Idle`.
pub fn detect(input: &DetectionInput) -> DetectionOutcome {
    if let Some(start) = input.last_start {
        let elapsed_ms = Utc::now().signed_duration_since(start).num_milliseconds();
        if elapsed_ms < STARTING_GRACE_MS && !input.pane.exists() {
            return DetectionOutcome {
                status: Status::Starting,
                next_last_error_check: input.last_error_check,
                discovered_session_id: None,
            };
        }
    }

    if input.previous_status == Status::Error {
        if let Some(checked) = input.last_error_check {
            if Utc::now().signed_duration_since(checked).num_seconds() < ERROR_RECHECK_SECS {
                return DetectionOutcome {
                    status: Status::Error,
                    next_last_error_check: input.last_error_check,
                    discovered_session_id: None,
                };
            }
        }
    }

    if !input.pane.exists() {
        return DetectionOutcome {
            status: Status::Error,
            next_last_error_check: Some(Utc::now()),
            discovered_session_id: None,
        };
    }
    // A pane was observed: the error-recheck window no longer applies.
    let next_last_error_check = None;

    let discovered_session_id = input
        .tool
        .session_id_env()
        .and_then(|var| input.pane.get_env(var).ok().flatten());

    if let Some(event) = hooks::read_hook_event(input.instance_id) {
        if let Some(status) = event.as_status() {
            return DetectionOutcome {
                status,
                next_last_error_check,
                discovered_session_id,
            };
        }
    }

    let pane_content = match input.pane.capture_pane(50) {
        Ok(content) => content,
        Err(_) => {
            return DetectionOutcome {
                status: Status::Error,
                next_last_error_check: Some(Utc::now()),
                discovered_session_id,
            }
        }
    };

    // Busy wins over a stale prompt still sitting in the scrollback: a
    // pane showing both "esc to interrupt" and a leftover confirmation
    // line is actively working, not waiting on the user.
    if input
        .tool
        .busy_patterns()
        .iter()
        .any(|p| p.is_match(&pane_content))
    {
        return DetectionOutcome {
            status: Status::Running,
            next_last_error_check,
            discovered_session_id,
        };
    }
    if input
        .tool
        .prompt_patterns()
        .iter()
        .any(|p| p.is_match(&pane_content))
    {
        return DetectionOutcome {
            status: Status::Waiting,
            next_last_error_check,
            discovered_session_id,
        };
    }

    if let Ok(pane_pid) = input.pane.get_pane_pid() {
        if let Some(fg_pid) = process::get_foreground_pid(pane_pid) {
            match process::is_waiting_for_input(fg_pid) {
                ProcessInputState::WaitingForInput => {
                    return DetectionOutcome {
                        status: Status::Waiting,
                        next_last_error_check,
                        discovered_session_id,
                    }
                }
                ProcessInputState::SleepingOther => {
                    return DetectionOutcome {
                        status: Status::Running,
                        next_last_error_check,
                        discovered_session_id,
                    }
                }
                ProcessInputState::Unknown => {}
            }
        }
    }

    DetectionOutcome {
        status: Status::Idle,
        next_last_error_check,
        discovered_session_id,
    }
}
