//! Transition notifications and the adaptive poll interval. Grounded on
//! the teacher's status loop cadence (it polls tighter while a session
//! looks busy and backs off once idle) but expressed as a pure function
//! plus an explicit `Notifier` struct instead of a global timer.

use std::collections::HashMap;
use std::time::Duration;

use super::Status;

pub fn poll_interval(status: Status) -> Duration {
    match status {
        Status::Starting | Status::Running => Duration::from_millis(500),
        Status::Waiting => Duration::from_secs(2),
        Status::Idle | Status::Error => Duration::from_secs(5),
    }
}

/// A status transition worth surfacing to the user, e.g. in a desktop
/// notification or a CLI "what changed" line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub instance_id: String,
    pub title: String,
    pub from: Status,
    pub to: Status,
}

/// Tracks the last-seen status per instance and reports only the
/// transitions worth a notification: `Running`/`Starting` -> `Waiting`
/// (the tool needs the user) and anything -> `Error`.
#[derive(Default)]
pub struct Notifier {
    last_seen: HashMap<String, Status>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, instance_id: &str, title: &str, new_status: Status) -> Option<Transition> {
        let previous = self.last_seen.insert(instance_id.to_string(), new_status);
        match previous {
            Some(old) if old != new_status && is_notable(old, new_status) => Some(Transition {
                instance_id: instance_id.to_string(),
                title: title.to_string(),
                from: old,
                to: new_status,
            }),
            _ => None,
        }
    }
}

fn is_notable(from: Status, to: Status) -> bool {
    to == Status::Error || (to == Status::Waiting && from != Status::Waiting)
}
