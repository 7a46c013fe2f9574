//! Pane foreground-process inspection, used by status detection to tell
//! "the tool is blocked reading a tty" apart from "the tool is off doing
//! network/disk work" (spec.md §4.4, stage 4 "pane inspection"). Ported
//! from the teacher's `process` module near-verbatim; only the module
//! path and doc comments changed.

use cfg_if::cfg_if;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessInputState {
    WaitingForInput,
    SleepingOther,
    Unknown,
}

pub fn get_foreground_pid(pane_pid: i32) -> Option<i32> {
    cfg_if! {
        if #[cfg(target_os = "linux")] {
            linux::get_foreground_pid(pane_pid)
        } else if #[cfg(target_os = "macos")] {
            macos::get_foreground_pid(pane_pid)
        } else {
            let _ = pane_pid;
            None
        }
    }
}

pub fn is_waiting_for_input(pid: i32) -> ProcessInputState {
    cfg_if! {
        if #[cfg(target_os = "linux")] {
            linux::is_waiting_for_input(pid)
        } else if #[cfg(target_os = "macos")] {
            macos::is_waiting_for_input(pid)
        } else {
            let _ = pid;
            ProcessInputState::Unknown
        }
    }
}
