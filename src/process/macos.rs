//! `ps`-based process inspection for macOS (no stable `/proc` there).
//! Ported from the teacher's `process::macos` module.

use super::ProcessInputState;
use std::process::Command;

pub fn get_foreground_pid(pane_pid: i32) -> Option<i32> {
    let output = Command::new("ps")
        .args(["-o", "tpgid=", "-p", &pane_pid.to_string()])
        .output()
        .ok()?;
    let tpgid: i32 = String::from_utf8_lossy(&output.stdout).trim().parse().ok()?;
    if tpgid <= 0 {
        return None;
    }
    find_process_in_group(tpgid)
}

fn find_process_in_group(pgid: i32) -> Option<i32> {
    let output = Command::new("ps").args(["-o", "pid=,pgid=", "-A"]).output().ok()?;
    let text = String::from_utf8_lossy(&output.stdout);
    for line in text.lines() {
        let mut parts = line.split_whitespace();
        let pid: i32 = parts.next()?.parse().ok()?;
        let group: i32 = parts.next()?.parse().ok()?;
        if group == pgid {
            return Some(pid);
        }
    }
    None
}

pub fn is_waiting_for_input(pid: i32) -> ProcessInputState {
    let output = match Command::new("ps")
        .args(["-o", "stat=,wchan=", "-p", &pid.to_string()])
        .output()
    {
        Ok(o) => o,
        Err(_) => return ProcessInputState::Unknown,
    };
    let text = String::from_utf8_lossy(&output.stdout);
    let mut parts = text.split_whitespace();
    let stat = parts.next().unwrap_or("");
    let wchan = parts.next().unwrap_or("");

    if !stat.starts_with('S') && !stat.starts_with('D') {
        return ProcessInputState::Unknown;
    }

    if wchan.contains("ttyin") || wchan.contains("ttyout") || wchan.contains("ttyraw") {
        ProcessInputState::WaitingForInput
    } else if wchan.contains("select") || wchan.contains("poll") || wchan.contains("kevent") {
        ProcessInputState::Unknown
    } else if wchan.contains("netio") || wchan.contains("sbwait") || wchan.contains("ucond") {
        ProcessInputState::SleepingOther
    } else {
        ProcessInputState::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wchan_classification_matches_known_categories() {
        // These are exercised indirectly through is_waiting_for_input in
        // integration coverage; this test documents the category table.
        let cases = [
            ("ttyin", true),
            ("select", false),
            ("netio", false),
        ];
        for (wchan, is_input) in cases {
            let classified_as_input = wchan.contains("ttyin")
                || wchan.contains("ttyout")
                || wchan.contains("ttyraw");
            assert_eq!(classified_as_input, is_input);
        }
    }
}
