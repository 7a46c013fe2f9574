//! `/proc`-based process inspection for Linux. Ported from the teacher's
//! `process::linux` module.

use super::ProcessInputState;
use std::fs;

pub fn get_foreground_pid(pane_pid: i32) -> Option<i32> {
    let stat = fs::read_to_string(format!("/proc/{pane_pid}/stat")).ok()?;
    let tpgid = parse_stat_field(&stat, 8)?;
    if tpgid > 0 {
        find_process_in_group(tpgid)
    } else {
        None
    }
}

fn find_process_in_group(pgid: i32) -> Option<i32> {
    let entries = fs::read_dir("/proc").ok()?;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_str()?;
        let pid: i32 = name.parse().ok()?;
        if let Ok(stat) = fs::read_to_string(format!("/proc/{pid}/stat")) {
            if let Some(group) = parse_stat_field(&stat, 5) {
                if group == pgid {
                    return Some(pid);
                }
            }
        }
    }
    None
}

/// `/proc/<pid>/stat` fields are space-separated, except field 2 (comm)
/// which is parenthesized and may itself contain spaces; fields are
/// indexed from 1 per `proc(5)`, counting from the closing paren.
fn parse_stat_field(stat: &str, field: usize) -> Option<i32> {
    let after_comm = stat.rfind(')')?;
    let rest = &stat[after_comm + 1..];
    rest.split_whitespace().nth(field - 3)?.parse().ok()
}

fn parse_process_state(stat: &str) -> Option<char> {
    let after_comm = stat.rfind(')')?;
    stat[after_comm + 1..].split_whitespace().next()?.chars().next()
}

pub fn is_waiting_for_input(pid: i32) -> ProcessInputState {
    let stat = match fs::read_to_string(format!("/proc/{pid}/stat")) {
        Ok(s) => s,
        Err(_) => return ProcessInputState::Unknown,
    };
    let state = parse_process_state(&stat);
    if state != Some('S') && state != Some('D') {
        return ProcessInputState::Unknown;
    }

    let wchan = fs::read_to_string(format!("/proc/{pid}/wchan")).unwrap_or_default();
    if wchan.contains("n_tty_read") || wchan.contains("tty_read") || wchan.contains("pty_read") {
        ProcessInputState::WaitingForInput
    } else if wchan.contains("do_select")
        || wchan.contains("do_poll")
        || wchan.contains("do_epoll")
        || wchan.contains("futex_wait")
    {
        ProcessInputState::Unknown
    } else if wchan.contains("inet")
        || wchan.contains("tcp")
        || wchan.contains("unix_stream")
        || wchan.contains("sk_wait")
    {
        ProcessInputState::SleepingOther
    } else {
        ProcessInputState::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_stat_field_handles_comm_with_spaces() {
        let stat = "1234 (my weird name) S 1000 1234 1234 0 -1 4194304";
        // field 4 = ppid in this truncated sample
        assert_eq!(parse_stat_field(stat, 4), Some(1000));
    }

    #[test]
    fn parse_process_state_reads_the_single_char_after_comm() {
        let stat = "1234 (bash) S 1000 1234 1234 0 -1 4194304";
        assert_eq!(parse_process_state(stat), Some('S'));
    }
}
