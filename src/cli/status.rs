//! `agent-deck status` — summarize session counts by status. Ported from
//! the teacher's `cli::status` (json/quiet/verbose output modes,
//! `StatusCounts`, `shorten_path`), generalized from Claude-only instances
//! to any tool.

use std::collections::BTreeMap;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::session::{Instance, SessionStore, Status};

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Emit machine-readable JSON instead of a text summary.
    #[arg(long)]
    pub json: bool,
    /// Print only the total count.
    #[arg(long)]
    pub quiet: bool,
    /// Print one line per session instead of just the per-status counts.
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Debug, Default, Serialize)]
pub struct StatusCounts {
    pub starting: usize,
    pub running: usize,
    pub waiting: usize,
    pub idle: usize,
    pub error: usize,
}

#[derive(Debug, Serialize)]
pub struct StatusJson {
    pub total: usize,
    pub counts: StatusCounts,
    pub sessions: Vec<SessionSummary>,
}

#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub id: String,
    pub title: String,
    pub status: Status,
    pub group_path: String,
    pub project_path: String,
}

pub fn count_by_status(instances: &[Instance]) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for inst in instances {
        match inst.status {
            Status::Starting => counts.starting += 1,
            Status::Running => counts.running += 1,
            Status::Waiting => counts.waiting += 1,
            Status::Idle => counts.idle += 1,
            Status::Error => counts.error += 1,
        }
    }
    counts
}

/// Shorten a long path for terminal display: keep the last two segments,
/// collapsing everything before them into `…`.
pub fn shorten_path(path: &str, max_segments: usize) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() <= max_segments {
        return path.to_string();
    }
    let tail = &segments[segments.len() - max_segments..];
    format!(".../{}", tail.join("/"))
}

pub async fn run(profile: &str, args: StatusArgs) -> Result<()> {
    let store = SessionStore::open_profile(profile)?;
    let (instances, _groups) = store.load()?;
    let counts = count_by_status(&instances);

    if args.json {
        let mut by_group: BTreeMap<String, Vec<SessionSummary>> = BTreeMap::new();
        for inst in &instances {
            by_group
                .entry(inst.effective_group_path().to_string())
                .or_default()
                .push(SessionSummary {
                    id: inst.id.clone(),
                    title: inst.title.clone(),
                    status: inst.status,
                    group_path: inst.effective_group_path().to_string(),
                    project_path: inst.project_path.clone(),
                });
        }
        let payload = StatusJson {
            total: instances.len(),
            counts,
            sessions: by_group.into_values().flatten().collect(),
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if args.quiet {
        println!("{}", instances.len());
        return Ok(());
    }

    println!(
        "{} sessions: {} starting, {} running, {} waiting, {} idle, {} error",
        instances.len(),
        counts.starting,
        counts.running,
        counts.waiting,
        counts.idle,
        counts.error
    );

    if args.verbose {
        for inst in &instances {
            println!(
                "  [{:?}] {} ({}) — {}",
                inst.status,
                inst.title,
                crate::cli::truncate_id(&inst.id, 8),
                shorten_path(&inst.project_path, 2),
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_by_status_tallies_each_bucket() {
        let mut a = Instance::new("a", "/tmp/a");
        a.status = Status::Running;
        let mut b = Instance::new("b", "/tmp/b");
        b.status = Status::Running;
        let mut c = Instance::new("c", "/tmp/c");
        c.status = Status::Idle;

        let counts = count_by_status(&[a, b, c]);
        assert_eq!(counts.running, 2);
        assert_eq!(counts.idle, 1);
        assert_eq!(counts.waiting, 0);
    }

    #[test]
    fn shorten_path_keeps_last_segments() {
        assert_eq!(shorten_path("/home/user/projects/my-app", 2), ".../projects/my-app");
        assert_eq!(shorten_path("/tmp/app", 2), "/tmp/app");
    }
}
