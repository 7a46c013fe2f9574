//! `agent-deck session ...` — create/start/stop/restart/attach/fork.
//! Ported from the teacher's `cli::session` (`SessionCommands`,
//! resolve-then-mutate-then-save shape), generalized to the `lifecycle::Manager`.

use anyhow::Result;
use clap::Subcommand;

use crate::lifecycle::Manager;
use crate::session::SessionStore;
use crate::tmux::Session;

#[derive(Debug, Subcommand)]
pub enum SessionCommands {
    /// Create and start a new session.
    Start {
        title: String,
        path: String,
        #[arg(long, default_value = "shell")]
        tool: String,
    },
    /// Kill the pane and forget the session.
    Stop { id: String },
    /// Kill and relaunch the pane, resuming the recorded conversation.
    Restart { id: String },
    /// Attach the current terminal to a session's pane.
    Attach { id: String },
    /// Fork a forkable session into a new child instance.
    Fork { id: String },
    /// Print one session's full details.
    Show { id: String },
}

pub async fn run(profile: &str, command: SessionCommands) -> Result<()> {
    let store = SessionStore::open_profile(profile)?;
    let manager = Manager::new(store.clone());

    match command {
        SessionCommands::Start { title, path, tool } => {
            let mut instance = manager.create(&title, &path, &tool)?;
            manager.start(&mut instance)?;
            println!("started {} ({})", instance.title, instance.id);
        }
        SessionCommands::Stop { id } => {
            let (instances, _) = store.load()?;
            let target = crate::cli::resolve_session(&instances, &id)?;
            manager.kill(&target.id)?;
            println!("stopped {id}");
        }
        SessionCommands::Restart { id } => {
            let (mut instances, groups) = store.load()?;
            let idx = {
                let target = crate::cli::resolve_session(&instances, &id)?;
                instances.iter().position(|i| i.id == target.id).unwrap()
            };
            manager.restart(&mut instances[idx])?;
            store.save(&instances, &groups)?;
            println!("restarted {}", instances[idx].title);
        }
        SessionCommands::Attach { id } => {
            let (instances, _) = store.load()?;
            let target = crate::cli::resolve_session(&instances, &id)?;
            Session::new(&target.id, &target.title).attach()?;
        }
        SessionCommands::Fork { id } => {
            let (instances, _) = store.load()?;
            let target = crate::cli::resolve_session(&instances, &id)?;
            let child = manager.fork(target)?;
            println!("forked {} -> {}", target.title, child.id);
        }
        SessionCommands::Show { id } => {
            let (instances, _) = store.load()?;
            let target = crate::cli::resolve_session(&instances, &id)?;
            println!("{}", serde_json::to_string_pretty(target)?);
        }
    }

    Ok(())
}
