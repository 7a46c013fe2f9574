//! `agent-deck group ...` — list/create/rename/delete/reorder groups.

use anyhow::Result;
use clap::Subcommand;

use crate::session::{flatten_tree, GroupTree, Item, MoveDirection, SessionStore};

#[derive(Debug, Subcommand)]
pub enum GroupCommands {
    /// Print the flattened group/session tree.
    List,
    /// Create a group (and any missing ancestor groups).
    Create { path: String },
    /// Rename a group's last path segment.
    Rename { path: String, name: String },
    /// Delete a group, reparenting its contents into the default group.
    Delete { path: String },
    /// Move a group up among its siblings.
    MoveUp { path: String },
    /// Move a group down among its siblings.
    MoveDown { path: String },
}

pub async fn run(profile: &str, command: GroupCommands) -> Result<()> {
    let store = SessionStore::open_profile(profile)?;
    let (mut instances, groups) = store.load()?;
    let mut tree = GroupTree::new_with_groups(&instances, &groups);

    match command {
        GroupCommands::List => {
            for item in flatten_tree(&instances, tree.groups()) {
                match item {
                    Item::Group(g) => println!("{}{}/", "  ".repeat(g.depth), g.name),
                    Item::Session(s) => {
                        let title = instances
                            .iter()
                            .find(|i| i.id == s.instance_id)
                            .map(|i| i.title.as_str())
                            .unwrap_or("?");
                        println!("{}{}", "  ".repeat(s.depth), title);
                    }
                }
            }
            return Ok(());
        }
        GroupCommands::Create { path } => {
            tree.create_group(&path);
        }
        GroupCommands::Rename { path, name } => {
            tree.rename_group(&path, &name);
        }
        GroupCommands::Delete { path } => {
            if !tree.delete_group(&path, &mut instances) {
                anyhow::bail!("cannot delete group '{path}'");
            }
        }
        GroupCommands::MoveUp { path } => {
            tree.move_group(&path, MoveDirection::Up);
        }
        GroupCommands::MoveDown { path } => {
            tree.move_group(&path, MoveDirection::Down);
        }
    }

    store.save(&instances, tree.groups())?;
    Ok(())
}
