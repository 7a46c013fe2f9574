//! Integration tests for group tree mutations round-tripping through a
//! real `SessionStore` (rename/delete/move persisted and reloaded from
//! disk), complementing the pure in-memory `GroupTree` unit tests in
//! `session::group::tests`.

use agent_deck::session::{flatten_tree, GroupTree, Instance, Item, MoveDirection, SessionStore};
use anyhow::Result;
use serial_test::serial;
use tempfile::TempDir;

fn setup_temp_home() -> TempDir {
    let temp = TempDir::new().unwrap();
    std::env::set_var("HOME", temp.path());
    #[cfg(target_os = "linux")]
    std::env::set_var("XDG_CONFIG_HOME", temp.path().join(".config"));
    temp
}

#[test]
#[serial]
fn created_group_survives_a_save_and_reload_cycle() -> Result<()> {
    let _temp = setup_temp_home();
    let store = SessionStore::open_profile("default")?;

    let mut instance = Instance::new("Grouped Session", "/path/grouped");
    instance.group_path = "work".to_string();

    let mut tree = GroupTree::new_with_groups(&[instance.clone()], &[]);
    tree.create_group("work");
    store.save(&[instance], tree.groups())?;

    let (loaded, loaded_groups) = store.load()?;
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].group_path, "work");
    let reloaded_tree = GroupTree::new_with_groups(&loaded, &loaded_groups);
    assert!(reloaded_tree.group_exists("work"));
    Ok(())
}

#[test]
#[serial]
fn rename_persists_and_moves_descendant_group_paths() -> Result<()> {
    let _temp = setup_temp_home();
    let store = SessionStore::open_profile("default")?;

    let mut tree = GroupTree::new_with_groups(&[], &[]);
    tree.create_group("work");
    tree.create_group("work/backend");
    store.save(&[], tree.groups())?;

    let (instances, groups) = store.load()?;
    let mut tree = GroupTree::new_with_groups(&instances, &groups);
    tree.rename_group("work", "ops");
    store.save(&instances, tree.groups())?;

    let (_instances, reloaded_groups) = store.load()?;
    let reloaded_tree = GroupTree::new_with_groups(&[], &reloaded_groups);
    assert!(reloaded_tree.group_exists("ops"));
    assert!(reloaded_tree.group_exists("ops/backend"));
    assert!(!reloaded_tree.group_exists("work"));
    Ok(())
}

#[test]
#[serial]
fn delete_reparents_sessions_into_default_group_on_disk() -> Result<()> {
    let _temp = setup_temp_home();
    let store = SessionStore::open_profile("default")?;

    let mut inst = Instance::new("Orphaned", "/path/o");
    inst.group_path = "work".to_string();
    let mut tree = GroupTree::new_with_groups(&[inst.clone()], &[]);
    tree.create_group("work");
    store.save(&[inst], tree.groups())?;

    let (mut instances, groups) = store.load()?;
    let mut tree = GroupTree::new_with_groups(&instances, &groups);
    assert!(tree.delete_group("work", &mut instances));
    store.save(&instances, tree.groups())?;

    let (reloaded, reloaded_groups) = store.load()?;
    assert_eq!(reloaded[0].effective_group_path(), "my-sessions");
    assert!(!GroupTree::new_with_groups(&[], &reloaded_groups).group_exists("work"));
    Ok(())
}

#[test]
#[serial]
fn move_up_swaps_persisted_sibling_order() -> Result<()> {
    let _temp = setup_temp_home();
    let store = SessionStore::open_profile("default")?;

    let mut tree = GroupTree::new_with_groups(&[], &[]);
    tree.create_group("alpha");
    tree.create_group("beta");
    // `beta` sorts after `alpha` alphabetically by default; bump alpha's
    // order above beta's first so there's an observable swap to undo.
    tree.move_group("beta", MoveDirection::Up);
    store.save(&[], tree.groups())?;

    let (_instances, groups) = store.load()?;
    let items = flatten_tree(&[], &groups);
    let paths: Vec<&str> = items
        .iter()
        .filter_map(|i| match i {
            Item::Group(g) => Some(g.path.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(paths[0], "beta");
    assert_eq!(paths[1], "alpha");
    Ok(())
}
