//! Hierarchical group tree (C3) — grouping, flattening, sorting, and the
//! cross-tool session-id dedup pass.
//!
//! Not retrieved from the teacher's pack (its `groups` module is declared
//! in `session/mod.rs` but the file itself was filtered out of the
//! retrieval); built fresh from spec.md §4.3's invariants, in the
//! teacher's general style (plain structs, `Vec`-backed, owned flatten
//! output per DESIGN NOTES §9's "generator-style iteration" guidance).

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::instance::{Instance, DEFAULT_GROUP};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub path: String,
    #[serde(default = "default_expanded")]
    pub expanded: bool,
    #[serde(default)]
    pub order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_path: Option<String>,
}

fn default_expanded() -> bool {
    true
}

impl Group {
    pub fn new(path: &str) -> Self {
        Self {
            name: display_name(path),
            path: path.to_string(),
            expanded: true,
            order: 0,
            default_path: None,
        }
    }

    fn default_group() -> Self {
        let mut g = Self::new(DEFAULT_GROUP);
        g.name = "My Sessions".to_string();
        g
    }
}

fn display_name(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

/// Sanitize a single group name segment per spec.md invariant 4:
/// `[A-Za-z0-9 _-]` only, whitespace collapsed, no leading/trailing space.
pub fn sanitize_group_name(raw: &str) -> String {
    let filtered: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ' || *c == '_' || *c == '-')
        .collect();
    let collapsed = filtered.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.trim().to_string()
}

/// Build a sanitized `/`-separated path from segments, rejecting `.`/`..`.
pub fn build_group_path(segments: &[&str]) -> String {
    segments
        .iter()
        .map(|s| sanitize_group_name(s))
        .filter(|s| !s.is_empty() && s != "." && s != "..")
        .collect::<Vec<_>>()
        .join("/")
}

fn parent_path(path: &str) -> Option<&str> {
    path.rfind('/').map(|i| &path[..i])
}

fn sort_key(g: &Group) -> (i64, String) {
    (g.order, g.name.to_lowercase())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupItem {
    pub path: String,
    pub name: String,
    pub depth: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionItem {
    pub instance_id: String,
    pub depth: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Group(GroupItem),
    Session(SessionItem),
}

/// Flatten the group/session tree into an ordered display list.
///
/// Ancestors always precede descendants; unrelated subtrees never
/// interleave because children are only emitted while recursing directly
/// under their parent's entry, never by comparing full path strings
/// (spec.md §8 "Group sorting transitivity").
pub fn flatten_tree(instances: &[Instance], groups: &[Group]) -> Vec<Item> {
    let mut all_groups: Vec<Group> = groups.to_vec();
    if !all_groups.iter().any(|g| g.path == DEFAULT_GROUP) {
        all_groups.push(Group::default_group());
    }

    let mut out = Vec::new();
    flatten_level(&all_groups, instances, None, 0, &mut out);
    out
}

fn children_groups<'a>(groups: &'a [Group], parent: Option<&str>) -> Vec<&'a Group> {
    let mut v: Vec<&Group> = groups
        .iter()
        .filter(|g| parent_path(&g.path) == parent)
        .collect();
    v.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
    v
}

fn flatten_level(
    groups: &[Group],
    instances: &[Instance],
    parent: Option<&str>,
    depth: usize,
    out: &mut Vec<Item>,
) {
    for g in children_groups(groups, parent) {
        out.push(Item::Group(GroupItem {
            path: g.path.clone(),
            name: g.name.clone(),
            depth,
        }));

        if !g.expanded {
            continue;
        }

        let mut roots: Vec<&Instance> = instances
            .iter()
            .filter(|i| !i.is_sub_session() && i.effective_group_path() == g.path)
            .collect();
        roots.sort_by(|a, b| a.title.cmp(&b.title));

        for root in roots {
            out.push(Item::Session(SessionItem {
                instance_id: root.id.clone(),
                depth: depth + 1,
            }));

            let mut subs: Vec<&Instance> = instances
                .iter()
                .filter(|c| {
                    c.parent_id.as_deref() == Some(root.id.as_str())
                        && c.effective_group_path() == g.path
                })
                .collect();
            subs.sort_by(|a, b| a.title.cmp(&b.title));
            for sub in subs {
                out.push(Item::Session(SessionItem {
                    instance_id: sub.id.clone(),
                    depth: depth + 2,
                }));
            }
        }

        // Orphaned sub-sessions: parent dangling or parent lives in a
        // different group. They render at root level within *this* group.
        let mut orphans: Vec<&Instance> = instances
            .iter()
            .filter(|i| i.is_sub_session() && i.effective_group_path() == g.path)
            .filter(|i| {
                let parent = instances
                    .iter()
                    .find(|p| Some(p.id.as_str()) == i.parent_id.as_deref());
                match parent {
                    None => true,
                    Some(p) => p.effective_group_path() != g.path,
                }
            })
            .collect();
        orphans.sort_by(|a, b| a.title.cmp(&b.title));
        for orphan in orphans {
            out.push(Item::Session(SessionItem {
                instance_id: orphan.id.clone(),
                depth: depth + 1,
            }));
        }

        flatten_level(groups, instances, Some(&g.path), depth + 1, out);
    }
}

/// Owns the group set and provides the mutating tree operations (§4.3).
pub struct GroupTree {
    groups: Vec<Group>,
}

impl GroupTree {
    pub fn new_with_groups(_instances: &[Instance], groups: &[Group]) -> Self {
        Self {
            groups: groups.to_vec(),
        }
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group_exists(&self, path: &str) -> bool {
        path == DEFAULT_GROUP || self.groups.iter().any(|g| g.path == path)
    }

    /// Create a group, auto-creating any missing ancestor paths (spec.md
    /// §3 "Groups are created ... ancestor paths are auto-created").
    pub fn create_group(&mut self, path: &str) {
        if path.is_empty() || path == DEFAULT_GROUP {
            return;
        }
        let segments: Vec<&str> = path.split('/').collect();
        let mut built = String::new();
        for seg in segments {
            if !built.is_empty() {
                built.push('/');
            }
            built.push_str(seg);
            if !self.group_exists(&built) {
                self.groups.push(Group::new(&built));
            }
        }
    }

    /// Rename a group, operating on the last path segment only; the
    /// parent prefix (and therefore the group's position) is preserved.
    pub fn rename_group(&mut self, path: &str, new_last_segment: &str) -> Option<String> {
        let sanitized = sanitize_group_name(new_last_segment);
        if sanitized.is_empty() {
            return None;
        }
        let new_path = match parent_path(path) {
            Some(parent) => format!("{parent}/{sanitized}"),
            None => sanitized.clone(),
        };

        let prefix = format!("{path}/");
        for g in self.groups.iter_mut() {
            if g.path == path {
                g.path = new_path.clone();
                g.name = sanitized.clone();
            } else if let Some(rest) = g.path.strip_prefix(&prefix) {
                g.path = format!("{new_path}/{rest}");
            }
        }
        Some(new_path)
    }

    /// Delete a group, reparenting its entire subtree (descendant groups
    /// and sessions) into the default group (spec.md invariant 5). The
    /// default group itself cannot be deleted.
    pub fn delete_group(&mut self, path: &str, instances: &mut [Instance]) -> bool {
        if path == DEFAULT_GROUP {
            return false;
        }
        let prefix = format!("{path}/");
        self.groups
            .retain(|g| g.path != path && !g.path.starts_with(&prefix));

        for inst in instances.iter_mut() {
            if inst.group_path == path || inst.group_path.starts_with(&prefix) {
                inst.group_path = DEFAULT_GROUP.to_string();
            }
        }
        true
    }

    /// Swap a group with the previous/next sibling under the same parent.
    /// Never crosses levels — siblings are found by comparing `parent_path`,
    /// not by adjacency in a flattened list.
    pub fn move_group(&mut self, path: &str, direction: MoveDirection) -> bool {
        let parent = parent_path(path).map(|s| s.to_string());
        let mut siblings: Vec<usize> = self
            .groups
            .iter()
            .enumerate()
            .filter(|(_, g)| parent_path(&g.path) == parent.as_deref())
            .map(|(i, _)| i)
            .collect();
        siblings.sort_by(|&a, &b| sort_key(&self.groups[a]).cmp(&sort_key(&self.groups[b])));

        let pos = match siblings.iter().position(|&i| self.groups[i].path == path) {
            Some(p) => p,
            None => return false,
        };
        let swap_with = match direction {
            MoveDirection::Up if pos > 0 => pos - 1,
            MoveDirection::Down if pos + 1 < siblings.len() => pos + 1,
            _ => return false,
        };

        let (a, b) = (siblings[pos], siblings[swap_with]);
        let tmp = self.groups[a].order;
        self.groups[a].order = self.groups[b].order;
        self.groups[b].order = tmp;
        true
    }

    /// Resolve the suggested project path for new sessions in a group:
    /// an explicit `default_path` wins; otherwise the most-recently
    /// created session's `project_path` in the group; worktree sessions
    /// resolve to their repo root rather than the worktree directory.
    pub fn default_path_for_group(&self, path: &str, instances: &[Instance]) -> Option<String> {
        if let Some(g) = self.groups.iter().find(|g| g.path == path) {
            if let Some(dp) = &g.default_path {
                return Some(dp.clone());
            }
        }

        instances
            .iter()
            .filter(|i| i.effective_group_path() == path)
            .max_by_key(|i| i.created_at)
            .map(|i| match &i.worktree {
                Some(wt) => wt.worktree_repo_root.clone(),
                None => i.project_path.clone(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// Deduplicate per-tool session ids across instances (spec.md §4.3):
/// within each duplicate set for a given tool, the instance with the
/// smallest `created_at` keeps the id; it is cleared on every other
/// instance. Applying this twice is a no-op the second time (idempotent),
/// since after the first pass no tool/session-id pair is held by more
/// than one instance.
pub fn dedup_tool_sessions(instances: &mut [Instance]) {
    let mut by_key: HashMap<(String, String), Vec<usize>> = HashMap::new();
    for (idx, inst) in instances.iter().enumerate() {
        for (tool, rec) in &inst.tool_sessions {
            by_key
                .entry((tool.clone(), rec.session_id.clone()))
                .or_default()
                .push(idx);
        }
    }

    for ((tool, _session_id), idxs) in by_key {
        if idxs.len() <= 1 {
            continue;
        }
        let winner = *idxs
            .iter()
            .min_by_key(|&&i| instances[i].created_at)
            .unwrap();
        for i in idxs {
            if i != winner {
                instances[i].clear_tool_session(&tool);
            }
        }
    }
}
