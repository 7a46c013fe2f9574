//! CLI surface. Thin: this binary is a supervision-engine front end, not
//! the product's TUI (out of scope). `resolve_session` is ported from the
//! teacher's `cli::resolve_session` almost unchanged — exact id, then
//! id-prefix, then exact title, then path match, in that priority order.

pub mod definition;
pub mod group;
pub mod mcp;
pub mod session;
pub mod status;

pub use definition::{Cli, Commands};

use anyhow::{bail, Result};

use crate::session::Instance;

/// Resolve a user-supplied `needle` (from the command line) to exactly
/// one instance: exact id match, else a unique id-prefix match, else an
/// exact title match, else an exact project-path match. Ambiguous or
/// absent matches are errors, never a silent "first match wins".
pub fn resolve_session<'a>(instances: &'a [Instance], needle: &str) -> Result<&'a Instance> {
    if let Some(exact) = instances.iter().find(|i| i.id == needle) {
        return Ok(exact);
    }

    let prefix_matches: Vec<&Instance> =
        instances.iter().filter(|i| i.id.starts_with(needle)).collect();
    if prefix_matches.len() == 1 {
        return Ok(prefix_matches[0]);
    }
    if prefix_matches.len() > 1 {
        bail!("ambiguous session id prefix '{needle}': matches {} sessions", prefix_matches.len());
    }

    if let Some(by_title) = instances.iter().find(|i| i.title == needle) {
        return Ok(by_title);
    }

    if let Some(by_path) = instances.iter().find(|i| i.project_path == needle) {
        return Ok(by_path);
    }

    bail!("no session found matching '{needle}'")
}

pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{truncated}…")
    }
}

pub fn truncate_id(id: &str, len: usize) -> &str {
    if id.len() <= len {
        id
    } else {
        &id[..len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(id: &str, title: &str, path: &str) -> Instance {
        let mut inst = Instance::new(title, path);
        inst.id = id.to_string();
        inst
    }

    #[test]
    fn exact_id_match_wins_over_everything_else() {
        let instances = vec![instance("abc123", "other", "/tmp/a"), instance("abc", "target", "/tmp/b")];
        let found = resolve_session(&instances, "abc").unwrap();
        assert_eq!(found.id, "abc");
    }

    #[test]
    fn unique_id_prefix_resolves() {
        let instances = vec![instance("abcdef01", "demo", "/tmp/a")];
        let found = resolve_session(&instances, "abcd").unwrap();
        assert_eq!(found.id, "abcdef01");
    }

    #[test]
    fn ambiguous_id_prefix_is_an_error() {
        let instances = vec![
            instance("abc111", "a", "/tmp/a"),
            instance("abc222", "b", "/tmp/b"),
        ];
        assert!(resolve_session(&instances, "abc").is_err());
    }

    #[test]
    fn falls_back_to_title_then_path() {
        let instances = vec![instance("zzz", "my-title", "/tmp/proj")];
        assert_eq!(resolve_session(&instances, "my-title").unwrap().id, "zzz");
        assert_eq!(resolve_session(&instances, "/tmp/proj").unwrap().id, "zzz");
    }

    #[test]
    fn no_match_is_an_error() {
        let instances = vec![instance("zzz", "my-title", "/tmp/proj")];
        assert!(resolve_session(&instances, "nope").is_err());
    }

    #[test]
    fn truncate_appends_ellipsis_only_when_shortened() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is long", 6), "this …");
    }
}
