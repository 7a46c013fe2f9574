//! Git worktree repo-root resolution (§4.3, informational only — no
//! worktree creation/mutation lives in this crate). Grounded on the
//! teacher's `git::error` wrapping of `git2::Error`; generalized from the
//! teacher's diff-viewer usage of `git2::Repository` to a read-only
//! "what repo does this worktree belong to" lookup.

use std::path::Path;

use super::instance::WorktreeInfo;

/// If `path` sits inside a git worktree (linked or the main one), resolve
/// the fields `GroupTree::default_path_for_group` needs to prefer the
/// repo's main working directory over a throwaway worktree checkout.
/// Returns `None` for a plain directory, a bare repo, or any path git2
/// can't open — resolution failures are not propagated as errors since
/// this is a best-effort convenience, not a correctness-critical path.
pub fn resolve_worktree_info(path: &str, branch: Option<&str>) -> Option<WorktreeInfo> {
    let repo = git2::Repository::discover(path).ok()?;
    if !repo.is_worktree() {
        return None;
    }

    let common_dir = repo.commondir().to_path_buf();
    let repo_root = common_dir
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or(common_dir);

    let branch_name = branch
        .map(str::to_string)
        .or_else(|| current_branch_name(&repo));

    Some(WorktreeInfo {
        worktree_path: path.to_string(),
        worktree_repo_root: repo_root.to_string_lossy().into_owned(),
        worktree_branch: branch_name.unwrap_or_default(),
    })
}

fn current_branch_name(repo: &git2::Repository) -> Option<String> {
    let head = repo.head().ok()?;
    head.shorthand().map(str::to_string)
}

/// Purely path-based fallback for tests and for hosts without a `.git`
/// fixture handy: treat `.worktrees/<name>` path segments as the marker.
pub fn looks_like_worktree_path(path: &str) -> bool {
    Path::new(path)
        .components()
        .any(|c| c.as_os_str() == ".worktrees")
}
