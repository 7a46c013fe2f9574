//! Typed errors for the session module.
//!
//! Most of this crate propagates `anyhow::Result` at operation boundaries
//! (matching the teacher), but the lifecycle manager and CLI need to match
//! on *kind* without string-parsing in a few places (e.g. "is this a
//! not-found error, or did the store fail to write?"). Grounded on the
//! teacher's `git::error` module, which wraps `git2::Error` the same way.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(String),

    #[error("group not found: {0}")]
    GroupNotFound(String),

    #[error("cannot delete the default group")]
    CannotDeleteDefaultGroup,

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("session is not forkable: {0}")]
    NotForkable(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;
