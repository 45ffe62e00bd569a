//! Error types for subtrac-git.

use std::path::PathBuf;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during git operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Not inside a git repository.
    #[error("not a git repository: {0}")]
    NotARepository(PathBuf),

    /// A revision spec could not be resolved to a commit.
    #[error("cannot resolve '{0}'")]
    ResolveFailed(String),

    /// A repository path that cannot be handed to the transport layer.
    #[error("repository path is not valid unicode: {0}")]
    InvalidPath(PathBuf),

    /// Underlying git2 error.
    #[error("git error: {0}")]
    Git2(#[from] git2::Error),
}
