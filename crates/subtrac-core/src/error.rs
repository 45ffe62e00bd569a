//! Error types for subtrac-core.

use std::path::PathBuf;

use subtrac_git::Oid;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building the synthetic tracking graph.
///
/// Variants carry the diagnostic path accumulated through the traversal, so
/// a failure deep in a nested sub-repository names the exact object that
/// caused it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A user-supplied ref could not be resolved to a commit.
    #[error("{refname}: {source}")]
    Resolve {
        refname: String,
        #[source]
        source: subtrac_git::Error,
    },

    /// An object the traversal needs is absent or unreadable.
    #[error("{path}: {source}")]
    Object {
        path: String,
        #[source]
        source: subtrac_git::Error,
    },

    /// A sub-ref commit absent from the host and from every initialized
    /// sub-repository.
    #[error("{path}: {hash} not found. (fetch it manually? or try --exclude or --auto-exclude)")]
    SubRefMissing { path: String, hash: Oid },

    /// Sub-repository discovery or transfer failure.
    #[error("submodule {path}: {source}")]
    SubRepo {
        path: String,
        #[source]
        source: subtrac_git::Error,
    },

    /// The exclusion file exists but could not be read.
    #[error("{path}: {source}")]
    ExcludesFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An exclusion entry that is not a valid object hash.
    #[error("invalid exclude hash '{text}': {source}")]
    BadExcludeHash {
        text: String,
        #[source]
        source: subtrac_git::Error,
    },

    /// Other git operation failure.
    #[error(transparent)]
    Git(#[from] subtrac_git::Error),
}
