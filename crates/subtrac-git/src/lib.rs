//! # subtrac-git
//!
//! Git operations abstraction layer for git-subtrac, built on git2-rs.
//! Provides revision resolution, owned commit/tree snapshots, deterministic
//! object writes, ref updates, and local object transfer between
//! repositories.

mod error;
mod fetch;
mod repository;

pub use error::{Error, Result};
pub use git2::{Oid, Time};
pub use repository::{
    parse_oid, CommitData, EntryKind, Repository, SubmoduleStatus, TreeEntry,
};
