//! # subtrac-core
//!
//! Synthetic tracking-commit construction for repositories that reference
//! commits in other repositories through gitlink tree entries.
//!
//! The [`Cache`] walks a host repository's history, discovers every sub-ref
//! it has ever carried, and writes a parallel graph of empty-tree
//! "tracking" commits whose parent edges cite those sub-ref commits. A ref
//! pointing at such a tracking commit keeps the whole referenced history
//! transferable alongside the host's own.

mod cache;
mod error;
mod excludes;
mod refs;
mod subrepos;
mod trac;

pub use cache::{Cache, CacheOptions};
pub use error::{Error, Result};
pub use excludes::{ExclusionSet, EXCLUDES_FILE};
pub use refs::{is_tracking_branch, tracking_ref_name, TRACKING_SUFFIX};
pub use trac::Trac;
