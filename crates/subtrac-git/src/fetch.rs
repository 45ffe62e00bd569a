//! Local object transfer between repositories.
//!
//! git's local transport can only negotiate over refs, so transferring a
//! bare commit hash means pinning it with a temporary ref in the source
//! repository for the duration of the fetch.

use git2::Oid;

use crate::error::{Error, Result};
use crate::repository::Repository;

/// Scratch ref that anchors fetched objects in the host while a transfer is
/// in flight; removed once the transfer completes.
const FETCH_DEST_REF: &str = "refs/subtrac/fetch-head";

/// A temporary ref pinning a commit in a source repository.
///
/// Deleted on drop, so the pin is released on every exit path.
struct TempRef<'a> {
    repo: &'a Repository,
    name: String,
}

impl<'a> TempRef<'a> {
    fn create(repo: &'a Repository, name: String, target: Oid) -> Result<Self> {
        repo.set_ref(&name, target)?;
        Ok(Self { repo, name })
    }
}

impl Drop for TempRef<'_> {
    fn drop(&mut self) {
        // Removal is best-effort; the name is per-hash and force-updated,
        // so a leftover cannot poison a retry.
        let _ = self.repo.delete_ref(&self.name);
    }
}

impl Repository {
    /// Transfer `target` and all objects reachable from it out of `src`
    /// into this repository, via an anonymous local remote.
    ///
    /// # Errors
    /// Returns error if the pin ref cannot be created or the fetch fails.
    pub fn fetch_local(&self, src: &Repository, target: Oid) -> Result<()> {
        let pin = TempRef::create(src, format!("refs/heads/subtrac-tmp-{target}"), target)?;

        let url = src
            .git_dir()
            .to_str()
            .ok_or_else(|| Error::InvalidPath(src.git_dir().to_path_buf()))?;
        let mut remote = self.inner().remote_anonymous(url)?;
        let refspec = format!("+{}:{}", pin.name, FETCH_DEST_REF);
        remote.fetch(&[refspec.as_str()], None, None)?;
        drop(pin);

        self.delete_ref(FETCH_DEST_REF)?;
        Ok(())
    }
}
