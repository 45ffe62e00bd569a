//! Tracking-ref naming and the branch updater.

use subtrac_git::Oid;
use tracing::{info, warn};

use crate::cache::Cache;
use crate::error::Result;
use crate::trac::short;

/// Suffix that marks a branch (or names a tracking ref) as tracking.
pub const TRACKING_SUFFIX: &str = ".trac";

/// True if `branch` is itself a tracking branch.
#[must_use]
pub fn is_tracking_branch(branch: &str) -> bool {
    branch.ends_with(TRACKING_SUFFIX)
}

/// Full ref name of the tracking ref for `branch`.
#[must_use]
pub fn tracking_ref_name(branch: &str) -> String {
    format!("refs/heads/{branch}{TRACKING_SUFFIX}")
}

impl Cache {
    /// Build the synthetic graph for every local branch, then point each
    /// branch's tracking ref at its synthetic tip. Branches that are
    /// themselves tracking branches are skipped, as are branches whose
    /// history carries no sub-refs.
    ///
    /// All synthesis happens before any ref is written, so a failure
    /// mid-build leaves the existing tracking refs untouched; the writes
    /// themselves are idempotent.
    ///
    /// Returns the number of tracking refs written.
    ///
    /// # Errors
    /// Returns error if branch enumeration, any build, or a ref write
    /// fails.
    pub fn update_branch_refs(&mut self) -> Result<usize> {
        let mut updates: Vec<(String, Oid)> = Vec::new();
        for (branch, _) in self.repo().local_branches()? {
            if is_tracking_branch(&branch) {
                continue;
            }
            info!("Scanning branch: {branch}");
            match self.trac_by_ref(&branch)? {
                Some(id) => updates.push((branch, id)),
                None => warn!("no sub-ref commits found for {branch}; skipping"),
            }
        }

        for (branch, id) in &updates {
            let refname = tracking_ref_name(branch);
            info!("Updating {} -> {}", short(*id), refname);
            self.repo().set_ref(&refname, *id)?;
        }
        Ok(updates.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheOptions;
    use subtrac_git::{Repository, Time};
    use tempfile::TempDir;

    fn init_test_repo() -> (TempDir, Repository) {
        let temp = TempDir::new().unwrap();
        git2::Repository::init(temp.path()).unwrap();
        let repo = Repository::open(temp.path()).unwrap();
        (temp, repo)
    }

    fn commit(repo: &Repository, tree: Oid, parents: &[Oid], msg: &str) -> Oid {
        repo.write_commit(
            "Test User",
            "test@example.com",
            Time::new(1700000000, 0),
            msg,
            tree,
            parents,
        )
        .unwrap()
    }

    fn repo_with_subref_branch(name: &str) -> (TempDir, Repository, Oid) {
        let (temp, repo) = init_test_repo();
        let empty = repo.write_empty_tree().unwrap();
        let sub = commit(&repo, empty, &[], "sub history");
        let mut tb = repo.inner().treebuilder(None).unwrap();
        tb.insert("lib", sub, 0o160000).unwrap();
        let tree = tb.write().unwrap();
        drop(tb);
        let tip = commit(&repo, tree, &[], "host tip");
        repo.set_ref(&format!("refs/heads/{name}"), tip).unwrap();
        (temp, repo, sub)
    }

    #[test]
    fn test_naming() {
        assert_eq!(tracking_ref_name("main"), "refs/heads/main.trac");
        assert!(is_tracking_branch("main.trac"));
        assert!(!is_tracking_branch("main"));
        assert!(!is_tracking_branch("trac"));
    }

    #[test]
    fn test_update_writes_tracking_ref() {
        let (_temp, repo, sub) = repo_with_subref_branch("main");
        let mut cache = Cache::new(repo, CacheOptions::default()).unwrap();

        assert_eq!(cache.update_branch_refs().unwrap(), 1);
        let tc = cache.repo().resolve("main.trac").unwrap();
        assert_eq!(cache.repo().commit(tc).unwrap().parent_ids, vec![sub]);
    }

    #[test]
    fn test_update_skips_tracking_branches() {
        let (_temp, repo, _sub) = repo_with_subref_branch("main");
        let mut cache = Cache::new(repo, CacheOptions::default()).unwrap();
        cache.update_branch_refs().unwrap();

        // A second pass must not try to track main.trac itself.
        assert_eq!(cache.update_branch_refs().unwrap(), 1);
        assert!(cache.repo().resolve("main.trac.trac").is_err());
    }

    #[test]
    fn test_update_is_idempotent() {
        let (temp, repo, _sub) = repo_with_subref_branch("main");
        let mut cache = Cache::new(repo, CacheOptions::default()).unwrap();
        cache.update_branch_refs().unwrap();
        let first = cache.repo().resolve("main.trac").unwrap();

        // Fresh cache, same source: same ref value.
        let mut cache = Cache::new(Repository::open(temp.path()).unwrap(), CacheOptions::default())
            .unwrap();
        cache.update_branch_refs().unwrap();
        assert_eq!(cache.repo().resolve("main.trac").unwrap(), first);
    }

    #[test]
    fn test_update_skips_branch_without_subrefs() {
        let (_temp, repo) = init_test_repo();
        let empty = repo.write_empty_tree().unwrap();
        let tip = commit(&repo, empty, &[], "no subrefs");
        repo.set_ref("refs/heads/main", tip).unwrap();

        let mut cache = Cache::new(repo, CacheOptions::default()).unwrap();
        assert_eq!(cache.update_branch_refs().unwrap(), 0);
        assert!(cache.repo().resolve("main.trac").is_err());
    }
}
