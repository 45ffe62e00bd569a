//! Repository wrapper providing the object-store operations subtrac needs.

use std::path::Path;

use git2::{BranchType, ObjectType, Oid, Signature, Time};

use crate::error::{Error, Result};

/// Parse a hex object id.
///
/// # Errors
/// Returns error if the string is not valid hex of object-id width.
pub fn parse_oid(s: &str) -> Result<Oid> {
    Ok(Oid::from_str(s)?)
}

/// Owned snapshot of a commit's graph-relevant fields.
///
/// git2 objects borrow the repository they came from; the traversal needs to
/// hold commit data across further repository calls, so reads return this
/// owned record instead.
#[derive(Debug, Clone)]
pub struct CommitData {
    /// The commit's own hash.
    pub id: Oid,
    /// Hash of the root tree.
    pub tree_id: Oid,
    /// Parent hashes, in commit order.
    pub parent_ids: Vec<Oid>,
    /// Committer timestamp (with offset).
    pub committer_when: Time,
}

/// What a tree entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Blob (or symlink) content.
    File,
    /// A nested tree.
    Dir,
    /// A gitlink: a commit in another repository.
    SubRef,
}

/// Owned snapshot of one tree entry.
#[derive(Debug, Clone)]
pub struct TreeEntry {
    /// Entry name within the tree.
    pub name: String,
    /// Hash of the referenced object.
    pub id: Oid,
    /// Entry kind.
    pub kind: EntryKind,
}

/// One configured submodule of a repository.
#[derive(Debug)]
pub struct SubmoduleStatus {
    /// The submodule's configured name.
    pub name: String,
    /// The opened sub-repository, or `None` when not initialized.
    pub repo: Option<Repository>,
}

/// High-level wrapper around a git repository.
pub struct Repository {
    inner: git2::Repository,
}

impl Repository {
    /// Open the repository containing the given path.
    ///
    /// # Errors
    /// Returns error if no repository is found at the path or any parent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let inner = git2::Repository::discover(path.as_ref())
            .map_err(|_| Error::NotARepository(path.as_ref().to_path_buf()))?;
        Ok(Self { inner })
    }

    /// Get the path to the repository root (workdir).
    #[must_use]
    pub fn workdir(&self) -> Option<&Path> {
        self.inner.workdir()
    }

    /// Get the path to the .git directory.
    #[must_use]
    pub fn git_dir(&self) -> &Path {
        self.inner.path()
    }

    // === Revision resolution ===

    /// Resolve a revision spec (branch, tag, raw hash, `~N`/`^N` forms) to
    /// the commit it names.
    ///
    /// # Errors
    /// Returns [`Error::ResolveFailed`] if the spec does not name a commit.
    pub fn resolve(&self, spec: &str) -> Result<Oid> {
        let object = self
            .inner
            .revparse_single(spec)
            .map_err(|_| Error::ResolveFailed(spec.to_string()))?;
        let commit = object
            .peel_to_commit()
            .map_err(|_| Error::ResolveFailed(spec.to_string()))?;
        Ok(commit.id())
    }

    // === Object reads ===

    /// Load a commit by hash.
    ///
    /// # Errors
    /// Returns error if the object is absent or not a commit.
    pub fn commit(&self, id: Oid) -> Result<CommitData> {
        let commit = self.inner.find_commit(id)?;
        let committer_when = commit.committer().when();
        Ok(CommitData {
            id: commit.id(),
            tree_id: commit.tree_id(),
            parent_ids: commit.parent_ids().collect(),
            committer_when,
        })
    }

    /// Check whether a commit with this hash exists here.
    #[must_use]
    pub fn has_commit(&self, id: Oid) -> bool {
        self.inner.find_commit(id).is_ok()
    }

    /// Load a tree's entries, in stored order.
    ///
    /// # Errors
    /// Returns error if the object is absent or not a tree.
    pub fn tree_entries(&self, id: Oid) -> Result<Vec<TreeEntry>> {
        let tree = self.inner.find_tree(id)?;
        let entries = tree
            .iter()
            .map(|entry| {
                let kind = match entry.kind() {
                    Some(ObjectType::Commit) => EntryKind::SubRef,
                    Some(ObjectType::Tree) => EntryKind::Dir,
                    _ => EntryKind::File,
                };
                TreeEntry {
                    name: String::from_utf8_lossy(entry.name_bytes()).into_owned(),
                    id: entry.id(),
                    kind,
                }
            })
            .collect();
        Ok(entries)
    }

    // === Object writes ===

    /// Write the canonical empty tree, returning its hash.
    ///
    /// Content addressing dedups repeated writes.
    ///
    /// # Errors
    /// Returns error on a store write failure.
    pub fn write_empty_tree(&self) -> Result<Oid> {
        Ok(self.inner.treebuilder(None)?.write()?)
    }

    /// Write a commit object without moving any ref.
    ///
    /// The same inputs always produce the same bytes, hence the same hash.
    ///
    /// # Errors
    /// Returns error if a parent is absent or the write fails.
    pub fn write_commit(
        &self,
        name: &str,
        email: &str,
        when: Time,
        message: &str,
        tree: Oid,
        parents: &[Oid],
    ) -> Result<Oid> {
        let sig = Signature::new(name, email, &when)?;
        let tree = self.inner.find_tree(tree)?;
        let parent_commits = parents
            .iter()
            .map(|&id| self.inner.find_commit(id))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let parent_refs: Vec<&git2::Commit<'_>> = parent_commits.iter().collect();
        Ok(self
            .inner
            .commit(None, &sig, &sig, message, &tree, &parent_refs)?)
    }

    // === Refs and branches ===

    /// Create or force-update a ref.
    ///
    /// # Errors
    /// Returns error if the ref name is invalid or the write fails.
    pub fn set_ref(&self, name: &str, target: Oid) -> Result<()> {
        self.inner
            .reference(name, target, true, "subtrac: update")?;
        Ok(())
    }

    /// Delete a ref.
    ///
    /// # Errors
    /// Returns error if the ref does not exist or cannot be removed.
    pub fn delete_ref(&self, name: &str) -> Result<()> {
        self.inner.find_reference(name)?.delete()?;
        Ok(())
    }

    /// List all local branches with their tip hashes.
    ///
    /// # Errors
    /// Returns error if branch enumeration fails.
    pub fn local_branches(&self) -> Result<Vec<(String, Oid)>> {
        let mut out = Vec::new();
        for entry in self.inner.branches(Some(BranchType::Local))? {
            let (branch, _) = entry?;
            let Some(name) = branch.name()?.map(String::from) else {
                continue;
            };
            let Some(target) = branch.get().target() else {
                continue;
            };
            out.push((name, target));
        }
        Ok(out)
    }

    // === Submodules ===

    /// List this repository's configured submodules, opening each one that
    /// is initialized.
    ///
    /// A submodule whose working copy is missing or has no checked-out
    /// commit is reported with `repo: None`.
    ///
    /// # Errors
    /// Returns error if the submodule configuration cannot be read.
    pub fn submodules(&self) -> Result<Vec<SubmoduleStatus>> {
        let mut out = Vec::new();
        for sub in self.inner.submodules()? {
            let name = String::from_utf8_lossy(sub.name_bytes()).into_owned();
            let repo = sub
                .open()
                .ok()
                .filter(|r| r.head().is_ok())
                .map(|inner| Self { inner });
            out.push(SubmoduleStatus { name, repo });
        }
        Ok(out)
    }

    // === Low-level access ===

    /// Get a reference to the underlying git2 repository.
    ///
    /// Use sparingly - prefer high-level methods.
    #[must_use]
    pub fn inner(&self) -> &git2::Repository {
        &self.inner
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("path", &self.git_dir())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// The well-known hash of the empty tree.
    const EMPTY_TREE: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

    fn init_test_repo() -> (TempDir, Repository) {
        let temp = TempDir::new().unwrap();
        let repo = git2::Repository::init(temp.path()).unwrap();

        // Create initial commit (scoped to drop borrows before moving repo)
        {
            let sig = git2::Signature::new("Test User", "test@example.com", &Time::new(1700000000, 0))
                .unwrap();
            let tree_id = repo.index().unwrap().write_tree().unwrap();
            let tree = repo.find_tree(tree_id).unwrap();
            repo.commit(Some("HEAD"), &sig, &sig, "Initial commit", &tree, &[])
                .unwrap();
        }

        let wrapped = Repository { inner: repo };
        (temp, wrapped)
    }

    fn head_commit(repo: &Repository) -> Oid {
        repo.inner().head().unwrap().target().unwrap()
    }

    #[test]
    fn test_resolve_forms() {
        let (_temp, repo) = init_test_repo();
        let head = head_commit(&repo);

        let branch = repo.inner().head().unwrap().shorthand().unwrap().to_string();
        assert_eq!(repo.resolve(&branch).unwrap(), head);
        assert_eq!(repo.resolve(&head.to_string()).unwrap(), head);
        assert_eq!(repo.resolve("HEAD").unwrap(), head);
        assert!(repo.resolve("no-such-ref").is_err());
        assert!(repo.resolve(&format!("{branch}~1")).is_err());
    }

    #[test]
    fn test_commit_snapshot() {
        let (_temp, repo) = init_test_repo();
        let head = head_commit(&repo);

        let data = repo.commit(head).unwrap();
        assert_eq!(data.id, head);
        assert!(data.parent_ids.is_empty());
        assert_eq!(data.tree_id.to_string(), EMPTY_TREE);
        assert_eq!(data.committer_when.seconds(), 1700000000);
    }

    #[test]
    fn test_tree_entries_kinds_and_order() {
        let (_temp, repo) = init_test_repo();
        let head = head_commit(&repo);
        let blob = repo.inner().blob(b"contents").unwrap();
        let subtree = {
            let mut tb = repo.inner().treebuilder(None).unwrap();
            tb.insert("inner.txt", blob, 0o100644).unwrap();
            tb.write().unwrap()
        };

        let mut tb = repo.inner().treebuilder(None).unwrap();
        tb.insert("a.txt", blob, 0o100644).unwrap();
        tb.insert("lib", head, 0o160000).unwrap();
        tb.insert("src", subtree, 0o040000).unwrap();
        let tree = tb.write().unwrap();

        let entries = repo.tree_entries(tree).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a.txt", "lib", "src"]);
        assert_eq!(entries[0].kind, EntryKind::File);
        assert_eq!(entries[1].kind, EntryKind::SubRef);
        assert_eq!(entries[1].id, head);
        assert_eq!(entries[2].kind, EntryKind::Dir);
    }

    #[test]
    fn test_write_empty_tree() {
        let (_temp, repo) = init_test_repo();
        assert_eq!(repo.write_empty_tree().unwrap().to_string(), EMPTY_TREE);
    }

    #[test]
    fn test_write_commit_is_deterministic() {
        let (_temp, repo) = init_test_repo();
        let head = head_commit(&repo);
        let tree = repo.write_empty_tree().unwrap();
        let when = Time::new(1700000123, 60);

        let a = repo
            .write_commit("git-subtrac", "git-subtrac@", when, "msg", tree, &[head])
            .unwrap();
        let b = repo
            .write_commit("git-subtrac", "git-subtrac@", when, "msg", tree, &[head])
            .unwrap();
        assert_eq!(a, b);

        let c = repo
            .write_commit("git-subtrac", "git-subtrac@", when, "other", tree, &[head])
            .unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_write_commit_missing_parent() {
        let (_temp, repo) = init_test_repo();
        let tree = repo.write_empty_tree().unwrap();
        let absent = Oid::from_str("1111111111111111111111111111111111111111").unwrap();
        let when = Time::new(1700000123, 0);

        assert!(repo
            .write_commit("git-subtrac", "git-subtrac@", when, "msg", tree, &[absent])
            .is_err());
    }

    #[test]
    fn test_set_and_delete_ref() {
        let (_temp, repo) = init_test_repo();
        let head = head_commit(&repo);

        repo.set_ref("refs/heads/extra", head).unwrap();
        assert_eq!(repo.resolve("extra").unwrap(), head);
        // Force-update is idempotent.
        repo.set_ref("refs/heads/extra", head).unwrap();

        repo.delete_ref("refs/heads/extra").unwrap();
        assert!(repo.resolve("extra").is_err());
        assert!(repo.delete_ref("refs/heads/extra").is_err());
    }

    #[test]
    fn test_local_branches() {
        let (_temp, repo) = init_test_repo();
        let head = head_commit(&repo);
        repo.set_ref("refs/heads/feature", head).unwrap();

        let branches = repo.local_branches().unwrap();
        assert!(branches.len() >= 2);
        assert!(branches.iter().any(|(n, id)| n == "feature" && *id == head));
    }

    #[test]
    fn test_submodules_empty() {
        let (_temp, repo) = init_test_repo();
        assert!(repo.submodules().unwrap().is_empty());
    }

    #[test]
    fn test_has_commit() {
        let (_temp, repo) = init_test_repo();
        let head = head_commit(&repo);
        let absent = Oid::from_str("2222222222222222222222222222222222222222").unwrap();

        assert!(repo.has_commit(head));
        assert!(!repo.has_commit(absent));
    }
}
