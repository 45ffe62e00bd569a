//! The object cache and synthetic tracking-commit builder.
//!
//! Memoized recursion over the host's commit/tree graph. Every visited
//! object gets a [`Trac`] record; commits whose sub-ref coverage changes
//! relative to their lineage additionally get a synthetic tracking commit
//! whose parent edges cite the inherited synthetic lineage plus the newly
//! introduced sub-ref heads.
//!
//! git's content-addressable storage guarantees the graph is acyclic, so
//! memoization by object hash terminates even though the same sub-objects
//! occur many times at different points in the tree.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use subtrac_git::{CommitData, EntryKind, Oid, Repository};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::excludes::ExclusionSet;
use crate::subrepos::SubRepoDir;
use crate::trac::{short, Trac};

/// Identity stamped on every synthetic tracking commit. Fixed so that two
/// hosts holding the same source history write byte-identical commits.
const TRAC_NAME: &str = "git-subtrac";
const TRAC_EMAIL: &str = "git-subtrac@";

/// Options for building a [`Cache`].
#[derive(Debug, Clone, Default)]
pub struct CacheOptions {
    /// String-form hashes to exclude (`-x`).
    pub excludes: Vec<String>,
    /// Exclude sub-ref commits that cannot be found anywhere.
    pub auto_exclude: bool,
}

/// Memoized view of every visited host object, plus the machinery needed
/// to locate sub-ref commits missing from the host.
///
/// At most one [`Trac`] exists per source hash per invocation; records are
/// immutable once added.
pub struct Cache {
    repo: Repository,
    auto_exclude: bool,
    excludes: ExclusionSet,
    tracs: HashMap<Oid, Rc<Trac>>,
    subrepos: Option<SubRepoDir>,
}

impl Cache {
    /// Create a cache over `repo`, seeding exclusions from `opts` and from
    /// the `.trac-excludes` file at the worktree root, when present.
    ///
    /// # Errors
    /// Returns error on an unparsable exclusion hash or an unreadable
    /// exclusion file.
    pub fn new(repo: Repository, opts: CacheOptions) -> Result<Self> {
        let mut excludes = ExclusionSet::from_hashes(&opts.excludes)?;
        if let Some(worktree) = repo.workdir().map(std::path::Path::to_path_buf) {
            excludes.load_file(&worktree)?;
        }
        Ok(Self {
            repo,
            auto_exclude: opts.auto_exclude,
            excludes,
            tracs: HashMap::new(),
            subrepos: None,
        })
    }

    /// Access the host repository.
    #[must_use]
    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    /// Resolve `refname` and build its record, returning the hash of its
    /// synthetic tracking commit, or `None` when the ref's history carries
    /// no sub-ref commits.
    ///
    /// # Errors
    /// Returns error if the ref does not resolve to a commit or the build
    /// fails.
    pub fn trac_by_ref(&mut self, refname: &str) -> Result<Option<Oid>> {
        let id = self.repo.resolve(refname).map_err(|source| Error::Resolve {
            refname: refname.to_string(),
            source,
        })?;
        let commit = self.repo.commit(id).map_err(|source| Error::Resolve {
            refname: refname.to_string(),
            source,
        })?;
        let trac = self.trac_commit(refname.to_string(), &commit)?;
        Ok(trac.trac_commit)
    }

    /// Render every cached record sorted by name, one line each.
    #[must_use]
    pub fn dump(&self) -> String {
        let mut tracs: Vec<&Rc<Trac>> = self.tracs.values().collect();
        tracs.sort_by(|a, b| a.name.cmp(&b.name));
        let lines: Vec<String> = tracs.iter().map(|t| t.to_string()).collect();
        lines.join("\n")
    }

    /// Build the record for one commit, recursing through its tree and its
    /// parents first.
    fn trac_commit(&mut self, path: String, commit: &CommitData) -> Result<Rc<Trac>> {
        if let Some(cached) = self.tracs.get(&commit.id) {
            return Ok(Rc::clone(cached));
        }

        let tree_trac = self.trac_tree(format!("{path}/"), commit.tree_id)?;
        // The sub-heads owned by the root tree are the sub-heads of the
        // commit itself.
        let sub_heads = tree_trac.sub_heads.clone();

        let mut parents = Vec::with_capacity(commit.parent_ids.len());
        for (i, &parent_id) in commit.parent_ids.iter().enumerate() {
            let parent = self.repo.commit(parent_id).map_err(|source| Error::Object {
                path: format!("{}:{}", path, short(parent_id)),
                source,
            })?;
            let parent_path = commit_path(&path, i + 1);
            parents.push(self.trac_commit(parent_path, &parent)?);
        }

        // Work out what this commit adds relative to its lineage. A parent's
        // synthetic commit already covers that parent's sub-heads, so those
        // never need to be cited again.
        let mut seen_heads = HashSet::new();
        let mut seen_tracs = HashSet::new();
        let mut inherited = Vec::new();
        let mut new_heads = Vec::new();

        for parent in &parents {
            if let Some(tc) = parent.trac_commit {
                if seen_tracs.insert(tc) {
                    inherited.push(tc);
                }
            }
            for head in &parent.sub_heads {
                seen_heads.insert(head.hash);
            }
        }
        for head in &sub_heads {
            if seen_heads.insert(head.hash) {
                new_heads.push(head.hash);
                if let Some(tc) = head.trac_commit {
                    if seen_tracs.insert(tc) {
                        inherited.push(tc);
                    }
                }
            }
        }

        let trac_commit = if new_heads.is_empty() && inherited.len() <= 1 {
            // Nothing added since the parent; no new commit needed.
            inherited.first().copied()
        } else {
            Some(self.new_trac_commit(commit, &inherited, &new_heads)?)
        };

        let trac = Rc::new(Trac {
            name: path,
            hash: commit.id,
            parents,
            sub_heads,
            trac_commit,
        });
        self.add(&trac);
        Ok(trac)
    }

    /// Build the record for one tree, collecting sub-ref heads in entry
    /// order, depth-first.
    fn trac_tree(&mut self, path: String, tree_id: Oid) -> Result<Rc<Trac>> {
        if let Some(cached) = self.tracs.get(&tree_id) {
            return Ok(Rc::clone(cached));
        }

        let entries = self.repo.tree_entries(tree_id).map_err(|source| Error::Object {
            path: format!("{}:{}", path, short(tree_id)),
            source,
        })?;

        let mut sub_heads = Vec::new();
        for entry in entries {
            match entry.kind {
                EntryKind::File => {}
                EntryKind::Dir => {
                    let child = self.trac_tree(format!("{path}{}/", entry.name), entry.id)?;
                    // Collect sub-refs all the way down the tree.
                    sub_heads.extend(child.sub_heads.iter().cloned());
                }
                EntryKind::SubRef => {
                    if self.excludes.contains(entry.id) {
                        // Pretend it doesn't exist; don't link to it.
                        continue;
                    }
                    if let Some(cached) = self.tracs.get(&entry.id) {
                        sub_heads.push(Rc::clone(cached));
                        continue;
                    }
                    let subpath = format!("{path}{}@{}", entry.name, short(entry.id));
                    let commit = match self.repo.commit(entry.id) {
                        Ok(commit) => commit,
                        Err(_) => match self.resolve_missing(&subpath, entry.id)? {
                            Some(commit) => commit,
                            None => continue, // auto-excluded
                        },
                    };
                    // Exactly one head per sub-ref entry; whatever the
                    // sub-commit itself depends on is covered by its own
                    // synthetic lineage.
                    sub_heads.push(self.trac_commit(subpath, &commit)?);
                }
            }
        }

        let trac = Rc::new(Trac {
            name: path,
            hash: tree_id,
            parents: Vec::new(),
            sub_heads,
            trac_commit: None,
        });
        self.add(&trac);
        Ok(trac)
    }

    /// A sub-ref commit is absent from the host: search the initialized
    /// sub-repositories and transfer it in, auto-exclude it, or fail.
    fn resolve_missing(&mut self, path: &str, target: Oid) -> Result<Option<CommitData>> {
        info!("Searching submodules for: {path}");
        if self.subrepos.is_none() {
            self.subrepos = Some(SubRepoDir::discover(&self.repo)?);
        }
        let mut found = false;
        if let Some(dir) = self.subrepos.as_ref() {
            found = dir.locate(&self.repo, target)?;
        }

        if found {
            let commit = self.repo.commit(target).map_err(|source| Error::Object {
                path: path.to_string(),
                source,
            })?;
            return Ok(Some(commit));
        }
        if self.auto_exclude {
            info!("Excluding {target}");
            self.excludes.exclude(target);
            return Ok(None);
        }
        Err(Error::SubRefMissing {
            path: path.to_string(),
            hash: target,
        })
    }

    /// Write the synthetic commit covering the inherited lineages and the
    /// newly introduced heads.
    ///
    /// Parent order is inherited synthetic commits first, then new heads in
    /// first-encountered order; together with the fixed identity, the empty
    /// tree, and the source commit's timestamp this makes the hash a pure
    /// function of the source history.
    fn new_trac_commit(
        &self,
        commit: &CommitData,
        inherited: &[Oid],
        new_heads: &[Oid],
    ) -> Result<Oid> {
        let mut parents = Vec::with_capacity(inherited.len() + new_heads.len());
        parents.extend_from_slice(inherited);
        parents.extend_from_slice(new_heads);

        let tree = self.repo.write_empty_tree()?;
        let message = format!("[git-subtrac for {}]", commit.id);
        Ok(self.repo.write_commit(
            TRAC_NAME,
            TRAC_EMAIL,
            commit.committer_when,
            &message,
            tree,
            &parents,
        )?)
    }

    /// Add one record to the cache.
    fn add(&mut self, trac: &Rc<Trac>) {
        debug!("  add {} {}", short(trac.hash), trac.name);
        self.tracs.insert(trac.hash, Rc::clone(trac));
    }
}

/// Derive the diagnostic revision path of a parent commit. The first parent
/// extends a trailing `~K` (`master~25` -> `master~26`); any other parent
/// appends `^N` (`master~25` -> `master~25^3` for the third parent).
///
/// These paths look odd but are valid git revision syntax, which makes them
/// easy to feed back into other tools when chasing a diagnostic.
fn commit_path(path: &str, sub: usize) -> String {
    if sub != 1 {
        return format!("{path}^{sub}");
    }
    let Some(ix) = path.rfind('~') else {
        return format!("{path}~1");
    };
    match path[ix + 1..].parse::<u64>() {
        Ok(n) => format!("{}~{}", &path[..ix], n + 1),
        Err(_) => format!("{path}~1"),
    }
}
