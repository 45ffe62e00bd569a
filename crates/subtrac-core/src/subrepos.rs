//! Discovery of initialized sub-repositories and missing-object location.

use subtrac_git::{Oid, Repository};
use tracing::info;

use crate::error::{Error, Result};

/// One initialized sub-repository reachable from the host.
#[derive(Debug)]
pub(crate) struct SubRepo {
    /// Logical path: `<name>` at the first level, `<parent>/modules/<name>`
    /// below, matching git's module storage layout.
    pub(crate) path: String,
    pub(crate) repo: Repository,
}

/// Directory of every initialized sub-repository, discovered depth-first.
///
/// Built lazily by the cache the first time a sub-ref commit is missing
/// from the host, then reused for the rest of the invocation.
#[derive(Debug)]
pub(crate) struct SubRepoDir {
    entries: Vec<SubRepo>,
}

impl SubRepoDir {
    /// Walk the host's submodule configuration, recursively opening every
    /// initialized sub-repository.
    pub(crate) fn discover(host: &Repository) -> Result<Self> {
        let mut entries = Vec::new();
        walk(host, "", &mut entries)?;
        Ok(Self { entries })
    }

    /// Probe each sub-repository for `target`; on a hit, transfer it and
    /// its ancestry into `host` and report `true`. `false` means no copy
    /// exists anywhere.
    pub(crate) fn locate(&self, host: &Repository, target: Oid) -> Result<bool> {
        for sub in &self.entries {
            if !sub.repo.has_commit(target) {
                info!("  ...not in {}", sub.path);
                continue;
            }
            info!("  ...found! in {}", sub.path);
            host.fetch_local(&sub.repo, target)
                .map_err(|source| Error::SubRepo {
                    path: sub.path.clone(),
                    source,
                })?;
            return Ok(true);
        }
        Ok(false)
    }

    #[cfg(test)]
    fn paths(&self) -> Vec<&str> {
        self.entries.iter().map(|s| s.path.as_str()).collect()
    }
}

fn walk(repo: &Repository, prefix: &str, out: &mut Vec<SubRepo>) -> Result<()> {
    let subs = repo.submodules().map_err(|source| Error::SubRepo {
        path: prefix.to_string(),
        source,
    })?;

    for sub in subs {
        let path = if prefix.is_empty() {
            sub.name.clone()
        } else {
            format!("{prefix}/modules/{}", sub.name)
        };
        let Some(repo) = sub.repo else {
            info!("git submodule({path}): not initialized; skipping");
            continue;
        };

        // Parents are listed (and therefore probed) before their children.
        let mut children = Vec::new();
        walk(&repo, &path, &mut children)?;
        out.push(SubRepo { path, repo });
        out.append(&mut children);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_discover_without_submodules() {
        let temp = TempDir::new().unwrap();
        git2::Repository::init(temp.path()).unwrap();
        let repo = Repository::open(temp.path()).unwrap();

        let dir = SubRepoDir::discover(&repo).unwrap();
        assert!(dir.paths().is_empty());

        let absent =
            subtrac_git::parse_oid("1111111111111111111111111111111111111111").unwrap();
        assert!(!dir.locate(&repo, absent).unwrap());
    }
}
