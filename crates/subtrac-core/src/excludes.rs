//! Sub-ref exclusion handling.
//!
//! Exclusions come from `-x` flags and from an optional `.trac-excludes`
//! file at the worktree root; auto-exclude adds more during traversal.
//! An excluded sub-ref is treated as if its tree entry did not exist.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use subtrac_git::{parse_oid, Oid};

use crate::error::{Error, Result};

/// File consulted at the worktree root for exclusions.
pub const EXCLUDES_FILE: &str = ".trac-excludes";

/// Set of sub-ref commit hashes to treat as absent for this invocation.
///
/// Never persisted; auto-excluded hashes last only for the process.
#[derive(Debug, Default)]
pub struct ExclusionSet {
    hashes: HashSet<Oid>,
}

impl ExclusionSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a set from string-form hashes (the `-x` flags).
    ///
    /// # Errors
    /// Returns [`Error::BadExcludeHash`] on an unparsable hash.
    pub fn from_hashes(hashes: &[String]) -> Result<Self> {
        let mut set = Self::new();
        for text in hashes {
            set.exclude(parse_exclude(text)?);
        }
        Ok(set)
    }

    /// Merge in the `.trac-excludes` file under `worktree`, if present.
    ///
    /// Each line is one hash; `#` starts a comment, surrounding whitespace
    /// is ignored, blank lines are skipped. A missing file is not an error.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read, or if a line
    /// is not a valid hash.
    pub fn load_file(&mut self, worktree: &Path) -> Result<()> {
        let path = worktree.join(EXCLUDES_FILE);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
            Err(source) => return Err(Error::ExcludesFile { path, source }),
        };

        for line in contents.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            self.exclude(parse_exclude(line)?);
        }
        Ok(())
    }

    /// Add one hash to the set. Idempotent.
    pub fn exclude(&mut self, hash: Oid) {
        self.hashes.insert(hash);
    }

    /// True if `hash` is excluded.
    #[must_use]
    pub fn contains(&self, hash: Oid) -> bool {
        self.hashes.contains(&hash)
    }

    /// Number of excluded hashes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    /// True if nothing is excluded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

fn parse_exclude(text: &str) -> Result<Oid> {
    parse_oid(text).map_err(|source| Error::BadExcludeHash {
        text: text.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const H1: &str = "1111111111111111111111111111111111111111";
    const H2: &str = "2222222222222222222222222222222222222222";

    fn oid(s: &str) -> Oid {
        parse_oid(s).unwrap()
    }

    #[test]
    fn test_from_hashes() {
        let set = ExclusionSet::from_hashes(&[H1.to_string(), H2.to_string()]).unwrap();
        assert!(set.contains(oid(H1)));
        assert!(set.contains(oid(H2)));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_bad_hash_is_fatal() {
        let err = ExclusionSet::from_hashes(&["not-a-hash".to_string()]).unwrap_err();
        assert!(err.to_string().contains("not-a-hash"));
    }

    #[test]
    fn test_exclude_idempotent() {
        let mut set = ExclusionSet::new();
        set.exclude(oid(H1));
        set.exclude(oid(H1));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_load_file_parsing() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(EXCLUDES_FILE),
            format!("# header comment\n\n  {H1}  \n{H2} # trailing comment\n   # indented comment\n"),
        )
        .unwrap();

        let mut set = ExclusionSet::new();
        set.load_file(temp.path()).unwrap();
        assert!(set.contains(oid(H1)));
        assert!(set.contains(oid(H2)));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_load_file_missing_is_ok() {
        let temp = TempDir::new().unwrap();
        let mut set = ExclusionSet::new();
        set.load_file(temp.path()).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_load_file_bad_line() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(EXCLUDES_FILE), "zzzz\n").unwrap();

        let mut set = ExclusionSet::new();
        assert!(set.load_file(temp.path()).is_err());
    }
}
