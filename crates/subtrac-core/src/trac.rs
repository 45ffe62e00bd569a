//! Cached records for visited commits and trees.

use std::fmt;
use std::rc::Rc;

use subtrac_git::Oid;

/// Abbreviate a hash for diagnostics and dump output.
pub(crate) fn short(id: Oid) -> String {
    let mut s = id.to_string();
    s.truncate(10);
    s
}

/// A commit or tree somewhere in the host's hierarchy, including sub-repo
/// commits pulled in through sub-refs.
///
/// Records are immutable once inserted in the cache and shared by `Rc`:
/// the object graph is a DAG with high fan-in, so many records reference
/// the same sub-head.
#[derive(Debug)]
pub struct Trac {
    /// Human-readable path to this object. Diagnostics and dump ordering
    /// only; never part of any hash.
    pub name: String,
    /// Hash of the host object this record describes.
    pub hash: Oid,
    /// Parent commit records (empty for trees).
    pub parents: Vec<Rc<Trac>>,
    /// Direct sub-ref commits reachable through this object's tree, in
    /// first-encountered depth-first order. Order is observable in
    /// synthetic parent lists, so it is never sorted or deduplicated here.
    pub sub_heads: Vec<Rc<Trac>>,
    /// The synthetic tracking commit covering `parents` and `sub_heads`,
    /// when this entry introduces sub-ref history of its own.
    pub trac_commit: Option<Oid>,
}

impl fmt::Display for Trac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let heads: Vec<String> = self.sub_heads.iter().map(|h| short(h.hash)).collect();
        let heads = heads.join(",");
        match self.trac_commit {
            Some(tc) => write!(f, "{}:{}[{}]<{}>", short(self.hash), self.name, heads, short(tc)),
            None => write!(f, "{}:{}[{}]<>", short(self.hash), self.name, heads),
        }
    }
}
