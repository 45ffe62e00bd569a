//! `git-subtrac cid` - print the tracking commit id for a ref.

use anyhow::Result;
use subtrac_core::Cache;

use crate::output;

/// Run the cid command.
///
/// Prints the synthetic tip's hash on stdout. A ref whose history carries
/// no sub-refs prints nothing and still succeeds; only an unresolvable ref
/// or a failed build is an error.
pub fn run(cache: &mut Cache, refname: &str) -> Result<()> {
    match cache.trac_by_ref(refname)? {
        Some(id) => println!("{id}"),
        None => output::warn(&format!("no sub-ref commits found for {refname}")),
    }
    Ok(())
}
