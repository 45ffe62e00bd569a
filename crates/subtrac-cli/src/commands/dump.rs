//! `git-subtrac dump` - print the cache after loading the given refs.

use anyhow::Result;
use subtrac_core::Cache;

/// Run the dump command.
pub fn run(cache: &mut Cache, refs: &[String]) -> Result<()> {
    for refname in refs {
        cache.trac_by_ref(refname)?;
    }
    println!("{}", cache.dump());
    Ok(())
}
