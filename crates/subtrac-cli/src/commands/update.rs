//! `git-subtrac update` - refresh every branch's tracking ref.

use anyhow::Result;
use subtrac_core::Cache;

/// Run the update command.
pub fn run(cache: &mut Cache) -> Result<()> {
    cache.update_branch_refs()?;
    Ok(())
}
