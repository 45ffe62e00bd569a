//! CLI argument definitions and command modules.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod cid;
pub mod dump;
pub mod update;

/// Keep every sub-repo commit your history has ever referenced reachable
/// from the host repository, by maintaining `*.trac` tracking refs whose
/// synthetic commits cite the sub-ref commits as parents.
#[derive(Debug, Parser)]
#[command(name = "git-subtrac", version, about)]
pub struct Cli {
    /// Path to the git repo.
    #[arg(
        short = 'd',
        long = "git-dir",
        value_name = "GIT_DIR",
        default_value = "."
    )]
    pub git_dir: PathBuf,

    /// Commit ids to exclude.
    #[arg(
        short = 'x',
        long = "exclude",
        value_name = "commitids",
        value_delimiter = ','
    )]
    pub exclude: Vec<String>,

    /// Auto exclude missing commits.
    #[arg(long)]
    pub auto_exclude: bool,

    /// Verbose mode.
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the id of a tracking commit based on the given ref.
    Cid {
        /// Ref to build the tracking commit for.
        #[arg(value_name = "ref")]
        refname: String,
    },

    /// Update all local branches with a matching *.trac branch.
    Update,

    /// Print the cache after loading the given branch ref(s).
    Dump {
        /// Refs to load before dumping.
        #[arg(value_name = "refs", required = true)]
        refs: Vec<String>,
    },
}
