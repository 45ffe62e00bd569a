//! git-subtrac - keep sub-repo history reachable from the host repository.

use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;

mod commands;
mod output;

use commands::{Cli, Commands};
use subtrac_core::{Cache, CacheOptions};
use subtrac_git::Repository;

/// Exit code for usage errors and fatal operation errors.
const EXIT_FATAL: i32 = 99;

/// Stack size for the traversal thread. Recursion depth is bounded by the
/// length of the longest source history, which can far exceed what the
/// default thread stack accommodates.
const TRAVERSAL_STACK: usize = 64 * 1024 * 1024;

fn main() {
    // Respect NO_COLOR environment variable (https://no-color.org/)
    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => EXIT_FATAL,
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    init_tracing(cli.verbose);

    let worker = std::thread::Builder::new()
        .name("traversal".into())
        .stack_size(TRAVERSAL_STACK)
        .spawn(move || run(cli));
    let result = match worker {
        Ok(handle) => match handle.join() {
            Ok(result) => result,
            // The panic message has already been printed by the default hook.
            Err(_) => std::process::exit(EXIT_FATAL),
        },
        Err(err) => {
            output::error(&format!("failed to start worker thread: {err}"));
            std::process::exit(EXIT_FATAL);
        }
    };

    if let Err(err) = result {
        output::error(&format!("{err:#}"));
        std::process::exit(EXIT_FATAL);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let repo = Repository::open(&cli.git_dir)
        .with_context(|| format!("git: {}", cli.git_dir.display()))?;
    let mut cache = Cache::new(
        repo,
        CacheOptions {
            excludes: cli.exclude,
            auto_exclude: cli.auto_exclude,
        },
    )?;

    match cli.command {
        Commands::Cid { refname } => commands::cid::run(&mut cache, &refname),
        Commands::Update => commands::update::run(&mut cache),
        Commands::Dump { refs } => commands::dump::run(&mut cache, &refs),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = format!("subtrac_core={level},subtrac_git={level}");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
