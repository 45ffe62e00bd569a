//! Terminal output formatting utilities.
//!
//! Everything here goes to stderr; stdout is reserved for command output.

use colored::Colorize;

/// Print a fatal error message.
pub fn error(msg: &str) {
    eprintln!("{} {}", "git-subtrac:".red().bold(), msg);
}

/// Print a warning message.
pub fn warn(msg: &str) {
    eprintln!("{} {}", "warning:".yellow(), msg);
}
