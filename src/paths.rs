//! Path handling for command-line arguments

use std::path::PathBuf;

/// Expand `~` and environment variables in a path argument.
///
/// Expansion failures (e.g. an unset variable) leave the path unchanged so
/// that the later "not found" error names what the user typed.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}
