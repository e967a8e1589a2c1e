//! Empty directory pruning after a deletion.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// True when `path` can be listed and holds no entries at all.
///
/// An unreadable directory counts as non-empty.
pub fn is_dir_empty(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}

/// Remove `start` and then each of its ancestors while they are empty.
///
/// Stops at the first non-empty or unreadable directory, at the first failed
/// removal, or on reaching `root`, which is never removed. Both paths must be
/// canonical. Returns the removed directories, innermost first.
pub fn prune_empty_parents(start: &Path, root: &Path) -> Vec<PathBuf> {
    let mut removed = Vec::new();
    let mut current = start.to_path_buf();

    while current != root && current.starts_with(root) {
        if !is_dir_empty(&current) {
            break;
        }
        if let Err(e) = fs::remove_dir(&current) {
            debug!(dir = %current.display(), error = %e, "could not prune directory");
            break;
        }
        debug!(dir = %current.display(), "pruned empty directory");
        removed.push(current.clone());

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }

    removed
}
