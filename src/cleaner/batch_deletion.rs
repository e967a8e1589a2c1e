//! Batch deletion feature.
//!
//! This module owns batch deletion operations and results.

use super::root_lock::RootLock;
use super::single_deletion::delete_one;
use super::DeletionOutcome;
use crate::error::Result;
use crate::scanner;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchDeleteResult {
    pub success_count: usize,
    pub error_count: usize,
    pub freed_bytes: u64,
    pub dry_run: bool,
    /// One entry per requested path, in request order
    pub outcomes: Vec<DeletionOutcome>,
}

impl BatchDeleteResult {
    pub fn failures(&self) -> impl Iterator<Item = &DeletionOutcome> {
        self.outcomes.iter().filter(|o| !o.success)
    }

    pub fn successes(&self) -> impl Iterator<Item = &DeletionOutcome> {
        self.outcomes.iter().filter(|o| o.success)
    }

    pub fn pruned_dir_count(&self) -> usize {
        self.outcomes.iter().map(|o| o.pruned_dirs.len()).sum()
    }
}

/// Delete every path in `paths` (relative to `root`), holding the root lock.
///
/// Returns an error only when the root is missing or another batch holds it.
/// Individual failures are recorded and never stop the remaining paths.
pub fn delete_batch(root: &Path, paths: &[PathBuf], dry_run: bool) -> Result<BatchDeleteResult> {
    let root = scanner::resolve_root(root)?;
    let _lock = RootLock::acquire(&root)?;
    Ok(run_batch(&root, paths, dry_run))
}

/// Batch loop; `root` is canonical and already locked by the caller.
pub(super) fn run_batch(root: &Path, paths: &[PathBuf], dry_run: bool) -> BatchDeleteResult {
    let mut result = BatchDeleteResult {
        dry_run,
        outcomes: Vec::with_capacity(paths.len()),
        ..BatchDeleteResult::default()
    };

    for requested in paths {
        let outcome = delete_one(root, requested, dry_run);
        if outcome.success {
            result.success_count += 1;
            result.freed_bytes += outcome.size_bytes;
        } else {
            result.error_count += 1;
        }
        result.outcomes.push(outcome);
    }

    info!(
        success = result.success_count,
        errors = result.error_count,
        freed_bytes = result.freed_bytes,
        dry_run,
        "deletion batch done"
    );
    result
}
