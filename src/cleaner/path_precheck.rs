//! Path precheck feature.
//!
//! This module owns the containment check that confines deletions to the
//! scan root. It is the only thing standing between a caller-supplied path
//! and `unlink`, so it works on canonical (symlink-resolved) paths rather than
//! on the raw string.

use super::FailureReason;
use std::path::{Path, PathBuf};

/// Resolve `requested` against the canonical `root` and confirm the result is
/// the root itself or lies beneath it.
///
/// `root` must already be canonical. An absolute `requested` path replaces the
/// root when joined and is then judged like any other path. Containment is
/// compared component-wise, so `/img/p2` is not considered inside `/img/p`.
pub fn resolve_within(root: &Path, requested: &Path) -> Result<PathBuf, FailureReason> {
    let candidate = root.join(requested);
    let canonical = candidate
        .canonicalize()
        .map_err(|_| FailureReason::InvalidPath)?;

    if canonical.starts_with(root) {
        Ok(canonical)
    } else {
        Err(FailureReason::InvalidPath)
    }
}
