//! Deletion executor.
//!
//! Deletes a requested set of files under a scan root, one outcome per path
//! in request order. Every path is confined to the root by a canonical
//! containment check before anything is unlinked, and directories left empty
//! by a deletion are pruned up to (never including) the root.

mod batch_deletion;
mod empty_dirs;
mod path_precheck;
mod root_lock;
mod single_deletion;

pub use batch_deletion::{delete_batch, BatchDeleteResult};
pub use empty_dirs::{is_dir_empty, prune_empty_parents};
pub use path_precheck::resolve_within;
pub use root_lock::RootLock;
pub use single_deletion::delete_one;

use crate::catalog::KnownIdSource;
use crate::error::{Error, Result};
use crate::scanner;
use crate::stamp::ScanStamp;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

/// Why a requested path was not deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Could not be resolved, or resolves outside the scan root
    InvalidPath,
    /// Inside the root, but the unlink itself failed
    UnlinkFailed,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::InvalidPath => "invalid_path",
            FailureReason::UnlinkFailed => "unlink_failed",
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            FailureReason::InvalidPath => "invalid path (outside the image directory or not found)",
            FailureReason::UnlinkFailed => "could not delete file",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionOutcome {
    #[serde(serialize_with = "crate::scanner::serialize_lossy")]
    pub requested_path: PathBuf,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
    /// Size of the deleted file (or the file that would be deleted in a dry run)
    pub size_bytes: u64,
    /// Directories removed because this deletion left them empty
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pruned_dirs: Vec<PathBuf>,
}

impl DeletionOutcome {
    pub fn deleted(requested_path: &Path, size_bytes: u64, pruned_dirs: Vec<PathBuf>) -> Self {
        Self {
            requested_path: requested_path.to_path_buf(),
            success: true,
            reason: None,
            size_bytes,
            pruned_dirs,
        }
    }

    pub fn failed(requested_path: &Path, reason: FailureReason) -> Self {
        Self {
            requested_path: requested_path.to_path_buf(),
            success: false,
            reason: Some(reason),
            size_bytes: 0,
            pruned_dirs: Vec::new(),
        }
    }
}

/// Which files a deletion batch should target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteRequest {
    /// Paths relative to the scan root, as reported by the scanner
    Selected(Vec<PathBuf>),
    /// Every orphan found by a fresh scan
    All,
}

#[derive(Debug, Clone, Default)]
pub struct DeleteOptions {
    /// Check and report, but never unlink or prune
    pub dry_run: bool,
    /// Abort unless a fresh scan still produces this stamp
    pub expected_stamp: Option<String>,
}

/// Run one deletion batch against `root`.
///
/// The catalog is only consulted when the request is [`DeleteRequest::All`]
/// or an expected stamp was supplied; both need a fresh scan. The root lock is
/// held from that scan until the last path has been processed.
pub fn execute(
    root: &Path,
    request: DeleteRequest,
    source: &dyn KnownIdSource,
    options: &DeleteOptions,
) -> Result<BatchDeleteResult> {
    let root = scanner::resolve_root(root)?;
    let _lock = RootLock::acquire(&root)?;

    let needs_scan = matches!(request, DeleteRequest::All) || options.expected_stamp.is_some();
    let scan = if needs_scan {
        Some(scanner::find_orphans(&root, source)?)
    } else {
        None
    };

    if let (Some(expected), Some(scan)) = (&options.expected_stamp, &scan) {
        let actual = ScanStamp::compute(&scan.orphans);
        if !actual.matches(expected) {
            return Err(Error::StaleScan {
                expected: expected.trim().to_string(),
                actual: actual.to_string(),
            });
        }
    }

    let paths = match (request, scan) {
        (DeleteRequest::Selected(paths), _) => paths,
        (DeleteRequest::All, Some(scan)) => scan.relative_paths(),
        (DeleteRequest::All, None) => Vec::new(),
    };

    info!(root = %root.display(), count = paths.len(), dry_run = options.dry_run, "deletion batch start");
    Ok(batch_deletion::run_batch(&root, &paths, options.dry_run))
}
