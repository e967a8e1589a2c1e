//! Single deletion feature.
//!
//! This module owns deletion of one requested path: precheck, unlink, then
//! pruning of the directories the unlink left empty.

use super::empty_dirs::prune_empty_parents;
use super::path_precheck::resolve_within;
use super::{DeletionOutcome, FailureReason};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Delete `requested` (relative to the canonical `root`) and report the outcome.
///
/// Never returns an error: a path outside the root is `invalid_path` and a
/// failed unlink is `unlink_failed`. With `dry_run` the precheck runs and the
/// outcome reports what would happen, but nothing is removed.
pub fn delete_one(root: &Path, requested: &Path, dry_run: bool) -> DeletionOutcome {
    let target = match resolve_within(root, requested) {
        Ok(path) => path,
        Err(reason) => {
            warn!(path = %requested.display(), reason = %reason, "rejected deletion request");
            return DeletionOutcome::failed(requested, reason);
        }
    };

    let size_bytes = fs::metadata(&target).map(|m| m.len()).unwrap_or(0);

    if dry_run {
        return if target.is_file() {
            DeletionOutcome::deleted(requested, size_bytes, Vec::new())
        } else {
            DeletionOutcome::failed(requested, FailureReason::UnlinkFailed)
        };
    }

    match fs::remove_file(&target) {
        Ok(()) => {
            let pruned = target
                .parent()
                .map(|parent| prune_empty_parents(parent, root))
                .unwrap_or_default();
            info!(path = %target.display(), bytes = size_bytes, pruned = pruned.len(), "deleted");
            DeletionOutcome::deleted(requested, size_bytes, pruned)
        }
        Err(e) => {
            warn!(path = %target.display(), error = %e, reason = %FailureReason::UnlinkFailed, "delete failed");
            DeletionOutcome::failed(requested, FailureReason::UnlinkFailed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_test_dir() -> TempDir {
        tempfile::tempdir().unwrap()
    }

    fn canonical_root(temp_dir: &TempDir) -> PathBuf {
        let root = temp_dir.path().canonicalize().unwrap().join("p");
        fs::create_dir_all(&root).unwrap();
        root
    }

    #[test]
    fn test_delete_prunes_emptied_parents() {
        let temp_dir = create_test_dir();
        let root = canonical_root(&temp_dir);
        let leaf = root.join("sub").join("leaf");
        fs::create_dir_all(&leaf).unwrap();
        fs::write(leaf.join("3-x.jpg"), vec![0u8; 64]).unwrap();

        let outcome = delete_one(&root, Path::new("sub/leaf/3-x.jpg"), false);

        assert!(outcome.success);
        assert_eq!(outcome.size_bytes, 64);
        assert_eq!(outcome.pruned_dirs, vec![leaf, root.join("sub")]);
        assert!(root.is_dir());
    }

    #[test]
    fn test_delete_missing_file_is_invalid_path() {
        let temp_dir = create_test_dir();
        let root = canonical_root(&temp_dir);

        let outcome = delete_one(&root, Path::new("9/9.jpg"), false);
        assert!(!outcome.success);
        assert_eq!(outcome.reason, Some(FailureReason::InvalidPath));
    }

    #[test]
    fn test_delete_directory_is_unlink_failed() {
        let temp_dir = create_test_dir();
        let root = canonical_root(&temp_dir);
        fs::create_dir_all(root.join("4")).unwrap();

        let outcome = delete_one(&root, Path::new("4"), false);
        assert_eq!(outcome.reason, Some(FailureReason::UnlinkFailed));
        assert!(root.join("4").is_dir());

        let outcome = delete_one(&root, Path::new(""), false);
        assert_eq!(outcome.reason, Some(FailureReason::UnlinkFailed));
        assert!(root.is_dir());
    }

    #[test]
    fn test_traversal_never_touches_filesystem() {
        let temp_dir = create_test_dir();
        let root = canonical_root(&temp_dir);
        let outside = root.parent().unwrap().join("keep.jpg");
        fs::write(&outside, "x").unwrap();

        let outcome = delete_one(&root, Path::new("../keep.jpg"), false);
        assert_eq!(outcome.reason, Some(FailureReason::InvalidPath));
        assert!(outside.exists());
    }

    #[test]
    fn test_dry_run_keeps_files() {
        let temp_dir = create_test_dir();
        let root = canonical_root(&temp_dir);
        fs::create_dir_all(root.join("2")).unwrap();
        fs::write(root.join("2/2.jpg"), vec![0u8; 5]).unwrap();

        let outcome = delete_one(&root, Path::new("2/2.jpg"), true);
        assert!(outcome.success);
        assert_eq!(outcome.size_bytes, 5);
        assert!(outcome.pruned_dirs.is_empty());
        assert!(root.join("2/2.jpg").exists());
    }
}
