//! Filesystem scanner.
//!
//! Walks the scan root depth-first and reports every eligible image whose
//! identifier is not known to the catalog. Only a missing (or non-directory)
//! root is fatal; unreadable directories and files are absorbed.

pub mod filename;

pub use filename::{parse_image_name, ImageId, ParsedName};

use crate::catalog::{KnownIdSet, KnownIdSource};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fs::Metadata;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// An image file whose identifier is not referenced by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanFile {
    #[serde(serialize_with = "serialize_lossy")]
    pub absolute_path: PathBuf,
    /// Path relative to the canonical scan root; accepted back by the cleaner
    #[serde(serialize_with = "serialize_lossy")]
    pub relative_path: PathBuf,
    /// File name for display (lossy when not valid UTF-8)
    pub filename: String,
    pub image_id: ImageId,
    pub format: String,
    pub size_bytes: u64,
    pub modified: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// Canonical scan root
    pub root: PathBuf,
    /// Orphans in discovery order
    pub orphans: Vec<OrphanFile>,
    /// Images skipped because the catalog knows their identifier
    pub known_skipped: usize,
    /// Files skipped because they are not eligible images
    pub ignored: usize,
    /// Directories or entries that could not be read
    pub unreadable: usize,
}

impl ScanOutcome {
    pub fn total_size_bytes(&self) -> u64 {
        self.orphans.iter().map(|o| o.size_bytes).sum()
    }

    pub fn relative_paths(&self) -> Vec<PathBuf> {
        self.orphans.iter().map(|o| o.relative_path.clone()).collect()
    }
}

/// Render a path for reports: components joined with `/`, invalid UTF-8
/// replaced. Never feed the result back to the cleaner.
pub fn display_path(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push_str(&prefix.as_os_str().to_string_lossy()),
            Component::RootDir => out.push('/'),
            other => {
                if !out.is_empty() && !out.ends_with('/') {
                    out.push('/');
                }
                out.push_str(&other.as_os_str().to_string_lossy());
            }
        }
    }
    out
}

pub(crate) fn serialize_lossy<P, S>(path: &P, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    P: AsRef<Path>,
    S: Serializer,
{
    serializer.serialize_str(&display_path(path.as_ref()))
}

/// Canonicalize the scan root, failing if it is missing or not a directory.
pub fn resolve_root(root: &Path) -> Result<PathBuf> {
    let canonical = root
        .canonicalize()
        .map_err(|_| Error::RootNotFound(root.to_path_buf()))?;
    if !canonical.is_dir() {
        return Err(Error::NotADirectory(root.to_path_buf()));
    }
    Ok(canonical)
}

/// Load the known identifiers once, then scan.
pub fn find_orphans(root: &Path, source: &dyn KnownIdSource) -> Result<ScanOutcome> {
    // Check the root before touching the catalog
    resolve_root(root)?;
    let known = source.load_known_ids()?;
    info!(known_ids = known.len(), "catalog loaded");
    scan_orphans(root, &known)
}

/// Scan `root` for images whose identifier is absent from `known`.
///
/// Symlinks are never followed into and never listed, which keeps the walk
/// finite even when links form cycles. Entries inside each directory are
/// visited in file-name order so the result is deterministic.
pub fn scan_orphans(root: &Path, known: &KnownIdSet) -> Result<ScanOutcome> {
    let root = resolve_root(root)?;
    let mut outcome = ScanOutcome {
        root: root.clone(),
        ..ScanOutcome::default()
    };

    let walker = WalkDir::new(&root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                // Permission denied or a directory vanished mid-walk: treat as empty
                debug!(path = ?err.path(), error = %err, "skipping unreadable entry");
                outcome.unreadable += 1;
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let Some(parsed) = parse_image_name(entry.file_name()) else {
            outcome.ignored += 1;
            continue;
        };

        if known.contains(parsed.image_id) {
            outcome.known_skipped += 1;
            continue;
        }

        let (size_bytes, modified) = stat_best_effort(entry.metadata().ok());
        let absolute_path = entry.path().to_path_buf();
        let relative_path = absolute_path
            .strip_prefix(&root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| absolute_path.clone());

        outcome.orphans.push(OrphanFile {
            absolute_path,
            relative_path,
            filename: entry.file_name().to_string_lossy().into_owned(),
            image_id: parsed.image_id,
            format: parsed.format,
            size_bytes,
            modified,
        });
    }

    info!(
        root = %root.display(),
        orphans = outcome.orphans.len(),
        known = outcome.known_skipped,
        ignored = outcome.ignored,
        unreadable = outcome.unreadable,
        "scan complete"
    );
    Ok(outcome)
}

/// Size and mtime, or zero and the epoch if the file could not be stat'ed.
fn stat_best_effort(metadata: Option<Metadata>) -> (u64, DateTime<Utc>) {
    let Some(meta) = metadata else {
        return (0, DateTime::<Utc>::UNIX_EPOCH);
    };
    let modified = meta
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    (meta.len(), modified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_dir() -> TempDir {
        tempfile::tempdir().unwrap()
    }

    fn write_file(root: &Path, rel: &str, size: usize) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, vec![0u8; size]).unwrap();
    }

    #[test]
    fn test_scan_finds_only_unknown_ids() {
        let temp_dir = create_test_dir();
        let root = temp_dir.path();
        write_file(root, "1/1.jpg", 10);
        write_file(root, "1/1-small.jpg", 5);
        write_file(root, "3/3.jpg", 20);
        write_file(root, "3/3-cart.webp", 7);
        write_file(root, "index.php", 1);
        write_file(root, "index.jpg", 1);
        write_file(root, "notes.txt", 1);

        let known = KnownIdSet::from_raw([1, 2]);
        let outcome = scan_orphans(root, &known).unwrap();

        assert_eq!(outcome.orphans.len(), 2);
        assert!(outcome.orphans.iter().all(|o| o.image_id.get() == 3));
        assert_eq!(outcome.known_skipped, 2);
        assert_eq!(outcome.ignored, 3);
        assert_eq!(outcome.total_size_bytes(), 27);
    }

    #[test]
    fn test_scan_records_relative_paths_and_metadata() {
        let temp_dir = create_test_dir();
        let root = temp_dir.path();
        write_file(root, "4/5/45-home.png", 12);

        let outcome = scan_orphans(root, &KnownIdSet::new()).unwrap();
        let orphan = &outcome.orphans[0];

        assert_eq!(orphan.relative_path, Path::new("4/5/45-home.png"));
        assert_eq!(orphan.filename, "45-home.png");
        assert_eq!(orphan.format, "home");
        assert_eq!(orphan.size_bytes, 12);
        assert!(orphan.modified > DateTime::<Utc>::UNIX_EPOCH);
        assert!(orphan.absolute_path.is_absolute());
        assert_eq!(outcome.root, root.canonicalize().unwrap());
    }

    #[test]
    fn test_scan_order_is_depth_first_by_name() {
        let temp_dir = create_test_dir();
        let root = temp_dir.path();
        write_file(root, "b/2.jpg", 1);
        write_file(root, "a/9.jpg", 1);
        write_file(root, "a/c/8.jpg", 1);
        write_file(root, "1.jpg", 1);

        let outcome = scan_orphans(root, &KnownIdSet::new()).unwrap();
        let order: Vec<String> = outcome.relative_paths().iter().map(|p| display_path(p)).collect();
        assert_eq!(order, vec!["1.jpg", "a/9.jpg", "a/c/8.jpg", "b/2.jpg"]);
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let temp_dir = create_test_dir();
        let missing = temp_dir.path().join("nope");
        assert!(matches!(
            scan_orphans(&missing, &KnownIdSet::new()),
            Err(Error::RootNotFound(_))
        ));

        let file = temp_dir.path().join("file.jpg");
        fs::write(&file, "x").unwrap();
        assert!(matches!(
            scan_orphans(&file, &KnownIdSet::new()),
            Err(Error::NotADirectory(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_cycles_terminate() {
        let temp_dir = create_test_dir();
        let root = temp_dir.path();
        write_file(root, "a/7.jpg", 3);
        std::os::unix::fs::symlink(root, root.join("a/loop")).unwrap();
        std::os::unix::fs::symlink(root.join("a/7.jpg"), root.join("8.jpg")).unwrap();

        let outcome = scan_orphans(root, &KnownIdSet::new()).unwrap();
        assert_eq!(outcome.relative_paths(), vec![PathBuf::from("a/7.jpg")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_names_keep_raw_paths() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = create_test_dir();
        let root = temp_dir.path();
        let dir = root.join(OsStr::from_bytes(b"d\xff"));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("5.jpg"), "x").unwrap();
        fs::write(root.join(OsStr::from_bytes(b"6-\xff.jpg")), "x").unwrap();

        let outcome = scan_orphans(root, &KnownIdSet::new()).unwrap();

        assert_eq!(outcome.ignored, 0);
        assert_eq!(
            outcome.relative_paths(),
            vec![
                PathBuf::from(OsStr::from_bytes(b"6-\xff.jpg")),
                Path::new(OsStr::from_bytes(b"d\xff")).join("5.jpg"),
            ]
        );
        assert!(outcome.orphans.iter().all(|o| root.join(&o.relative_path).is_file()));
        assert_eq!(outcome.orphans[0].image_id.get(), 6);
        assert_eq!(outcome.orphans[0].format, "\u{fffd}");
        assert_eq!(display_path(&outcome.orphans[1].relative_path), "d\u{fffd}/5.jpg");

        let json = serde_json::to_value(&outcome.orphans[1]).unwrap();
        assert_eq!(json["relative_path"], "d\u{fffd}/5.jpg");
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_is_absorbed() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = create_test_dir();
        let root = temp_dir.path();
        write_file(root, "locked/1.jpg", 1);
        write_file(root, "open/2.jpg", 1);
        let locked = root.join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users read through mode 000; nothing to observe then
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let outcome = scan_orphans(root, &KnownIdSet::new());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        let outcome = outcome.unwrap();

        assert_eq!(outcome.relative_paths(), vec![PathBuf::from("open/2.jpg")]);
        assert!(outcome.unreadable >= 1);
    }

    #[test]
    fn test_display_path_joins_with_slashes() {
        assert_eq!(display_path(Path::new("a").join("b").join("3.jpg").as_path()), "a/b/3.jpg");
        assert_eq!(display_path(Path::new("../x.jpg")), "../x.jpg");
        assert_eq!(display_path(Path::new("")), "");
        #[cfg(unix)]
        assert_eq!(display_path(Path::new("/etc/passwd")), "/etc/passwd");
    }

    #[test]
    fn test_stat_failure_defaults_to_zero() {
        let (size, modified) = stat_best_effort(None);
        assert_eq!(size, 0);
        assert_eq!(modified, DateTime::<Utc>::UNIX_EPOCH);
    }
}
