//! Per-root mutual exclusion for deletion batches.
//!
//! Pruning empty directories is only correct when a single batch works on a
//! tree at a time, so each canonical root may have one active batch per
//! process.

use crate::error::{Error, Result};
use lazy_static::lazy_static;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

lazy_static! {
    static ref ACTIVE_ROOTS: Mutex<HashSet<PathBuf>> = Mutex::new(HashSet::new());
}

/// Held while a deletion batch runs; releases the root on drop.
#[derive(Debug)]
pub struct RootLock {
    root: PathBuf,
}

impl RootLock {
    /// Claim `root` (expected to be canonical), or fail with `RootBusy`.
    pub fn acquire(root: &Path) -> Result<Self> {
        let mut active = ACTIVE_ROOTS.lock().unwrap_or_else(|e| e.into_inner());
        if !active.insert(root.to_path_buf()) {
            return Err(Error::RootBusy(root.to_path_buf()));
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Drop for RootLock {
    fn drop(&mut self) {
        let mut active = ACTIVE_ROOTS.lock().unwrap_or_else(|e| e.into_inner());
        active.remove(&self.root);
    }
}
