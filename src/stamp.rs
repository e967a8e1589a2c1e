//! Scan generation stamps.
//!
//! A stamp fingerprints the exact orphan list a user was shown. Passing it
//! back with a deletion request lets the cleaner refuse to act on a tree that
//! changed in between.

use crate::scanner::OrphanFile;
use serde::Serialize;
use std::fmt;

const STAMP_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ScanStamp(String);

impl ScanStamp {
    pub fn compute(orphans: &[OrphanFile]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for orphan in orphans {
            hasher.update(orphan.relative_path.as_os_str().as_encoded_bytes());
            hasher.update(&[0]);
            hasher.update(&orphan.size_bytes.to_le_bytes());
            hasher.update(&orphan.modified.timestamp().to_le_bytes());
        }
        let hex = hasher.finalize().to_hex();
        Self(hex.as_str()[..STAMP_LEN].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against a user-supplied stamp, ignoring case and surrounding space.
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other.trim())
    }
}

impl fmt::Display for ScanStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
