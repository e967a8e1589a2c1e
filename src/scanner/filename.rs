//! Filename parsing feature.
//!
//! Image files are named `<id>[-<format>].<ext>`, e.g. `42.jpg` or
//! `42-home_default.webp`. This module decides whether a file name is an
//! eligible image and extracts the identifier and format label from it.

use serde::Serialize;
use std::ffi::OsStr;
use std::fmt;
use std::num::NonZeroU64;
use std::path::Path;

/// Extensions eligible for scanning (compared case-insensitively)
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "avif"];

/// Base names of housekeeping files that live next to the images
pub const RESERVED_NAMES: &[&str] = &["index", "fileType"];

/// Format label used when the file name has no `-<format>` suffix
pub const ORIGINAL_FORMAT: &str = "original";

/// Catalog identifier encoded in an image file name. Always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ImageId(NonZeroU64);

impl ImageId {
    /// Returns `None` for zero
    pub fn new(value: u64) -> Option<Self> {
        NonZeroU64::new(value).map(Self)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }

    /// Parse an all-digit string. Signs, whitespace, an empty string, zero and
    /// values that do not fit in 64 bits are all rejected.
    pub fn parse_digits(s: &str) -> Option<Self> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        s.parse::<u64>().ok().and_then(Self::new)
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub image_id: ImageId,
    pub format: String,
}

pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| IMAGE_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Parse an image file name.
///
/// Returns `None` when the file is not an eligible image (wrong extension,
/// reserved housekeeping name) or when the part before the first `-` is not a
/// positive decimal integer. Such files are neither orphans nor known; they
/// are left alone.
///
/// Names are handled as raw bytes, so a suffix that is not valid UTF-8 still
/// parses; only the format label is converted (lossily) for display.
pub fn parse_image_name<S: AsRef<OsStr> + ?Sized>(file_name: &S) -> Option<ParsedName> {
    let path = Path::new(file_name);
    if !has_image_extension(path) {
        return None;
    }

    let base = path.file_stem()?;
    if RESERVED_NAMES.iter().any(|name| base == OsStr::new(name)) {
        return None;
    }

    let bytes = base.as_encoded_bytes();
    let (prefix, suffix) = match bytes.iter().position(|&b| b == b'-') {
        Some(dash) => (&bytes[..dash], &bytes[dash + 1..]),
        None => (bytes, &[][..]),
    };

    let image_id = ImageId::parse_digits(std::str::from_utf8(prefix).ok()?)?;
    let format = if suffix.is_empty() {
        ORIGINAL_FORMAT.to_string()
    } else {
        String::from_utf8_lossy(suffix).into_owned()
    };

    Some(ParsedName { image_id, format })
}
