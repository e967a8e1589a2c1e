//! Library error type.
//!
//! Only conditions that stop a whole scan or a whole deletion batch become an
//! `Error`. Per-entry problems are absorbed by the scanner and per-path delete
//! failures are reported as `DeletionOutcome`s instead.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Scan root not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Scan root is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Catalog database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid filter pattern: {0}")]
    Filter(#[from] globset::Error),

    #[error("Invalid or missing security token")]
    Unauthorized,

    #[error("Scan results changed since they were displayed (expected stamp {expected}, found {actual}); re-run scan")]
    StaleScan { expected: String, actual: String },

    #[error("Another deletion batch is already running for {}", .0.display())]
    RootBusy(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
