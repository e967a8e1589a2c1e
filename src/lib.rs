//! imgprune library crate
//!
//! Finds images whose filename identifier is unknown to a catalog, groups and
//! pages them for review, and deletes them without ever leaving the scan root.
//! The `imgprune` binary is a thin CLI over this API.

pub mod catalog;
pub mod cleaner;
pub mod cli;
pub mod config;
pub mod error;
pub mod grouping;
pub mod logging;
pub mod output;
pub mod pagination;
pub mod progress;
pub mod scanner;
pub mod stamp;
pub mod theme;

pub use error::{Error, Result};
