//! Command feature handlers.
//!
//! Each module owns one command feature.

pub mod config_command;
pub mod delete_command;
pub mod scan_command;
