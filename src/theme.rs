//! Terminal styling for reports.
//!
//! Color output can be switched off with `NO_COLOR` or `CLICOLOR=0`, which
//! `colored` honors on its own.

use colored::Colorize;

/// Formatting helpers shared by every report
pub struct Theme;

impl Theme {
    pub fn primary(text: &str) -> String {
        text.bold().to_string()
    }

    pub fn header(text: &str) -> String {
        text.bold().cyan().to_string()
    }

    pub fn success(text: &str) -> String {
        text.green().to_string()
    }

    pub fn warning(text: &str) -> String {
        text.yellow().to_string()
    }

    pub fn error(text: &str) -> String {
        text.red().bold().to_string()
    }

    pub fn muted(text: &str) -> String {
        text.dimmed().to_string()
    }

    pub fn value(text: &str) -> String {
        text.bright_white().to_string()
    }

    pub fn size(text: &str) -> String {
        text.magenta().to_string()
    }

    pub fn command(text: &str) -> String {
        text.bold().green().to_string()
    }

    /// Double-line divider under a report title
    pub fn divider_bold(width: usize) -> String {
        "═".repeat(width).dimmed().to_string()
    }
}
