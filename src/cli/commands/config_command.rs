//! Config command feature.
//!
//! This module owns and handles the "imgprune config" command behavior.

use crate::config::{Config, MAX_PER_PAGE, MIN_PER_PAGE};
use crate::theme::Theme;
use anyhow::Context;
use std::path::Path;

/// What `imgprune config` was asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConfigAction {
    Show,
    Path,
    Init,
}

impl ConfigAction {
    /// clap keeps the flags mutually exclusive; no flag at all means `--show`.
    pub(crate) fn from_flags(show: bool, path: bool, init: bool) -> Self {
        match (show, path, init) {
            (false, true, _) => ConfigAction::Path,
            (false, false, true) => ConfigAction::Init,
            _ => ConfigAction::Show,
        }
    }
}

pub(crate) fn handle_config(action: ConfigAction) -> anyhow::Result<()> {
    let config_path = Config::config_path()?;

    match action {
        ConfigAction::Path => {
            println!("{}", config_path.display());
            Ok(())
        }
        ConfigAction::Init => init_config(&config_path),
        ConfigAction::Show => {
            show_config(&config_path);
            Ok(())
        }
    }
}

fn init_config(config_path: &Path) -> anyhow::Result<()> {
    if config_path.exists() {
        println!(
            "Config file already exists at {}",
            Theme::value(&config_path.display().to_string())
        );
        return Ok(());
    }
    let written = Config::default()
        .save()
        .context("failed to write default config")?;
    println!(
        "{} {}",
        Theme::success("Wrote default config to"),
        written.display()
    );
    Ok(())
}

fn show_config(config_path: &Path) {
    let config = Config::load();
    println!("{}", Theme::header("Current Configuration"));
    println!("{}", Theme::divider_bold(60));
    println!();
    let state = if config_path.exists() { "" } else { " (not created, using defaults)" };
    println!("File: {}{}", config_path.display(), Theme::muted(state));
    println!();
    println!("Scan:");
    match &config.scan.root {
        Some(root) => println!("  Root: {}", root.display()),
        None => println!("  Root: (none, pass --root)"),
    }
    println!();
    println!("Catalog:");
    match (&config.catalog.ids_file, &config.catalog.database) {
        (Some(ids_file), _) => println!("  Id list file: {}", ids_file.display()),
        (None, Some(database)) => {
            println!("  Database: {}", database.display());
            println!("  Query: {}", config.catalog.query);
        }
        (None, None) => println!("  (none, pass --ids-file or --catalog-db)"),
    }
    println!();
    println!("Listing:");
    println!(
        "  Per page: {} (clamped to {}..={})",
        config.per_page(),
        MIN_PER_PAGE,
        MAX_PER_PAGE
    );
    println!();
    println!("Security:");
    let token = if config.security.token.is_some() { "set" } else { "not set" };
    println!("  Deletion token: {}", token);
    println!();
}
