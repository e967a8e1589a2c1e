//! Scan command feature.
//!
//! This module owns and handles the "imgprune scan" command behavior.

use crate::catalog;
use crate::cli::CatalogArgs;
use crate::config::Config;
use crate::grouping::{self, GroupFilter, OrphanSummary};
use crate::output::{self, CommandHints, OutputMode, ScanReport};
use crate::pagination;
use crate::progress;
use crate::scanner;
use crate::stamp::ScanStamp;
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::time::Instant;

pub(crate) struct ScanArgs {
    pub root: Option<PathBuf>,
    pub page: usize,
    pub per_page: Option<usize>,
    pub filter: Option<String>,
    pub json: bool,
    pub catalog: CatalogArgs,
}

pub(crate) fn handle_scan(args: ScanArgs, output_mode: OutputMode) -> anyhow::Result<()> {
    let mut config = Config::load();
    config.apply_cli_overrides(
        args.root,
        args.catalog.ids_file.clone(),
        args.catalog.catalog_db.clone(),
        args.catalog.catalog_query.clone(),
        args.per_page,
    );

    let root = config.scan_root()?.to_path_buf();
    let filter = GroupFilter::parse(args.filter.as_deref().unwrap_or_default())
        .context("invalid --filter pattern")?;
    let source = catalog::from_config(&config)?;

    let spinner = (!args.json && matches!(output_mode, OutputMode::Normal | OutputMode::Verbose))
        .then(|| progress::create_spinner("Scanning images..."));

    let started = Instant::now();
    let scanned = source
        .load_known_ids()
        .context("failed to load known image identifiers")
        .and_then(|known| {
            let outcome = scanner::scan_orphans(&root, &known)
                .with_context(|| format!("failed to scan {}", root.display()))?;
            Ok((known.len(), outcome))
        });
    if let Some(pb) = &spinner {
        pb.finish_and_clear();
    }
    let (known_ids, outcome) = scanned?;
    let elapsed = started.elapsed();

    let stamp = ScanStamp::compute(&outcome.orphans);
    let groups = grouping::group_orphans(outcome.orphans.clone());
    let summary = OrphanSummary::from_groups(&groups);
    let shown = grouping::filter_groups(groups, filter.as_ref());
    let page = pagination::paginate(&shown, config.per_page(), args.page);

    let hint_flags = HintFlags {
        root: &outcome.root,
        per_page: args.per_page.map(|_| config.per_page()),
        catalog: &args.catalog,
        filter: filter.as_ref().map(GroupFilter::query),
    };
    let hints = CommandHints {
        next_page: page.has_next().then(|| hint_flags.scan_command(page.page + 1)),
        delete_all: hint_flags.delete_all_command(&stamp),
    };

    let report = ScanReport {
        outcome: &outcome,
        known_ids,
        summary,
        page,
        stamp: &stamp,
        elapsed,
        filter: filter.as_ref().map(GroupFilter::query),
        hints,
    };

    if args.json {
        output::print_scan_json(&report)?;
    } else {
        output::print_scan_human(&report, output_mode);
    }

    Ok(())
}

/// The flags a listing was produced with, replayed into follow-up commands.
struct HintFlags<'a> {
    root: &'a Path,
    per_page: Option<usize>,
    catalog: &'a CatalogArgs,
    filter: Option<&'a str>,
}

impl HintFlags<'_> {
    fn scan_command(&self, page: usize) -> String {
        let mut words = vec!["imgprune".to_string(), "scan".to_string()];
        self.push_root(&mut words);
        words.push("--page".to_string());
        words.push(page.to_string());
        if let Some(per_page) = self.per_page {
            words.push("--per-page".to_string());
            words.push(per_page.to_string());
        }
        if let Some(filter) = self.filter {
            words.push("--filter".to_string());
            words.push(shell_word(filter));
        }
        self.push_catalog(&mut words);
        words.join(" ")
    }

    /// `delete --all` re-scans, so it needs the same catalog but no paging or filter
    fn delete_all_command(&self, stamp: &ScanStamp) -> String {
        let mut words = vec!["imgprune".to_string(), "delete".to_string()];
        self.push_root(&mut words);
        words.push("--all".to_string());
        words.push("--expect-stamp".to_string());
        words.push(stamp.to_string());
        self.push_catalog(&mut words);
        words.join(" ")
    }

    fn push_root(&self, words: &mut Vec<String>) {
        words.push("--root".to_string());
        words.push(shell_word(&self.root.display().to_string()));
    }

    fn push_catalog(&self, words: &mut Vec<String>) {
        if let Some(ids_file) = &self.catalog.ids_file {
            words.push("--ids-file".to_string());
            words.push(shell_word(&ids_file.display().to_string()));
        }
        if let Some(db) = &self.catalog.catalog_db {
            words.push("--catalog-db".to_string());
            words.push(shell_word(&db.display().to_string()));
        }
        if let Some(query) = &self.catalog.catalog_query {
            words.push("--catalog-query".to_string());
            words.push(shell_word(query));
        }
    }
}

/// Quote `s` for a POSIX shell unless it is made of safe characters only.
fn shell_word(s: &str) -> String {
    let safe = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:=@%+,".contains(c));
    if safe {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}
