//! Delete command feature.
//!
//! This module owns and handles the "imgprune delete" command behavior.

use crate::catalog::{self, KnownIdSet, KnownIdSource};
use crate::cleaner::{self, DeleteOptions, DeleteRequest};
use crate::cli::{read_line_from_stdin, CatalogArgs};
use crate::config::Config;
use crate::grouping;
use crate::output::{self, OutputMode};
use crate::scanner;
use crate::theme::Theme;
use anyhow::Context;
use std::path::{Path, PathBuf};

pub(crate) struct DeleteArgs {
    pub root: Option<PathBuf>,
    pub all: bool,
    pub files: Vec<PathBuf>,
    pub token: Option<String>,
    pub expect_stamp: Option<String>,
    pub dry_run: bool,
    pub yes: bool,
    pub json: bool,
    pub catalog: CatalogArgs,
}

/// Returns `Ok(false)` when at least one requested path could not be deleted.
pub(crate) fn handle_delete(args: DeleteArgs, output_mode: OutputMode) -> anyhow::Result<bool> {
    let mut config = Config::load();
    config.apply_cli_overrides(
        args.root,
        args.catalog.ids_file,
        args.catalog.catalog_db,
        args.catalog.catalog_query,
        None,
    );

    config.authorize(args.token.as_deref())?;
    let root = config.scan_root()?.to_path_buf();

    let request = if args.all {
        DeleteRequest::All
    } else {
        DeleteRequest::Selected(args.files)
    };

    // Selected paths never consult the catalog unless a stamp must be verified
    let source: Box<dyn KnownIdSource> = if args.all || args.expect_stamp.is_some() {
        catalog::from_config(&config)?
    } else {
        Box::new(KnownIdSet::new())
    };

    if !args.yes && !args.dry_run {
        let target = match &request {
            DeleteRequest::All => {
                // Preview only; `execute` re-scans under the root lock
                let preview = scanner::find_orphans(&root, source.as_ref())
                    .with_context(|| format!("failed to scan {}", root.display()))?;
                let files = preview.orphans.len();
                let ids = grouping::group_orphans(preview.orphans).len();
                ConfirmTarget::All { files, ids }
            }
            DeleteRequest::Selected(paths) => ConfirmTarget::Selected(paths.len()),
        };
        // An empty batch deletes nothing, so it runs without asking
        if !target.is_empty() && !confirm(&target, &root) {
            return Ok(true);
        }
    }

    let options = DeleteOptions {
        dry_run: args.dry_run,
        expected_stamp: args.expect_stamp,
    };
    let result = cleaner::execute(&root, request, source.as_ref(), &options)
        .with_context(|| format!("deletion under {} aborted", root.display()))?;

    if args.json {
        output::print_delete_json(&result)?;
    } else {
        output::print_delete_human(&result, output_mode);
    }

    Ok(result.error_count == 0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfirmTarget {
    All { files: usize, ids: usize },
    Selected(usize),
}

impl ConfirmTarget {
    fn is_empty(&self) -> bool {
        match *self {
            ConfirmTarget::All { files, .. } => files == 0,
            ConfirmTarget::Selected(count) => count == 0,
        }
    }

    fn warning(&self, root: &Path) -> String {
        match *self {
            ConfirmTarget::All { files, ids } => format!(
                "This will permanently delete ALL {} orphan files ({} IDs) under {}. This action is irreversible!",
                files,
                ids,
                root.display()
            ),
            ConfirmTarget::Selected(count) => format!(
                "This will permanently delete {} file(s) under {}.",
                count,
                root.display()
            ),
        }
    }
}

/// Ask on stderr so a `--json` report on stdout stays parseable.
fn confirm(target: &ConfirmTarget, root: &Path) -> bool {
    eprintln!("{}", Theme::warning(&target.warning(root)));
    eprint!("Are you sure you want to continue? [y/N]: ");
    let input = match read_line_from_stdin() {
        Ok(line) => line.trim().to_lowercase(),
        Err(_) => {
            eprintln!("\nDeletion cancelled (failed to read input).");
            return false;
        }
    };
    if input != "y" && input != "yes" {
        eprintln!("Deletion cancelled.");
        return false;
    }
    true
}
