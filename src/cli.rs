use clap::{ArgAction, Args, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

mod commands;

use crate::logging;
use crate::output::OutputMode;
use commands::config_command::{self, ConfigAction};
use commands::{delete_command, scan_command};

/// Read one line from a fresh stdin handle, flushing any pending prompt first.
/// Prompts go to stderr so stdout stays clean for `--json`.
pub(crate) fn read_line_from_stdin() -> io::Result<String> {
    io::stderr().flush()?;
    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(input)
}

#[derive(Parser)]
#[command(name = "imgprune")]
#[command(version)]
#[command(about = "Find and delete product images no catalog entry refers to")]
#[command(
    long_about = "imgprune walks an image directory, matches every image filename against the \
    identifiers known to a catalog, and lists or deletes the images nothing refers to.\n\n\
    Examples:\n  \
    imgprune scan --root img/p --catalog-db shop.db        # List orphans, 50 groups per page\n  \
    imgprune scan --root img/p --ids-file ids.txt --json   # Machine-readable listing\n  \
    imgprune scan --root img/p --filter '*_default*'      # Only groups whose names match\n  \
    imgprune delete --root img/p 12/12.jpg 12/12-small.jpg # Delete selected files\n  \
    imgprune delete --all --expect-stamp 3f9a0c1d2e4b5a69  # Delete what the last scan showed"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase output verbosity (-v, -vv for more)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Where known identifiers come from; overrides the config file
#[derive(Args, Debug, Clone, Default)]
pub struct CatalogArgs {
    /// Plain-text file of known identifiers (whitespace or comma separated)
    #[arg(long, value_name = "FILE", conflicts_with = "catalog_db")]
    pub ids_file: Option<PathBuf>,

    /// SQLite catalog database
    #[arg(long, value_name = "DB")]
    pub catalog_db: Option<PathBuf>,

    /// Query returning one identifier per row [default: SELECT id_image FROM ps_image]
    #[arg(long, value_name = "SQL")]
    pub catalog_query: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List orphaned images, grouped by identifier (read-only)
    #[command(visible_alias = "s")]
    Scan {
        /// Image directory to scan (default: [scan] root from config)
        #[arg(long, value_name = "DIR")]
        root: Option<PathBuf>,

        /// Page of groups to show, starting at 1
        #[arg(long, default_value = "1", value_name = "N")]
        page: usize,

        /// Groups per page, clamped to 10..=500 [default: 50]
        #[arg(long, value_name = "P")]
        per_page: Option<usize>,

        /// Only list groups whose id or file names contain this text (`*` is a wildcard)
        #[arg(long, value_name = "PATTERN")]
        filter: Option<String>,

        /// Output results as JSON for scripting
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        catalog: CatalogArgs,
    },

    /// Delete orphaned images (immediate and irreversible)
    #[command(visible_alias = "d")]
    Delete {
        /// Image directory the paths are relative to (default: [scan] root from config)
        #[arg(long, value_name = "DIR")]
        root: Option<PathBuf>,

        /// Delete every orphan found by a fresh scan
        #[arg(short = 'a', long, conflicts_with = "files")]
        all: bool,

        /// Paths relative to the root, as printed by `scan`
        #[arg(value_name = "FILE", required_unless_present = "all")]
        files: Vec<PathBuf>,

        /// Authorization token, required when [security] token is configured
        #[arg(long, value_name = "TOKEN", env = "IMGPRUNE_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Refuse to delete unless a fresh scan still matches this stamp
        #[arg(long, value_name = "STAMP")]
        expect_stamp: Option<String>,

        /// Check every path and report, without deleting anything
        #[arg(long)]
        dry_run: bool,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long = "yes")]
        yes: bool,

        /// Output results as JSON for scripting
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        catalog: CatalogArgs,
    },

    /// View or initialize the configuration file
    Config {
        /// Print the effective configuration
        #[arg(long, conflicts_with_all = ["path", "init"])]
        show: bool,

        /// Print the configuration file location
        #[arg(long, conflicts_with = "init")]
        path: bool,

        /// Write a default configuration file if none exists
        #[arg(long)]
        init: bool,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Run the parsed command. `Ok(false)` means the command finished but
    /// something it was asked to do failed (e.g. a file could not be deleted).
    pub fn run(self) -> anyhow::Result<bool> {
        logging::init(self.verbose, self.quiet);
        let output_mode = OutputMode::from_flags(self.verbose, self.quiet);

        match self.command {
            Commands::Scan {
                root,
                page,
                per_page,
                filter,
                json,
                catalog,
            } => {
                scan_command::handle_scan(
                    scan_command::ScanArgs {
                        root,
                        page,
                        per_page,
                        filter,
                        json,
                        catalog,
                    },
                    output_mode,
                )?;
                Ok(true)
            }
            Commands::Delete {
                root,
                all,
                files,
                token,
                expect_stamp,
                dry_run,
                yes,
                json,
                catalog,
            } => delete_command::handle_delete(
                delete_command::DeleteArgs {
                    root,
                    all,
                    files,
                    token,
                    expect_stamp,
                    dry_run,
                    yes,
                    json,
                    catalog,
                },
                output_mode,
            ),
            Commands::Config { show, path, init } => {
                config_command::handle_config(ConfigAction::from_flags(show, path, init))?;
                Ok(true)
            }
        }
    }
}
