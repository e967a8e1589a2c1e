//! Report rendering.
//!
//! This module owns everything written to stdout: the human scan and deletion
//! reports (Unicode box tables) and their JSON counterparts.

use crate::cleaner::{BatchDeleteResult, DeletionOutcome};
use crate::grouping::{OrphanGroup, OrphanSummary};
use crate::pagination::Page;
use crate::scanner::{display_path, OrphanFile, ScanOutcome};
use crate::stamp::ScanStamp;
use crate::theme::Theme;
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::time::Duration;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const JSON_VERSION: &str = "1.0";

/// Output verbosity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Quiet,       // Only errors
    Normal,      // Standard output
    Verbose,     // Group members listed
    VeryVerbose, // Absolute paths too
}

impl OutputMode {
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        if quiet {
            return OutputMode::Quiet;
        }
        match verbose {
            0 => OutputMode::Normal,
            1 => OutputMode::Verbose,
            _ => OutputMode::VeryVerbose,
        }
    }

    fn is_verbose(self) -> bool {
        matches!(self, OutputMode::Verbose | OutputMode::VeryVerbose)
    }
}

/// Everything the scan report shows
pub struct ScanReport<'a> {
    pub outcome: &'a ScanOutcome,
    pub known_ids: usize,
    pub summary: OrphanSummary,
    pub page: Page<'a, OrphanGroup>,
    pub stamp: &'a ScanStamp,
    pub elapsed: Duration,
    /// Active listing filter; the page then covers matching groups only
    pub filter: Option<&'a str>,
    /// Ready-to-run follow-up commands carrying this listing's flags
    pub hints: CommandHints,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandHints {
    pub next_page: Option<String>,
    pub delete_all: String,
}

/// Truncate a string to a maximum display width (adds ellipsis if needed).
fn truncate_to_width(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }

    let ellipsis = "…";
    let ellipsis_w = UnicodeWidthStr::width(ellipsis);
    let target = max_width.saturating_sub(ellipsis_w);

    let mut out = String::new();
    let mut w = 0usize;
    for ch in s.chars() {
        let cw = UnicodeWidthChar::width(ch).unwrap_or(0);
        if w + cw > target {
            break;
        }
        out.push(ch);
        w += cw;
    }
    out.push_str(ellipsis);
    out
}

/// Pad/truncate content to a specific display width (Unicode-aware).
fn pad_right_to_width(s: &str, width: usize) -> String {
    let truncated = truncate_to_width(s, width);
    let w = UnicodeWidthStr::width(truncated.as_str());
    format!("{}{}", truncated, " ".repeat(width.saturating_sub(w)))
}

/// Print a table row with borders and 1-space cell padding.
///
/// Cells are padded before styling so escape codes never count toward width.
fn print_table_row(cols: &[(String, usize)], style: fn(&str) -> String) {
    let mut row = String::from("│");
    for (content, width) in cols {
        row.push(' ');
        row.push_str(&style(&pad_right_to_width(content, *width)));
        row.push(' ');
        row.push('│');
    }
    println!("{}", row);
}

/// Print a horizontal separator line (Unicode box drawing).
/// Widths are content widths (excluding the 1-space left/right padding).
fn print_table_separator(widths: &[usize], left: &str, mid: &str, right: &str) {
    let mut sep = left.to_string();
    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            sep.push_str(mid);
        }
        sep.push_str(&"─".repeat(width + 2));
    }
    sep.push_str(right);
    println!("{}", sep);
}

fn plain(text: &str) -> String {
    text.to_string()
}

/// Local `dd/mm/YYYY HH:MM`, or `-` when the time is unknown (the epoch).
pub fn format_modified(time: DateTime<Utc>) -> String {
    if time.timestamp() == 0 {
        return "-".to_string();
    }
    time.with_timezone(&Local).format("%d/%m/%Y %H:%M").to_string()
}

fn human_size(bytes: u64) -> String {
    bytesize::to_string(bytes, false)
}

fn print_summary_line(label: &str, value: &str) {
    println!("  {:<16}{}", label, value);
}

pub fn print_scan_human(report: &ScanReport<'_>, mode: OutputMode) {
    if mode == OutputMode::Quiet {
        return;
    }

    println!();
    println!("{}", Theme::header("Orphan Images"));
    println!("{}", Theme::divider_bold(60));
    print_summary_line("Root:", &report.outcome.root.display().to_string());
    print_summary_line("Known ids:", &Theme::value(&report.known_ids.to_string()));
    print_summary_line("Orphan groups:", &Theme::value(&report.summary.groups.to_string()));
    print_summary_line("Orphan files:", &Theme::value(&report.summary.files.to_string()));
    print_summary_line("Total size:", &Theme::size(&human_size(report.summary.total_size_bytes)));
    print_summary_line("Scan time:", &format!("{:.2}s", report.elapsed.as_secs_f64()));
    print_summary_line("Scan stamp:", &Theme::muted(report.stamp.as_str()));
    if let Some(filter) = report.filter {
        print_summary_line("Filter:", &Theme::value(filter));
        print_summary_line("Matching groups:", &Theme::value(&report.page.total_items.to_string()));
    }
    if mode.is_verbose() {
        print_summary_line("Known skipped:", &report.outcome.known_skipped.to_string());
        print_summary_line("Ignored:", &report.outcome.ignored.to_string());
        print_summary_line("Unreadable:", &report.outcome.unreadable.to_string());
    }
    println!();

    if report.summary.groups == 0 {
        println!("{}", Theme::success("No orphan images found."));
        println!();
        return;
    }

    if report.page.total_items == 0 {
        println!("{}", Theme::warning("No orphan groups match the filter."));
        println!();
        return;
    }

    let col_widths = [10, 9, 10, 16, 44];
    print_table_separator(&col_widths, "┌", "┬", "┐");
    print_table_row(
        &[
            ("ID".to_string(), col_widths[0]),
            ("Files".to_string(), col_widths[1]),
            ("Size".to_string(), col_widths[2]),
            ("Modified".to_string(), col_widths[3]),
            ("Thumbnail".to_string(), col_widths[4]),
        ],
        Theme::primary,
    );
    print_table_separator(&col_widths, "├", "┼", "┤");

    for group in report.page.items {
        print_table_row(
            &[
                (group.image_id().to_string(), col_widths[0]),
                (group.file_count().to_string(), col_widths[1]),
                (human_size(group.total_size_bytes()), col_widths[2]),
                (format_modified(group.latest_modified()), col_widths[3]),
                (display_path(&group.thumbnail().relative_path), col_widths[4]),
            ],
            plain,
        );

        if mode.is_verbose() {
            for (idx, file) in group.files().iter().enumerate() {
                let smallest = idx == 0 && group.file_count() > 1;
                print_table_row(
                    &[
                        ("  └─".to_string(), col_widths[0]),
                        (file.format.clone(), col_widths[1]),
                        (human_size(file.size_bytes), col_widths[2]),
                        (format_modified(file.modified), col_widths[3]),
                        (member_label(file, smallest, mode), col_widths[4]),
                    ],
                    Theme::muted,
                );
            }
        }
    }
    print_table_separator(&col_widths, "└", "┴", "┘");

    let page = &report.page;
    print!("Page {} of {}", page.page, page.total_pages);
    if let Some(next) = report.hints.next_page.as_deref().filter(|_| page.has_next()) {
        print!("  {}", Theme::muted(&format!("(next: {})", next)));
    }
    println!();
    println!();
    let scope = if report.filter.is_some() {
        "every orphan found by this scan, filtered or not"
    } else {
        "every orphan listed by this scan"
    };
    println!("Run {} to remove {}.", Theme::command(&report.hints.delete_all), scope);
    println!();
}

fn member_label(file: &OrphanFile, smallest: bool, mode: OutputMode) -> String {
    let path = if mode == OutputMode::VeryVerbose {
        file.absolute_path.display().to_string()
    } else {
        display_path(&file.relative_path)
    };
    if smallest {
        format!("{} (smallest)", path)
    } else {
        path
    }
}

#[derive(Serialize)]
struct JsonScanReport {
    version: String,
    timestamp: String,
    root: String,
    stamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<String>,
    summary: JsonScanSummary,
    page: JsonPage,
    groups: Vec<JsonGroup>,
}

#[derive(Serialize)]
struct JsonScanSummary {
    known_ids: usize,
    groups: usize,
    files: usize,
    total_bytes: u64,
    total_human: String,
    known_skipped: usize,
    ignored: usize,
    unreadable: usize,
    duration_ms: u128,
}

#[derive(Serialize)]
struct JsonPage {
    page: usize,
    total_pages: usize,
    per_page: usize,
    total_groups: usize,
}

#[derive(Serialize)]
struct JsonGroup {
    image_id: u64,
    file_count: usize,
    total_bytes: u64,
    total_human: String,
    latest_modified: String,
    thumbnail: String,
    files: Vec<JsonFile>,
}

#[derive(Serialize)]
struct JsonFile {
    relative_path: String,
    filename: String,
    format: String,
    size_bytes: u64,
    modified: String,
}

fn build_scan_json(report: &ScanReport<'_>) -> JsonScanReport {
    JsonScanReport {
        version: JSON_VERSION.to_string(),
        timestamp: Utc::now().to_rfc3339(),
        root: report.outcome.root.display().to_string(),
        stamp: report.stamp.to_string(),
        filter: report.filter.map(str::to_string),
        summary: JsonScanSummary {
            known_ids: report.known_ids,
            groups: report.summary.groups,
            files: report.summary.files,
            total_bytes: report.summary.total_size_bytes,
            total_human: human_size(report.summary.total_size_bytes),
            known_skipped: report.outcome.known_skipped,
            ignored: report.outcome.ignored,
            unreadable: report.outcome.unreadable,
            duration_ms: report.elapsed.as_millis(),
        },
        page: JsonPage {
            page: report.page.page,
            total_pages: report.page.total_pages,
            per_page: report.page.per_page,
            total_groups: report.page.total_items,
        },
        groups: report
            .page
            .items
            .iter()
            .map(|group| JsonGroup {
                image_id: group.image_id().get(),
                file_count: group.file_count(),
                total_bytes: group.total_size_bytes(),
                total_human: human_size(group.total_size_bytes()),
                latest_modified: group.latest_modified().to_rfc3339(),
                thumbnail: display_path(&group.thumbnail().relative_path),
                files: group
                    .files()
                    .iter()
                    .map(|file| JsonFile {
                        relative_path: display_path(&file.relative_path),
                        filename: file.filename.clone(),
                        format: file.format.clone(),
                        size_bytes: file.size_bytes,
                        modified: file.modified.to_rfc3339(),
                    })
                    .collect(),
            })
            .collect(),
    }
}

pub fn print_scan_json(report: &ScanReport<'_>) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&build_scan_json(report))?);
    Ok(())
}

#[derive(Serialize)]
struct JsonDeleteReport<'a> {
    version: String,
    timestamp: String,
    dry_run: bool,
    succeeded: usize,
    failed: usize,
    freed_bytes: u64,
    freed_human: String,
    outcomes: &'a [DeletionOutcome],
}

fn build_delete_json(result: &BatchDeleteResult) -> JsonDeleteReport<'_> {
    JsonDeleteReport {
        version: JSON_VERSION.to_string(),
        timestamp: Utc::now().to_rfc3339(),
        dry_run: result.dry_run,
        succeeded: result.success_count,
        failed: result.error_count,
        freed_bytes: result.freed_bytes,
        freed_human: human_size(result.freed_bytes),
        outcomes: &result.outcomes,
    }
}

pub fn print_delete_json(result: &BatchDeleteResult) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&build_delete_json(result))?);
    Ok(())
}

pub fn print_delete_human(result: &BatchDeleteResult, mode: OutputMode) {
    if mode != OutputMode::Quiet {
        println!();
        let title = if result.dry_run {
            "Deletion Results (dry run)"
        } else {
            "Deletion Results"
        };
        println!("{}", Theme::header(title));
        println!("{}", Theme::divider_bold(60));

        let verb = if result.dry_run { "would be deleted" } else { "deleted" };
        println!(
            "{} {}",
            Theme::success(&format!("{} file(s) {}", result.success_count, verb)),
            Theme::muted(&format!("({})", human_size(result.freed_bytes)))
        );
        if result.error_count > 0 {
            println!("{}", Theme::error(&format!("{} error(s)", result.error_count)));
        }
    }

    // Failures are shown even in quiet mode
    for outcome in result.failures() {
        let reason = outcome
            .reason
            .map(|r| r.describe())
            .unwrap_or("unknown error");
        println!("  {} — {}", display_path(&outcome.requested_path), Theme::warning(reason));
    }

    if mode.is_verbose() {
        for outcome in result.successes() {
            println!(
                "  {} {} {}",
                Theme::success("✓"),
                display_path(&outcome.requested_path),
                Theme::muted(&format!("({})", human_size(outcome.size_bytes)))
            );
            for dir in &outcome.pruned_dirs {
                println!("    {} {}", Theme::muted("removed empty directory"), dir.display());
            }
        }
    }

    if mode != OutputMode::Quiet {
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::FailureReason;
    use crate::grouping::group_orphans;
    use crate::pagination::paginate;
    use crate::scanner::ImageId;
    use chrono::TimeZone;
    use std::path::{Path, PathBuf};

    fn orphan(rel: &str, id: u64, format: &str, size: u64) -> OrphanFile {
        OrphanFile {
            absolute_path: PathBuf::from("/img/p").join(rel),
            relative_path: PathBuf::from(rel),
            filename: rel.rsplit('/').next().unwrap().to_string(),
            image_id: ImageId::new(id).unwrap(),
            format: format.to_string(),
            size_bytes: size,
            modified: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_output_mode_from_flags() {
        assert_eq!(OutputMode::from_flags(0, false), OutputMode::Normal);
        assert_eq!(OutputMode::from_flags(1, false), OutputMode::Verbose);
        assert_eq!(OutputMode::from_flags(3, false), OutputMode::VeryVerbose);
        assert_eq!(OutputMode::from_flags(2, true), OutputMode::Quiet);
    }

    #[test]
    fn test_truncate_and_pad() {
        assert_eq!(truncate_to_width("abc", 5), "abc");
        assert_eq!(truncate_to_width("abcdef", 4), "abc…");
        assert_eq!(pad_right_to_width("ab", 4), "ab  ");
        assert_eq!(UnicodeWidthStr::width(pad_right_to_width("日本語のファイル", 6).as_str()), 6);
    }

    #[test]
    fn test_format_modified() {
        assert_eq!(format_modified(DateTime::<Utc>::UNIX_EPOCH), "-");
        let shown = format_modified(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
        assert_eq!(shown.len(), "01/03/2024 12:00".len());
        assert!(shown.contains("/2024 "));
    }

    #[test]
    fn test_scan_json_shape() {
        let outcome = ScanOutcome {
            root: PathBuf::from("/img/p"),
            orphans: vec![
                orphan("3/3.jpg", 3, "original", 200),
                orphan("3/3-small.jpg", 3, "small", 50),
                orphan("9/9.png", 9, "original", 10),
            ],
            known_skipped: 4,
            ignored: 1,
            unreadable: 0,
        };
        let stamp = ScanStamp::compute(&outcome.orphans);
        let groups = group_orphans(outcome.orphans.clone());
        let report = ScanReport {
            outcome: &outcome,
            known_ids: 7,
            summary: OrphanSummary::from_groups(&groups),
            page: paginate(&groups, 10, 1),
            stamp: &stamp,
            elapsed: Duration::from_millis(12),
            filter: None,
            hints: CommandHints::default(),
        };

        let value = serde_json::to_value(build_scan_json(&report)).unwrap();
        assert_eq!(value["stamp"], stamp.as_str());
        assert!(value.get("filter").is_none());
        assert_eq!(value["summary"]["files"], 3);
        assert_eq!(value["summary"]["total_bytes"], 260);
        assert_eq!(value["page"]["total_pages"], 1);
        assert_eq!(value["groups"][0]["image_id"], 3);
        assert_eq!(value["groups"][0]["thumbnail"], "3/3-small.jpg");
        assert_eq!(value["groups"][0]["files"].as_array().unwrap().len(), 2);
        assert_eq!(value["groups"][1]["image_id"], 9);
    }

    #[test]
    fn test_delete_json_shape() {
        let result = BatchDeleteResult {
            success_count: 1,
            error_count: 1,
            freed_bytes: 42,
            dry_run: false,
            outcomes: vec![
                DeletionOutcome::deleted(Path::new("1/1.jpg"), 42, vec![PathBuf::from("/img/p/1")]),
                DeletionOutcome::failed(Path::new("../../etc/passwd"), FailureReason::InvalidPath),
            ],
        };

        let value = serde_json::to_value(build_delete_json(&result)).unwrap();
        assert_eq!(value["succeeded"], 1);
        assert_eq!(value["failed"], 1);
        assert_eq!(value["freed_bytes"], 42);
        assert_eq!(value["outcomes"][0]["requested_path"], "1/1.jpg");
        assert!(value["outcomes"][0].get("reason").is_none());
        assert_eq!(value["outcomes"][1]["reason"], "invalid_path");
    }
}
