//! Command-line interface module for dirsort.
//!
//! Parses the command line with clap, assembles the run configuration,
//! and renders the engine's structured outcomes: per-file lines as they
//! happen, a progress bar for the batch, and the final summary.

use crate::config::OrganizeConfig;
use crate::organizer::{
    BatchEvent, FileAction, FileReport, Organizer, PlannedOutcome, SkipReason,
};
use crate::output::OutputFormatter;
use clap::Parser;
use indicatif::ProgressBar;
use std::collections::HashMap;
use std::path::PathBuf;

/// Organize files into category subdirectories with an append-only audit log.
#[derive(Debug, Parser)]
#[command(name = "dirsort", version, about)]
#[command(
    after_help = "Hidden files (names starting with '.') are skipped by default; \
set `filters.skip_hidden = false` in the configuration file to include them."
)]
pub struct Cli {
    /// Directory to scan for files to organize (non-recursive).
    pub source: PathBuf,

    /// Directory where category subdirectories are created.
    pub destination: PathBuf,

    /// Audit log path; relative paths resolve under the destination root.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Configuration file (TOML); defaults to .dirsortrc.toml or
    /// ~/.config/dirsort/config.toml when present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Show what would be moved without touching anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Runs the CLI application.
///
/// Errors are rendered as strings at this boundary; the caller maps a
/// returned error to a nonzero exit status.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use dirsort::cli::{self, Cli};
///
/// let cli = Cli::parse_from(["dirsort", "/downloads", "/organized"]);
/// if let Err(e) = cli::run(cli) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run(cli: Cli) -> Result<(), String> {
    let mut config = OrganizeConfig::load(cli.config.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?;

    if let Some(log_file) = cli.log_file {
        config.paths.log_file = log_file;
    }

    let filters = config
        .compile_filters()
        .map_err(|e| format!("Error compiling filters: {}", e))?;
    let rules = config.category_rules();

    let organizer = Organizer::new(
        &cli.source,
        &cli.destination,
        &config.paths.log_file,
        rules,
        filters,
    )
    .map_err(|e| e.to_string())?;

    if cli.dry_run {
        preview(&organizer)
    } else {
        organize(&organizer)
    }
}

fn organize(organizer: &Organizer) -> Result<(), String> {
    OutputFormatter::info(&format!(
        "Scanning source directory: {}",
        organizer.source().display()
    ));
    OutputFormatter::info(&format!(
        "Organizing into destination: {}",
        organizer.destination().display()
    ));

    let mut bar: Option<ProgressBar> = None;
    let mut log_warnings: Vec<String> = Vec::new();

    let summary = organizer
        .run(|event| match event {
            BatchEvent::ScanComplete { total } => {
                bar = Some(OutputFormatter::create_progress_bar(total as u64));
            }
            BatchEvent::File(report) => {
                if let Some(pb) = &bar {
                    pb.println(render_report(report));
                    pb.inc(1);
                }
                // The move stands even when its audit row could not be written
                if let FileAction::Moved {
                    log_error: Some(e), ..
                } = &report.action
                {
                    log_warnings.push(format!(
                        "Moved '{}' but could not log it: {}",
                        report.file_name, e
                    ));
                }
            }
        })
        .map_err(|e| e.to_string())?;

    if let Some(pb) = bar {
        pb.finish_and_clear();
    }

    for warning in &log_warnings {
        OutputFormatter::warning(warning);
    }

    let log_path = if summary.moved > 0 {
        Some(organizer.log_path())
    } else {
        None
    };
    OutputFormatter::run_summary(summary.moved, summary.skipped, log_path);

    Ok(())
}

fn preview(organizer: &Organizer) -> Result<(), String> {
    OutputFormatter::dry_run_notice(&format!(
        "Analyzing contents of: {}",
        organizer.source().display()
    ));

    let planned = organizer.preview().map_err(|e| e.to_string())?;

    if planned.is_empty() {
        OutputFormatter::info("No files found to organize.");
        return Ok(());
    }

    let mut category_counts: HashMap<String, usize> = HashMap::new();
    for plan in &planned {
        match plan.outcome {
            PlannedOutcome::Move => {
                println!(" - {} → {}/", plan.file_name, plan.category);
                *category_counts.entry(plan.category.clone()).or_insert(0) += 1;
            }
            PlannedOutcome::SkipFiltered => {
                println!(" - {} (would skip: excluded by filter rules)", plan.file_name);
            }
            PlannedOutcome::SkipCollision => {
                println!(
                    " - {} (would skip: already exists in '{}')",
                    plan.file_name, plan.category
                );
            }
        }
    }

    OutputFormatter::category_table(&category_counts, planned.len());
    OutputFormatter::success("Dry run complete. No files were modified.");

    Ok(())
}

/// One line per processed file, matched to the outcome.
fn render_report(report: &FileReport) -> String {
    match &report.action {
        FileAction::Moved { record, .. } => {
            format!("✓ Moved '{}' → {}/", report.file_name, record.category)
        }
        FileAction::Skipped { reason } => match reason {
            SkipReason::Filtered | SkipReason::Collision { .. } => {
                format!("- Skipping '{}': {}", report.file_name, reason)
            }
            _ => format!("✗ Error on '{}': {}", report.file_name, reason),
        },
    }
}
