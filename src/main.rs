//! tidyfile - sort, deduplicate, archive and prune directory trees.
//!
//! Usage:
//!   tidyfile organize [PATH]       Move files into per-extension folders
//!   tidyfile duplicates [PATH]     Find byte-identical files
//!   tidyfile unused [PATH]         List files not accessed recently
//!   tidyfile archive PATHS...      Copy or compress files or a folder
//!   tidyfile delete PATHS...       Delete files or a folder
//!   tidyfile --help                Show help

mod logging;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail};

use tidyfile_analyze::{
    DuplicateConfig, DuplicateFinder, StalenessConfig, UnusedFinder, filter_by_extension,
    format_age,
};
use tidyfile_core::ClassificationRules;
use tidyfile_ops::{
    ArchiveEncoding, ArchiveRequest, DEFAULT_FAILURE_REPORT_LIMIT, DeleteOptions,
    OperationResult, Organizer, delete_files, delete_folder,
};

#[derive(Parser)]
#[command(
    name = "tidyfile",
    version,
    about = "Sort, deduplicate, archive and prune directory trees",
    long_about = "tidyfile organizes files into folders by extension, finds duplicates by \
                  content, lists files that have not been accessed for a while, and \
                  archives or deletes what you select."
)]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Move files into per-extension folders under PATH
    Organize {
        /// Directory to organize
        #[arg(default_value = ".")]
        path: PathBuf,

        /// TOML file with a [rules] table mapping extensions to folder names
        #[arg(short, long)]
        rules: Option<PathBuf>,
    },

    /// Find duplicate files
    Duplicates {
        /// Path to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Minimum file size to consider (e.g., "1KB", "1MB")
        #[arg(short, long, default_value = "0")]
        min_size: String,

        /// Glob patterns to exclude (repeatable)
        #[arg(short, long)]
        exclude: Vec<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List files not accessed within the retention window
    Unused {
        /// Path to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Retention window in days
        #[arg(short, long, default_value = "90", value_parser = clap::value_parser!(u64).range(1..))]
        days: u64,

        /// Only show this extension (e.g. ".pdf"); "all" shows everything
        #[arg(long, default_value = "all")]
        ext: String,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Copy files (or one folder) with a timestamp, or pack them into an archive
    Archive {
        /// Files to archive, or a single folder with --folder
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Treat the single path as a folder
        #[arg(long)]
        folder: bool,

        /// none, zip or tar.gz
        #[arg(short, long, default_value = "none")]
        encoding: String,

        /// Destination directory (copies) or archive file (zip, tar.gz)
        #[arg(short, long)]
        dest: Option<PathBuf>,
    },

    /// Delete files, or one folder with --folder
    Delete {
        /// Files to delete, or a single folder with --folder
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Remove the single path as a whole folder
        #[arg(long)]
        folder: bool,

        /// Move to the trash instead of deleting permanently
        #[arg(long)]
        trash: bool,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    match cli.command {
        Command::Organize { path, rules } => run_organize(&path, rules.as_deref()),
        Command::Duplicates {
            path,
            min_size,
            exclude,
            format,
        } => run_duplicates(&path, &min_size, exclude, format),
        Command::Unused {
            path,
            days,
            ext,
            format,
        } => run_unused(&path, days, &ext, format),
        Command::Archive {
            paths,
            folder,
            encoding,
            dest,
        } => run_archive(paths, folder, &encoding, dest),
        Command::Delete {
            paths,
            folder,
            trash,
            yes,
        } => run_delete(paths, folder, trash, yes),
    }
}

/// Organize a directory into per-extension folders.
fn run_organize(path: &Path, rules_path: Option<&Path>) -> Result<()> {
    ensure_dir(path)?;
    let rules = match rules_path {
        Some(file) => ClassificationRules::load(file)
            .wrap_err_with(|| format!("Failed to load rules from {}", file.display()))?,
        None => ClassificationRules::default(),
    };

    eprintln!("Organizing {}...", path.display());
    let report = Organizer::new(rules)
        .organize(path)
        .wrap_err("Organize failed")?;

    if report.moved.is_empty() {
        println!(" No files to organize.");
    } else {
        for (ext, count) in &report.moved {
            println!("   {:<8} {:>6} files", ext, count);
        }
    }
    print_result(&report.result);
    Ok(())
}

/// Run duplicate detection.
fn run_duplicates(
    path: &Path,
    min_size: &str,
    exclude: Vec<String>,
    format: OutputFormat,
) -> Result<()> {
    ensure_dir(path)?;
    let min_bytes = parse_size(min_size)?;

    let dup_config = DuplicateConfig::builder()
        .min_size(min_bytes)
        .exclude_patterns(exclude)
        .build()
        .wrap_err("Invalid duplicate options")?;

    eprintln!("Finding duplicates in {}...", path.display());
    let report = DuplicateFinder::with_config(dup_config)
        .find_duplicates_in(path)
        .wrap_err("Scan failed")?;

    match format {
        OutputFormat::Text => {
            println!();
            println!("{}", "─".repeat(70));
            println!(" Duplicate File Report");
            println!("{}", "─".repeat(70));
            println!();

            if report.pairs.is_empty() {
                println!(" No duplicate files found.");
            } else {
                println!(
                    " {} duplicates in {} groups, {} wasted",
                    report.pairs.len(),
                    report.group_count(),
                    format_size(report.total_wasted_space)
                );
                println!();
                for pair in &report.pairs {
                    println!("   {}", pair.duplicate.display());
                    println!("     = {}", pair.original.display());
                }
            }
            if !report.hash_failures.is_empty() {
                println!();
                println!(" {} file(s) could not be read", report.hash_failures.len());
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

/// List files not accessed within `days`.
fn run_unused(path: &Path, days: u64, ext: &str, format: OutputFormat) -> Result<()> {
    ensure_dir(path)?;

    eprintln!("Looking for files unused for {days} days in {}...", path.display());
    let now = SystemTime::now();
    let config = StalenessConfig::builder()
        .retention_days(days)
        .reference_time(now)
        .build()
        .wrap_err("Invalid staleness options")?;
    let stale = UnusedFinder::new(config)
        .find_unused_in(path)
        .wrap_err("Scan failed")?;
    let shown = filter_by_extension(&stale, ext);

    match format {
        OutputFormat::Text => {
            if shown.is_empty() {
                println!(" No unused files found.");
                return Ok(());
            }
            for file in &shown {
                let accessed: DateTime<Local> = file.accessed.into();
                println!(
                    "   {:<50} {:>10}  {}  ({} ago)",
                    truncate(&file.path.display().to_string(), 50),
                    format_size(file.size),
                    accessed.format("%Y-%m-%d %H:%M"),
                    format_age(file.access_age(now))
                );
            }
            println!();
            println!(
                " {} files, {} total",
                shown.len(),
                format_size(shown.iter().map(|f| f.size).sum())
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&shown)?);
        }
    }

    Ok(())
}

/// Archive files or a folder.
fn run_archive(
    paths: Vec<PathBuf>,
    folder: bool,
    encoding: &str,
    dest: Option<PathBuf>,
) -> Result<()> {
    let encoding = ArchiveEncoding::parse(encoding)?;
    if folder && paths.len() != 1 {
        bail!("--folder takes exactly one path");
    }

    let mut request = if folder {
        ArchiveRequest::folder(paths.into_iter().next().unwrap_or_default())
    } else {
        ArchiveRequest::files(paths)
    }
    .with_encoding(encoding);
    if let Some(dest) = dest {
        request = request.with_destination(dest);
    }

    let result = request.execute().wrap_err("Archive failed")?;
    for output in &result.outputs {
        println!("   {}", output.display());
    }
    print_result(&result);
    Ok(())
}

/// Delete files or a folder.
fn run_delete(paths: Vec<PathBuf>, folder: bool, trash: bool, yes: bool) -> Result<()> {
    let options = DeleteOptions { use_trash: trash };

    if folder {
        let [path] = paths.as_slice() else {
            bail!("--folder takes exactly one path");
        };
        if !yes && !confirm(&format!("Delete folder {} and everything in it?", path.display()))? {
            eprintln!("Cancelled.");
            return Ok(());
        }
        delete_folder(path, options)
            .wrap_err_with(|| format!("Failed to delete {}", path.display()))?;
        println!(" Deleted {}", path.display());
        return Ok(());
    }

    if !yes && !confirm(&format!("Delete {} file(s)?", paths.len()))? {
        eprintln!("Cancelled.");
        return Ok(());
    }
    let result = delete_files(&paths, options);
    print_result(&result);
    Ok(())
}

/// Print the summary and the first few failures of a batch.
fn print_result(result: &OperationResult) {
    println!();
    println!(" {}", result.summary());
    let report = result.failure_report(DEFAULT_FAILURE_REPORT_LIMIT);
    if !report.is_empty() {
        println!();
        print!("{report}");
    }
}

fn ensure_dir(path: &Path) -> Result<()> {
    let metadata = std::fs::metadata(path)
        .wrap_err_with(|| format!("Invalid path: {}", path.display()))?;
    if !metadata.is_dir() {
        bail!("{} is not a directory", path.display());
    }
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    eprint!("{question} [y/N] ");
    io::stderr().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes" | "YES"))
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Truncate a string to max length.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 1).collect();
        format!("{head}…")
    }
}

/// Parse a size string (e.g., "1KB", "10MB", "1GB").
fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_uppercase();
    let digits = s.trim_end_matches(|c: char| !c.is_ascii_digit() && c != '.');
    let unit = &s[digits.len()..];

    let multiplier: u64 = match unit {
        "" | "B" => 1,
        "K" | "KB" => 1024,
        "M" | "MB" => 1024 * 1024,
        "G" | "GB" => 1024 * 1024 * 1024,
        other => bail!("Unknown size unit: {other}"),
    };
    let num: f64 = digits
        .parse()
        .wrap_err_with(|| format!("Invalid size: {s}"))?;

    Ok((num * multiplier as f64) as u64)
}
