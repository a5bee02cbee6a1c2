//! Access-time based staleness filtering.
//!
//! A file is stale when its last-access time is strictly earlier than
//! `reference_time - retention_days`. The result preserves enumeration order
//! and does not depend on the chunk size used to process it.

use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use derive_builder::Builder;
use rayon::prelude::*;
use tracing::debug;

use tidyfile_core::{FileDescriptor, ScanConfig, ScanError, normalize_extension};
use tidyfile_scan::FileScanner;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Configuration for the staleness filter.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct StalenessConfig {
    /// Files not accessed for this many days are stale.
    #[builder(default = "90")]
    pub retention_days: u64,

    /// Reference time for age calculations (default: now).
    #[builder(default = "SystemTime::now()")]
    pub reference_time: SystemTime,

    /// Number of descriptors processed per unit of work.
    #[builder(default = "100")]
    pub chunk_size: usize,
}

impl StalenessConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.chunk_size == Some(0) {
            return Err("chunk_size must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl Default for StalenessConfig {
    fn default() -> Self {
        Self {
            retention_days: 90,
            reference_time: SystemTime::now(),
            chunk_size: 100,
        }
    }
}

impl StalenessConfig {
    /// Create a new config builder.
    pub fn builder() -> StalenessConfigBuilder {
        StalenessConfigBuilder::default()
    }

    /// Config with the given retention, measured from now.
    pub fn with_days(retention_days: u64) -> Self {
        Self {
            retention_days,
            ..Self::default()
        }
    }

    /// Access times strictly before this instant are stale.
    pub fn cutoff(&self) -> SystemTime {
        let window = Duration::from_secs(self.retention_days.saturating_mul(SECS_PER_DAY));
        self.reference_time
            .checked_sub(window)
            .unwrap_or(UNIX_EPOCH)
    }
}

/// Finds files whose last access predates the retention window.
#[derive(Debug, Default)]
pub struct UnusedFinder {
    config: StalenessConfig,
}

impl UnusedFinder {
    /// Create a finder with the given config.
    pub fn new(config: StalenessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StalenessConfig {
        &self.config
    }

    /// Scan `root` once and return its stale files.
    pub fn find_unused_in(&self, root: &Path) -> Result<Vec<FileDescriptor>, ScanError> {
        let outcome = FileScanner::new().scan(&ScanConfig::new(root))?;
        Ok(self.find_unused(&outcome.files))
    }

    /// Keep the descriptors accessed before the cutoff, in input order.
    pub fn find_unused(&self, files: &[FileDescriptor]) -> Vec<FileDescriptor> {
        let cutoff = self.config.cutoff();

        let stale: Vec<FileDescriptor> = files
            .par_chunks(self.config.chunk_size.max(1))
            .map(|chunk| {
                chunk
                    .iter()
                    .filter(|f| f.accessed_before(cutoff))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .flatten()
            .collect();

        debug!(
            examined = files.len(),
            stale = stale.len(),
            retention_days = self.config.retention_days,
            "staleness filter complete"
        );

        stale
    }
}

/// Narrow an already-computed result by extension without touching the disk.
///
/// `"all"` or an empty string keeps everything. Matching ignores case and a
/// missing leading dot.
pub fn filter_by_extension<'a>(
    files: &'a [FileDescriptor],
    extension: &str,
) -> Vec<&'a FileDescriptor> {
    let wanted = extension.trim();
    if wanted.is_empty() || wanted.eq_ignore_ascii_case("all") {
        return files.iter().collect();
    }
    let wanted = normalize_extension(wanted);
    files.iter().filter(|f| f.extension == wanted).collect()
}

/// Format a duration as a human-readable age string.
pub fn format_age(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs} seconds")
    } else if secs < 3600 {
        format!("{} minutes", secs / 60)
    } else if secs < SECS_PER_DAY {
        format!("{} hours", secs / 3600)
    } else if secs < 30 * SECS_PER_DAY {
        format!("{} days", secs / SECS_PER_DAY)
    } else if secs < 365 * SECS_PER_DAY {
        format!("{} months", secs / (30 * SECS_PER_DAY))
    } else {
        format!("{:.1} years", secs as f64 / (365 * SECS_PER_DAY) as f64)
    }
}
