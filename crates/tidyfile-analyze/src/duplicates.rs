//! Duplicate file detection using content hashing.
//!
//! Files are visited in enumeration order. The first file seen with a given
//! fingerprint becomes the group's original; every later file with the same
//! fingerprint is reported as a `(duplicate, original)` pair.
//!
//! With `quick_compare` enabled (the default), files whose size is unique in
//! the input are never hashed, since they cannot have a byte-identical twin.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry as DashEntry;
use derive_builder::Builder;
use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use tidyfile_core::{ContentFingerprint, FileDescriptor, ScanConfig, ScanError};
use tidyfile_scan::FileScanner;

use crate::hasher::hash_file;

/// Configuration for duplicate detection.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct DuplicateConfig {
    /// Minimum file size to consider.
    #[builder(default = "0")]
    pub min_size: u64,

    /// Maximum file size to consider.
    #[builder(default = "u64::MAX")]
    pub max_size: u64,

    /// Skip hashing files whose size no other file shares.
    #[builder(default = "true")]
    pub quick_compare: bool,

    /// Glob patterns (matched against file name and full path) to exclude.
    #[builder(default)]
    pub exclude_patterns: Vec<String>,
}

impl DuplicateConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(patterns) = &self.exclude_patterns {
            for pattern in patterns {
                Glob::new(pattern).map_err(|e| format!("invalid pattern {pattern:?}: {e}"))?;
            }
        }
        if let (Some(min), Some(max)) = (self.min_size, self.max_size) {
            if min > max {
                return Err(format!("min_size {min} exceeds max_size {max}"));
            }
        }
        Ok(())
    }
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            min_size: 0,
            max_size: u64::MAX,
            quick_compare: true,
            exclude_patterns: Vec::new(),
        }
    }
}

impl DuplicateConfig {
    /// Create a new config builder.
    pub fn builder() -> DuplicateConfigBuilder {
        DuplicateConfigBuilder::default()
    }
}

/// A file whose fingerprint matches an earlier file's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicatePair {
    /// The later file.
    pub duplicate: PathBuf,
    /// The first file seen with this fingerprint.
    pub original: PathBuf,
}

impl DuplicatePair {
    /// The pair as `(duplicate, original)`.
    pub fn as_tuple(&self) -> (&Path, &Path) {
        (&self.duplicate, &self.original)
    }
}

/// A group of files sharing the same content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Fingerprint shared by all files in this group.
    pub fingerprint: ContentFingerprint,

    /// Size of each file in bytes.
    pub size: u64,

    /// Paths in enumeration order; the first is the original.
    pub paths: Vec<PathBuf>,

    /// Wasted space: size * (count - 1).
    pub wasted_bytes: u64,
}

impl DuplicateGroup {
    /// Get the number of files in the group.
    pub fn count(&self) -> usize {
        self.paths.len()
    }

    /// Check if keeping one file, how many could be deleted.
    pub fn deletable_count(&self) -> usize {
        self.paths.len().saturating_sub(1)
    }

    /// The first-seen path.
    pub fn original(&self) -> Option<&Path> {
        self.paths.first().map(PathBuf::as_path)
    }
}

/// A file that could not be hashed and was left out of comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Results from duplicate analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DuplicateReport {
    /// `(duplicate, original)` pairs in enumeration order.
    pub pairs: Vec<DuplicatePair>,

    /// Groups of duplicate files, sorted by wasted space descending.
    pub groups: Vec<DuplicateGroup>,

    /// Number of files considered after filtering.
    pub files_analyzed: u64,

    /// Number of files actually hashed.
    pub files_hashed: u64,

    /// Files skipped because hashing failed.
    pub hash_failures: Vec<HashFailure>,

    /// Total wasted space (could be reclaimed).
    pub total_wasted_space: u64,
}

impl DuplicateReport {
    /// Check if any duplicates were found.
    pub fn has_duplicates(&self) -> bool {
        !self.pairs.is_empty()
    }

    /// Number of duplicate groups.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Get total number of files across all groups, originals included.
    pub fn total_duplicate_files(&self) -> usize {
        self.groups.iter().map(|g| g.paths.len()).sum()
    }
}

/// Duplicate file finder.
pub struct DuplicateFinder {
    config: DuplicateConfig,
    excludes: GlobSet,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with default config.
    pub fn new() -> Self {
        Self::with_config(DuplicateConfig::default())
    }

    /// Create a new duplicate finder with custom config.
    pub fn with_config(config: DuplicateConfig) -> Self {
        let excludes = build_excludes(&config.exclude_patterns);
        Self { config, excludes }
    }

    /// Scan `root` and find duplicates among every file beneath it.
    pub fn find_duplicates_in(&self, root: &Path) -> Result<DuplicateReport, ScanError> {
        let outcome = FileScanner::new().scan(&ScanConfig::new(root))?;
        Ok(self.find_duplicates(&outcome.files))
    }

    /// Find duplicates among already-enumerated files.
    ///
    /// Pair order follows the order of `files`. Files that fail to hash are
    /// recorded in [`DuplicateReport::hash_failures`] and otherwise ignored.
    pub fn find_duplicates(&self, files: &[FileDescriptor]) -> DuplicateReport {
        let candidates = self.candidates(files);
        let files_analyzed = candidates.len() as u64;

        let mut first_seen: HashMap<ContentFingerprint, usize> = HashMap::new();
        let mut groups: Vec<DuplicateGroup> = Vec::new();
        let mut pairs = Vec::new();
        let mut hash_failures = Vec::new();
        let mut files_hashed = 0u64;

        for file in candidates {
            let fingerprint = match hash_file(&file.path) {
                Ok(fp) => fp,
                Err(err) => {
                    warn!(path = %file.path.display(), error = %err, "hash failed, skipping");
                    hash_failures.push(HashFailure {
                        path: file.path.clone(),
                        message: err.to_string(),
                    });
                    continue;
                }
            };
            files_hashed += 1;

            match first_seen.entry(fingerprint) {
                Entry::Occupied(slot) => {
                    let group = &mut groups[*slot.get()];
                    pairs.push(DuplicatePair {
                        duplicate: file.path.clone(),
                        original: group.paths[0].clone(),
                    });
                    group.paths.push(file.path.clone());
                }
                Entry::Vacant(slot) => {
                    slot.insert(groups.len());
                    groups.push(DuplicateGroup {
                        fingerprint,
                        size: file.size,
                        paths: vec![file.path.clone()],
                        wasted_bytes: 0,
                    });
                }
            }
        }

        groups.retain(|g| g.paths.len() >= 2);
        for group in &mut groups {
            group.wasted_bytes = group.size * group.deletable_count() as u64;
        }
        groups.sort_by(|a, b| b.wasted_bytes.cmp(&a.wasted_bytes));

        let total_wasted_space = groups.iter().map(|g| g.wasted_bytes).sum();

        debug!(
            analyzed = files_analyzed,
            hashed = files_hashed,
            pairs = pairs.len(),
            "duplicate search complete"
        );

        DuplicateReport {
            pairs,
            groups,
            files_analyzed,
            files_hashed,
            hash_failures,
            total_wasted_space,
        }
    }

    /// Find duplicate pairs hashing files in parallel.
    ///
    /// Every file that [`find_duplicates`](Self::find_duplicates) would report
    /// as a duplicate is reported here too, but which member of a group counts
    /// as the original depends on scheduling, and output order is unspecified.
    pub fn find_pairs_parallel(&self, files: &[FileDescriptor]) -> Vec<DuplicatePair> {
        let candidates = self.candidates(files);
        let first_seen: DashMap<ContentFingerprint, PathBuf> = DashMap::new();

        candidates
            .par_iter()
            .filter_map(|file| {
                let fingerprint = match hash_file(&file.path) {
                    Ok(fp) => fp,
                    Err(err) => {
                        warn!(path = %file.path.display(), error = %err, "hash failed, skipping");
                        return None;
                    }
                };
                // The entry guard holds the shard lock, so insert-or-read is exclusive per key
                match first_seen.entry(fingerprint) {
                    DashEntry::Occupied(slot) => Some(DuplicatePair {
                        duplicate: file.path.clone(),
                        original: slot.get().clone(),
                    }),
                    DashEntry::Vacant(slot) => {
                        slot.insert(file.path.clone());
                        None
                    }
                }
            })
            .collect()
    }

    /// Apply size and exclusion filters, then the size pre-pass.
    fn candidates<'a>(&self, files: &'a [FileDescriptor]) -> Vec<&'a FileDescriptor> {
        let filtered: Vec<&FileDescriptor> = files
            .iter()
            .filter(|f| f.size >= self.config.min_size && f.size <= self.config.max_size)
            .filter(|f| !self.is_excluded(f))
            .collect();

        if !self.config.quick_compare {
            return filtered;
        }

        let mut size_counts: HashMap<u64, usize> = HashMap::new();
        for file in &filtered {
            *size_counts.entry(file.size).or_default() += 1;
        }
        filtered
            .into_iter()
            .filter(|f| size_counts.get(&f.size).copied().unwrap_or(0) > 1)
            .collect()
    }

    fn is_excluded(&self, file: &FileDescriptor) -> bool {
        !self.excludes.is_empty()
            && (self.excludes.is_match(file.name.as_str()) || self.excludes.is_match(&file.path))
    }
}

impl Default for DuplicateFinder {
    fn default() -> Self {
        Self::new()
    }
}

fn build_excludes(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(err) => warn!(pattern = %pattern, error = %err, "ignoring invalid exclude pattern"),
        }
    }
    builder.build().unwrap_or_else(|err| {
        warn!(error = %err, "exclude patterns disabled");
        GlobSet::empty()
    })
}
