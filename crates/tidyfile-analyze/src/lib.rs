//! Content analysis for tidyfile.
//!
//! This crate consumes the flat file lists produced by `tidyfile-scan`:
//!
//! - **Content hashing** - Stream a file through BLAKE3 in fixed-size chunks
//! - **Duplicate detection** - Pair each file with the first-seen file of the same content
//! - **Staleness filtering** - Keep files whose last access predates a retention window
//!
//! # Duplicate Detection
//!
//! ```rust,ignore
//! use tidyfile_analyze::DuplicateFinder;
//!
//! let report = DuplicateFinder::new().find_duplicates_in("/path/to/scan".as_ref())?;
//!
//! for pair in &report.pairs {
//!     println!("{} duplicates {}", pair.duplicate.display(), pair.original.display());
//! }
//! println!("Wasted space: {} bytes", report.total_wasted_space);
//! ```
//!
//! # Staleness
//!
//! ```rust,ignore
//! use tidyfile_analyze::{StalenessConfig, UnusedFinder, filter_by_extension};
//!
//! let finder = UnusedFinder::new(StalenessConfig::with_days(90));
//! let stale = finder.find_unused_in("/path/to/scan".as_ref())?;
//! let pdfs = filter_by_extension(&stale, ".pdf");
//! ```

mod duplicates;
mod hasher;
mod staleness;

pub use duplicates::{
    DuplicateConfig, DuplicateConfigBuilder, DuplicateFinder, DuplicateGroup, DuplicatePair,
    DuplicateReport, HashFailure,
};
pub use hasher::{HASH_CHUNK_SIZE, hash_bytes, hash_file, hash_reader};
pub use staleness::{
    StalenessConfig, StalenessConfigBuilder, UnusedFinder, filter_by_extension, format_age,
};

// Re-export core types
pub use tidyfile_core::{ContentFingerprint, FileDescriptor};
