//! Directory enumeration and metadata reading for tidyfile.
//!
//! `tidyfile-scan` turns a directory tree into a flat, deterministically
//! ordered list of [`FileDescriptor`]s. Key features:
//!
//! - **Serial, name-sorted traversal** via jwalk, so repeated scans of an
//!   unchanged tree yield the same order
//! - **Subtree pruning** by directory name (used to skip organized output)
//! - **Race tolerance**: files removed mid-scan become warnings, not errors
//!
//! # Example
//!
//! ```rust,no_run
//! use tidyfile_scan::{FileScanner, ScanConfig};
//!
//! let config = ScanConfig::new("/path/to/scan");
//! let outcome = FileScanner::new().scan(&config).unwrap();
//!
//! println!("{} files, {} warnings", outcome.files.len(), outcome.warnings.len());
//! ```

mod metadata;
mod scanner;

pub use metadata::{read_all, read_metadata};
pub use scanner::{FileScanner, ScanOutcome};

// Re-export core types for convenience
pub use tidyfile_core::{
    FileDescriptor, FileError, ScanConfig, ScanConfigBuilder, ScanError, ScanWarning,
    WarningKind,
};
