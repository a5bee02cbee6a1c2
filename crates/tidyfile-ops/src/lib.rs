//! File operations for tidyfile.
//!
//! Every operation is a blocking call that returns a complete result:
//!
//! - **Organize** - move files into `<ext>_only`-style folders by extension
//! - **Archive** - timestamped copies of files or folders
//! - **Compress** - zip or tar.gz containers of files or folders
//! - **Delete** - per-file deletes and whole-folder removal
//!
//! Batch operations never stop at the first failing item. They return an
//! [`OperationResult`] holding the success count and one entry per failure.
//! [`OperationExecutor`] runs the same calls on tokio's blocking pool and
//! streams progress through a channel.

mod archive;
mod classify;
mod compress;
mod conflict;
mod delete;
mod executor;
mod outcome;
mod transfer;

pub use archive::{ArchiveRequest, ArchiveScope, archive_files, archive_files_with, archive_folder};
pub use classify::{OrganizeReport, Organizer};
pub use compress::{ArchiveEncoding, compress_files, compress_files_with, compress_folder};
pub use conflict::{
    resolve_destination, suffixed_name, unique_appended_path, unique_timestamped_path,
};
pub use delete::{DeleteOptions, delete_file, delete_files, delete_files_with, delete_folder};
pub use executor::{OperationEvent, OperationExecutor, OperationHandle};
pub use outcome::{
    FailureReport, NoProgress, OperationError, OperationProgress, OperationResult, OperationType,
    ProgressObserver,
};

// Re-export core types
pub use tidyfile_core::{FailureKind, FileError};

/// Default channel buffer size for operation progress updates.
pub const OPERATION_CHANNEL_SIZE: usize = 100;

/// Failures shown by default in a batch report.
pub const DEFAULT_FAILURE_REPORT_LIMIT: usize = 10;
