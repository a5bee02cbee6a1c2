//! File and folder removal.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use tidyfile_core::FileError;

use crate::outcome::{NoProgress, OperationResult, OperationType, ProgressObserver, run_batch};

/// Options for delete operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOptions {
    /// Send items to the platform trash instead of removing them.
    pub use_trash: bool,
}

impl DeleteOptions {
    pub fn trash() -> Self {
        Self { use_trash: true }
    }
}

/// Delete each file independently.
///
/// A path that no longer exists is recorded as a not-found failure; the rest
/// of the batch still runs.
pub fn delete_files(paths: &[PathBuf], options: DeleteOptions) -> OperationResult {
    delete_files_with(paths, options, &NoProgress)
}

/// [`delete_files`] with progress reporting and cancellation.
pub fn delete_files_with(
    paths: &[PathBuf],
    options: DeleteOptions,
    observer: &dyn ProgressObserver,
) -> OperationResult {
    let result = run_batch(OperationType::Delete, paths, observer, |path| {
        delete_file(path, options).map(|()| None)
    });
    info!(
        deleted = result.succeeded,
        failed = result.failed(),
        trash = options.use_trash,
        "delete complete"
    );
    result
}

/// Delete a single file.
pub fn delete_file(path: &Path, options: DeleteOptions) -> Result<(), FileError> {
    // Vanished paths are NotFound, trash included
    fs::symlink_metadata(path).map_err(|e| FileError::io(path, e))?;

    if options.use_trash {
        move_to_trash(path)
    } else {
        fs::remove_file(path).map_err(|e| FileError::io(path, e))?;
        debug!(path = %path.display(), "deleted");
        Ok(())
    }
}

/// Remove a folder and everything below it in one recursive operation.
///
/// On failure the subtree is left in whatever state the removal reached.
pub fn delete_folder(path: &Path, options: DeleteOptions) -> Result<(), FileError> {
    let metadata = fs::symlink_metadata(path).map_err(|e| FileError::io(path, e))?;
    if !metadata.is_dir() {
        return Err(FileError::invalid(format!(
            "{} is not a directory",
            path.display()
        )));
    }

    if options.use_trash {
        move_to_trash(path)?;
    } else {
        fs::remove_dir_all(path).map_err(|e| FileError::io(path, e))?;
    }
    info!(path = %path.display(), trash = options.use_trash, "folder deleted");
    Ok(())
}

fn move_to_trash(path: &Path) -> Result<(), FileError> {
    trash::delete(path).map_err(|e| FileError::io(path, io::Error::other(e.to_string())))?;
    debug!(path = %path.display(), "moved to trash");
    Ok(())
}
