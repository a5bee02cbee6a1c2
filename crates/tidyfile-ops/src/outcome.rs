//! Batch result and progress types shared by every operation.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use tidyfile_core::{FailureKind, FileError};

/// The type of operation being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationType {
    Organize,
    Archive,
    Compress,
    Delete,
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Organize => write!(f, "Organize"),
            Self::Archive => write!(f, "Archive"),
            Self::Compress => write!(f, "Compress"),
            Self::Delete => write!(f, "Delete"),
        }
    }
}

/// A single failed item inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationError {
    /// The path that caused the error.
    pub path: PathBuf,
    /// Why it failed.
    pub kind: FailureKind,
    /// A human-readable error message.
    pub message: String,
}

impl OperationError {
    /// Create a new operation error.
    pub fn new(path: impl Into<PathBuf>, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }

    /// Record `error` against `path`.
    pub fn from_error(path: impl Into<PathBuf>, error: &FileError) -> Self {
        Self::new(path, error.kind(), error.to_string())
    }

    /// Item skipped because the batch was cancelled.
    pub fn cancelled(path: impl Into<PathBuf>) -> Self {
        Self::new(path, FailureKind::Cancelled, "cancelled before processing")
    }
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

/// Uniform result of a batch operation.
///
/// For per-file batches `succeeded + failures.len()` equals the number of
/// input paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    /// The type of operation.
    pub operation_type: OperationType,
    /// Number of items successfully processed.
    pub succeeded: usize,
    /// Failed items in processing order.
    pub failures: Vec<OperationError>,
    /// Paths created by the operation (copies, archives, moved files).
    pub outputs: Vec<PathBuf>,
}

impl OperationResult {
    /// Create an empty result.
    pub fn new(operation_type: OperationType) -> Self {
        Self {
            operation_type,
            succeeded: 0,
            failures: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Record a success that produced `output`.
    pub fn record_output(&mut self, output: PathBuf) {
        self.succeeded += 1;
        self.outputs.push(output);
    }

    /// Record a success with nothing left behind (deletes).
    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    /// Record a failure for `path`.
    pub fn record_failure(&mut self, path: &Path, error: &FileError) {
        warn!(
            operation = %self.operation_type,
            path = %path.display(),
            error = %error,
            "item failed"
        );
        self.failures.push(OperationError::from_error(path, error));
    }

    /// Number of failed items.
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Total items accounted for.
    pub fn total(&self) -> usize {
        self.succeeded + self.failures.len()
    }

    /// Check if the operation was fully successful.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Check if the batch was cut short by cancellation.
    pub fn was_cancelled(&self) -> bool {
        self.failures.iter().any(|f| f.kind == FailureKind::Cancelled)
    }

    /// Get a human-readable summary of the operation.
    pub fn summary(&self) -> String {
        let action = match self.operation_type {
            OperationType::Organize => "Moved",
            OperationType::Archive => "Archived",
            OperationType::Compress => "Compressed",
            OperationType::Delete => "Deleted",
        };

        if self.failures.is_empty() {
            format!("{} {} items", action, self.succeeded)
        } else {
            format!(
                "{} {} items, {} failed",
                action,
                self.succeeded,
                self.failures.len()
            )
        }
    }

    /// The first `limit` failure messages plus how many were left out.
    pub fn failure_report(&self, limit: usize) -> FailureReport {
        FailureReport {
            messages: self
                .failures
                .iter()
                .take(limit)
                .map(ToString::to_string)
                .collect(),
            overflow: self.failures.len().saturating_sub(limit),
        }
    }

    /// Turn any failure into [`FileError::PartialBatchFailure`].
    pub fn into_result(self) -> Result<Self, FileError> {
        if self.failures.is_empty() {
            Ok(self)
        } else {
            Err(FileError::PartialBatchFailure {
                succeeded: self.succeeded,
                failed: self.failures.len(),
            })
        }
    }
}

/// Truncated list of failure messages for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    pub messages: Vec<String>,
    /// Failures not included in `messages`.
    pub overflow: usize,
}

impl FailureReport {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for message in &self.messages {
            writeln!(f, "{message}")?;
        }
        if self.overflow > 0 {
            writeln!(f, "... and {} more errors", self.overflow)?;
        }
        Ok(())
    }
}

/// Progress information for an ongoing operation.
#[derive(Debug, Clone)]
pub struct OperationProgress {
    /// The type of operation.
    pub operation_type: OperationType,
    /// Number of items completed (successfully or not).
    pub files_completed: usize,
    /// Total number of items to process.
    pub files_total: usize,
    /// The item currently being processed.
    pub current_file: Option<PathBuf>,
    /// Failures so far.
    pub error_count: usize,
}

impl OperationProgress {
    /// Create a new progress tracker for an operation.
    pub fn new(operation_type: OperationType, files_total: usize) -> Self {
        Self {
            operation_type,
            files_completed: 0,
            files_total,
            current_file: None,
            error_count: 0,
        }
    }

    /// Get the progress as a percentage (0.0 to 100.0).
    pub fn percentage(&self) -> f64 {
        if self.files_total > 0 {
            (self.files_completed as f64 / self.files_total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Update the current file being processed.
    pub fn set_current_file(&mut self, path: Option<PathBuf>) {
        self.current_file = path;
    }

    /// Mark the current item done.
    pub fn complete_file(&mut self, failed: bool) {
        self.files_completed += 1;
        if failed {
            self.error_count += 1;
        }
    }
}

/// Receives per-item progress from a batch and may ask it to stop.
///
/// Batches poll [`is_cancelled`](Self::is_cancelled) between items, never in
/// the middle of one.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, progress: &OperationProgress);

    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Observer that ignores progress and never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&self, _progress: &OperationProgress) {}
}

/// Run `step` for every path, accumulating one outcome per path.
///
/// `step` returns the output path it created, if any. Once the observer
/// reports cancellation every remaining path is recorded as cancelled.
pub(crate) fn run_batch<F>(
    operation_type: OperationType,
    paths: &[PathBuf],
    observer: &dyn ProgressObserver,
    mut step: F,
) -> OperationResult
where
    F: FnMut(&Path) -> Result<Option<PathBuf>, FileError>,
{
    let mut result = OperationResult::new(operation_type);
    let mut progress = OperationProgress::new(operation_type, paths.len());

    for (index, path) in paths.iter().enumerate() {
        if observer.is_cancelled() {
            for skipped in &paths[index..] {
                result.failures.push(OperationError::cancelled(skipped));
            }
            break;
        }

        progress.set_current_file(Some(path.clone()));
        observer.on_progress(&progress);

        match step(path) {
            Ok(Some(output)) => result.record_output(output),
            Ok(None) => result.record_success(),
            Err(err) => result.record_failure(path, &err),
        }
        progress.complete_file(result.failures.len() > progress.error_count);
    }

    progress.set_current_file(None);
    observer.on_progress(&progress);
    result
}
