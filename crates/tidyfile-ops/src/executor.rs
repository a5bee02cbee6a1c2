//! Background execution of blocking operations with progress over channels.

use std::path::PathBuf;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use tidyfile_core::{ClassificationRules, FileError};

use crate::archive::ArchiveRequest;
use crate::classify::{OrganizeReport, Organizer};
use crate::delete::{DeleteOptions, delete_files_with, delete_folder};
use crate::outcome::{OperationProgress, OperationResult, OperationType, ProgressObserver};
use crate::OPERATION_CHANNEL_SIZE;

/// Event sent through the channel while an operation runs.
///
/// Every operation ends with exactly one of `Complete`, `Organized` or
/// `Failed`.
#[derive(Debug)]
pub enum OperationEvent {
    /// Progress update.
    Progress(OperationProgress),
    /// A batch or single-unit operation finished.
    Complete(OperationResult),
    /// An organize run finished.
    Organized(OrganizeReport),
    /// The operation failed as a whole.
    Failed(FileError),
}

impl OperationEvent {
    /// Check if this is the last event of an operation.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress(_))
    }
}

/// A running operation.
#[derive(Debug)]
pub struct OperationHandle {
    events: mpsc::Receiver<OperationEvent>,
    cancel: CancellationToken,
}

impl OperationHandle {
    /// Ask the operation to stop before its next item.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Receive the next event, or `None` once the operation is gone.
    pub async fn recv(&mut self) -> Option<OperationEvent> {
        self.events.recv().await
    }

    /// Skip progress and wait for the terminal event.
    pub async fn finish(mut self) -> Option<OperationEvent> {
        while let Some(event) = self.events.recv().await {
            if event.is_terminal() {
                return Some(event);
            }
        }
        None
    }
}

/// Observer bridging a blocking batch to the async side.
struct ChannelObserver {
    tx: mpsc::Sender<OperationEvent>,
    cancel: CancellationToken,
}

impl ProgressObserver for ChannelObserver {
    fn on_progress(&self, progress: &OperationProgress) {
        // Progress is lossy when the receiver lags; terminal events are not
        let _ = self.tx.try_send(OperationEvent::Progress(progress.clone()));
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Runs operations on the blocking thread pool.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Default)]
pub struct OperationExecutor {
    /// Options applied to deletions.
    pub delete_options: DeleteOptions,
    shutdown: CancellationToken,
}

impl OperationExecutor {
    /// Create a new executor with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an executor that uses trash for deletions.
    pub fn with_trash() -> Self {
        Self {
            delete_options: DeleteOptions::trash(),
            ..Default::default()
        }
    }

    /// Cancel every operation started by this executor, including later ones.
    pub fn cancel_all(&self) {
        self.shutdown.cancel();
    }

    /// Organize `root` with `rules`.
    pub fn organize(&self, root: PathBuf, rules: ClassificationRules) -> OperationHandle {
        self.spawn(OperationType::Organize, move |observer| {
            match Organizer::new(rules).organize_with(&root, observer) {
                Ok(report) => OperationEvent::Organized(report),
                Err(err) => OperationEvent::Failed(err),
            }
        })
    }

    /// Execute an archive request.
    pub fn archive(&self, request: ArchiveRequest) -> OperationHandle {
        let operation_type = if request.encoding.is_compressed() {
            OperationType::Compress
        } else {
            OperationType::Archive
        };
        self.spawn(operation_type, move |observer| {
            terminal(request.execute_with(observer))
        })
    }

    /// Delete files one by one.
    pub fn delete_files(&self, paths: Vec<PathBuf>) -> OperationHandle {
        let options = self.delete_options;
        self.spawn(OperationType::Delete, move |observer| {
            OperationEvent::Complete(delete_files_with(&paths, options, observer))
        })
    }

    /// Delete a whole folder.
    pub fn delete_folder(&self, path: PathBuf) -> OperationHandle {
        let options = self.delete_options;
        self.spawn(OperationType::Delete, move |observer| {
            if observer.is_cancelled() {
                return OperationEvent::Failed(FileError::Cancelled);
            }
            terminal(delete_folder(&path, options).map(|()| {
                let mut result = OperationResult::new(OperationType::Delete);
                result.record_success();
                result
            }))
        })
    }

    fn spawn<F>(&self, operation_type: OperationType, job: F) -> OperationHandle
    where
        F: FnOnce(&dyn ProgressObserver) -> OperationEvent + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(OPERATION_CHANNEL_SIZE);
        let cancel = self.shutdown.child_token();
        let observer = ChannelObserver {
            tx: tx.clone(),
            cancel: cancel.clone(),
        };

        tokio::task::spawn_blocking(move || {
            debug!(operation = %operation_type, "operation started");
            let event = job(&observer);
            debug!(operation = %operation_type, "operation finished");
            let _ = tx.blocking_send(event);
        });

        OperationHandle { events: rx, cancel }
    }
}

fn terminal(result: Result<OperationResult, FileError>) -> OperationEvent {
    match result {
        Ok(result) => OperationEvent::Complete(result),
        Err(err) => OperationEvent::Failed(err),
    }
}
