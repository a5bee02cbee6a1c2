//! Archiving: timestamped copies and the request type that dispatches
//! between copies and compressed containers.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tracing::info;

use tidyfile_core::FileError;

use crate::compress::{ArchiveEncoding, compress_files_with, compress_folder};
use crate::conflict::{unique_appended_path, unique_timestamped_path};
use crate::outcome::{NoProgress, OperationResult, OperationType, ProgressObserver, run_batch};
use crate::transfer::{copy_dir_recursive, copy_file, ensure_dir, resolve_folder};

/// Copy each file to `<dest>/<name>_<timestamp>.<ext>`.
///
/// Without a destination each copy lands beside its source. Sources are never
/// modified; per-file failures are collected and the batch continues.
pub fn archive_files(sources: &[PathBuf], destination: Option<&Path>) -> OperationResult {
    archive_files_with(sources, destination, &NoProgress)
}

/// [`archive_files`] with progress reporting and cancellation.
pub fn archive_files_with(
    sources: &[PathBuf],
    destination: Option<&Path>,
    observer: &dyn ProgressObserver,
) -> OperationResult {
    let result = run_batch(OperationType::Archive, sources, observer, |source| {
        archive_one(source, destination).map(Some)
    });
    info!(
        archived = result.succeeded,
        failed = result.failed(),
        "file archive complete"
    );
    result
}

fn archive_one(source: &Path, destination: Option<&Path>) -> Result<PathBuf, FileError> {
    let name = source
        .file_name()
        .ok_or_else(|| FileError::invalid(format!("{} has no file name", source.display())))?;
    let dest_dir = match destination {
        Some(dir) => dir,
        None => source.parent().unwrap_or(Path::new("")),
    };
    if !dest_dir.as_os_str().is_empty() {
        ensure_dir(dest_dir)?;
    }

    let dest = unique_timestamped_path(dest_dir, Path::new(name), SystemTime::now());
    copy_file(source, &dest)?;
    Ok(dest)
}

/// Copy a whole folder to `<dest>/<folder>_<timestamp>`.
///
/// The default destination is the folder's parent. The first failure aborts
/// the copy and is returned; whatever was copied so far stays.
pub fn archive_folder(folder: &Path, destination: Option<&Path>) -> Result<PathBuf, FileError> {
    let (folder, name) = resolve_folder(folder)?;
    let dest_dir = match destination {
        Some(dir) => dir,
        None => folder.parent().unwrap_or(Path::new("/")),
    };
    if !dest_dir.as_os_str().is_empty() {
        ensure_dir(dest_dir)?;
    }

    let dest = unique_appended_path(dest_dir, &name, "", SystemTime::now());
    let bytes = copy_dir_recursive(&folder, &dest)?;
    info!(from = %folder.display(), to = %dest.display(), bytes, "folder archived");
    Ok(dest)
}

/// Whether a request names individual files or one folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveScope {
    #[default]
    Files,
    Folder,
}

/// A single archive operation, consumed by [`execute`](Self::execute).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveRequest {
    pub sources: Vec<PathBuf>,
    /// Directory for copies, or the container path for compressed encodings.
    pub destination: Option<PathBuf>,
    pub encoding: ArchiveEncoding,
    pub scope: ArchiveScope,
}

impl ArchiveRequest {
    /// Archive individual files.
    pub fn files(sources: Vec<PathBuf>) -> Self {
        Self {
            sources,
            destination: None,
            encoding: ArchiveEncoding::None,
            scope: ArchiveScope::Files,
        }
    }

    /// Archive one folder.
    pub fn folder(folder: impl Into<PathBuf>) -> Self {
        Self {
            sources: vec![folder.into()],
            destination: None,
            encoding: ArchiveEncoding::None,
            scope: ArchiveScope::Folder,
        }
    }

    pub fn with_destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    pub fn with_encoding(mut self, encoding: ArchiveEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Run the request.
    pub fn execute(self) -> Result<OperationResult, FileError> {
        self.execute_with(&NoProgress)
    }

    /// Run the request with progress reporting.
    ///
    /// Plain file copies return per-file outcomes. Folder copies and
    /// containers are single units: they either produce one output or fail.
    pub fn execute_with(self, observer: &dyn ProgressObserver) -> Result<OperationResult, FileError> {
        if self.sources.is_empty() {
            return Err(FileError::invalid("no sources to archive"));
        }
        let destination = self.destination.as_deref();

        match (self.scope, self.encoding) {
            (ArchiveScope::Files, ArchiveEncoding::None) => {
                Ok(archive_files_with(&self.sources, destination, observer))
            }
            (ArchiveScope::Files, encoding) => {
                let archive = compress_files_with(&self.sources, destination, encoding, observer)?;
                let mut result = OperationResult::new(OperationType::Compress);
                result.succeeded = self.sources.len();
                result.outputs.push(archive);
                Ok(result)
            }
            (ArchiveScope::Folder, encoding) => {
                let [folder] = self.sources.as_slice() else {
                    return Err(FileError::invalid(format!(
                        "folder archive takes exactly one folder, got {}",
                        self.sources.len()
                    )));
                };
                let (operation_type, output) = if encoding.is_compressed() {
                    (OperationType::Compress, compress_folder(folder, destination, encoding)?)
                } else {
                    (OperationType::Archive, archive_folder(folder, destination)?)
                };
                let mut result = OperationResult::new(operation_type);
                result.record_output(output);
                Ok(result)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use tidyfile_core::FailureKind;

    #[test]
    fn test_archive_files_beside_source() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("report.pdf");
        fs::write(&src, "pdf").unwrap();

        let result = archive_files(std::slice::from_ref(&src), None);

        assert_eq!(result.succeeded, 1);
        let copy = &result.outputs[0];
        assert_eq!(copy.parent(), Some(temp.path()));
        let name = copy.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("report_") && name.ends_with(".pdf"), "{name}");
        assert_eq!(fs::read_to_string(&src).unwrap(), "pdf");
    }

    #[test]
    fn test_archive_files_same_name_twice() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("one/notes.txt");
        let b = temp.path().join("two/notes.txt");
        fs::create_dir_all(a.parent().unwrap()).unwrap();
        fs::create_dir_all(b.parent().unwrap()).unwrap();
        fs::write(&a, "first").unwrap();
        fs::write(&b, "second").unwrap();
        let dest = temp.path().join("vault");

        let result = archive_files(&[a, b], Some(&dest));

        assert_eq!(result.succeeded, 2);
        assert_ne!(result.outputs[0], result.outputs[1]);
        assert_eq!(fs::read_dir(&dest).unwrap().count(), 2);
    }

    #[test]
    fn test_archive_files_missing_source() {
        let temp = TempDir::new().unwrap();
        let present = temp.path().join("a.txt");
        fs::write(&present, "a").unwrap();

        let result = archive_files(&[present, temp.path().join("gone.txt")], None);

        assert_eq!(result.succeeded, 1);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].kind, FailureKind::NotFound);
    }

    #[test]
    fn test_archive_folder_copies_tree() {
        let temp = TempDir::new().unwrap();
        let folder = temp.path().join("project");
        fs::create_dir_all(folder.join("src")).unwrap();
        fs::write(folder.join("src/main.c"), "int main;").unwrap();

        let copy = archive_folder(&folder, Some(&temp.path().join("backups"))).unwrap();

        assert!(copy.file_name().unwrap().to_string_lossy().starts_with("project_"));
        assert_eq!(fs::read_to_string(copy.join("src/main.c")).unwrap(), "int main;");
        assert!(folder.join("src/main.c").exists());
    }

    #[test]
    fn test_archive_folder_missing() {
        let temp = TempDir::new().unwrap();
        let err = archive_folder(&temp.path().join("nope"), None).unwrap_err();
        assert!(matches!(err, FileError::NotFound { .. }));
    }

    #[test]
    fn test_request_rejects_empty_sources() {
        let err = ArchiveRequest::files(Vec::new()).execute().unwrap_err();
        assert!(matches!(err, FileError::InvalidRequest { .. }));
    }

    #[test]
    fn test_request_folder_scope_needs_one_source() {
        let mut request = ArchiveRequest::folder("/tmp/a");
        request.sources.push(PathBuf::from("/tmp/b"));
        assert!(matches!(
            request.execute(),
            Err(FileError::InvalidRequest { .. })
        ));
    }
}
