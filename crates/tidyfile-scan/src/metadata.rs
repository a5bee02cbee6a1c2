//! Metadata reader.

use std::fs;
use std::path::{Path, PathBuf};

use tidyfile_core::{FileDescriptor, FileError};

/// Stat a path and return its descriptor.
///
/// Fails with [`FileError::NotFound`] if the path does not exist at call time,
/// or [`FileError::AccessDenied`] / [`FileError::Io`] if the stat fails.
pub fn read_metadata(path: &Path) -> Result<FileDescriptor, FileError> {
    let metadata = fs::metadata(path).map_err(|e| FileError::io(path, e))?;
    Ok(FileDescriptor::from_metadata(path, &metadata))
}

/// Read metadata for each path, keeping one result per input in input order.
///
/// A path that vanished between enumeration and read yields an `Err` entry
/// for that path only.
pub fn read_all<I, P>(paths: I) -> Vec<Result<FileDescriptor, FileError>>
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    paths
        .into_iter()
        .map(|p| read_metadata(&p.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_metadata() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("report.Pdf");
        fs::write(&path, vec![0u8; 1234]).unwrap();

        let desc = read_metadata(&path).unwrap();
        assert_eq!(desc.path, path);
        assert_eq!(desc.name, "report.Pdf");
        assert_eq!(desc.extension, ".pdf");
        assert_eq!(desc.size, 1234);
    }

    #[test]
    fn test_read_metadata_missing() {
        let temp = TempDir::new().unwrap();
        let err = read_metadata(&temp.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, FileError::NotFound { .. }));
    }

    #[test]
    fn test_read_all_keeps_going() {
        let temp = TempDir::new().unwrap();
        let present = temp.path().join("a.txt");
        let missing = temp.path().join("b.txt");
        fs::write(&present, "a").unwrap();

        let results = read_all([present.clone(), missing, present]);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(FileError::NotFound { .. })));
        assert!(results[2].is_ok());
    }
}
