//! Low-level move and copy primitives.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use tracing::debug;

use tidyfile_core::FileError;

/// Move a single file, falling back to copy + remove across filesystems.
pub(crate) fn move_file(source: &Path, dest: &Path) -> Result<(), FileError> {
    match fs::rename(source, dest) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!(source = %source.display(), "rename crossed devices, copying instead");
            copy_with_times(source, dest)?;
            fs::remove_file(source).map_err(|e| FileError::io(source, e))
        }
        Err(e) => Err(FileError::io(source, e)),
    }
}

/// Copy a single file, returning the number of bytes written.
pub(crate) fn copy_file(source: &Path, dest: &Path) -> Result<u64, FileError> {
    if !source.is_file() {
        fs::metadata(source).map_err(|e| FileError::io(source, e))?;
        return Err(FileError::invalid(format!(
            "{} is not a regular file",
            source.display()
        )));
    }
    copy_with_times(source, dest)
}

/// Copy contents, then carry the source's access and modification times over.
fn copy_with_times(source: &Path, dest: &Path) -> Result<u64, FileError> {
    // Stat first: reading the contents may bump atime
    let metadata = fs::metadata(source).map_err(|e| FileError::io(source, e))?;
    let bytes = fs::copy(source, dest).map_err(|e| FileError::io(source, e))?;
    filetime::set_file_times(
        dest,
        FileTime::from_last_access_time(&metadata),
        FileTime::from_last_modification_time(&metadata),
    )
    .map_err(|e| FileError::io(dest, e))?;
    Ok(bytes)
}

/// Recursively copy a directory. Stops at the first error.
pub(crate) fn copy_dir_recursive(source: &Path, dest: &Path) -> Result<u64, FileError> {
    fs::create_dir_all(dest).map_err(|e| FileError::io(dest, e))?;

    let entries = fs::read_dir(source).map_err(|e| FileError::io(source, e))?;
    let mut bytes = 0u64;

    for entry in entries {
        let entry = entry.map_err(|e| FileError::io(source, e))?;
        let path = entry.path();
        let dest_path = dest.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| FileError::io(&path, e))?;

        if file_type.is_dir() {
            bytes += copy_dir_recursive(&path, &dest_path)?;
        } else {
            bytes += copy_with_times(&path, &dest_path)?;
        }
    }

    Ok(bytes)
}

/// Canonical form of `folder` plus its base name.
///
/// Resolves `.` and `..` so paths like `.` still have a name.
pub(crate) fn resolve_folder(folder: &Path) -> Result<(PathBuf, String), FileError> {
    let canonical = fs::canonicalize(folder).map_err(|e| FileError::io(folder, e))?;
    if !canonical.is_dir() {
        return Err(FileError::invalid(format!(
            "{} is not a directory",
            folder.display()
        )));
    }
    let name = canonical
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| FileError::invalid(format!("{} has no folder name", folder.display())))?;
    Ok((canonical, name))
}

/// Create `dir` (and parents) if it does not exist yet.
pub(crate) fn ensure_dir(dir: &Path) -> Result<(), FileError> {
    fs::create_dir_all(dir).map_err(|e| FileError::io(dir, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_move_file() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("a.txt");
        let dst = temp.path().join("b.txt");
        fs::write(&src, "payload").unwrap();

        move_file(&src, &dst).unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read_to_string(&dst).unwrap(), "payload");
    }

    #[test]
    fn test_move_missing_source() {
        let temp = TempDir::new().unwrap();
        let err = move_file(&temp.path().join("gone"), &temp.path().join("x")).unwrap_err();
        assert!(matches!(err, FileError::NotFound { .. }));
    }

    #[test]
    fn test_copy_dir_recursive() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("nested/deeper")).unwrap();
        fs::write(src.join("top.txt"), "12").unwrap();
        fs::write(src.join("nested/deeper/leaf.txt"), "345").unwrap();

        let dst = temp.path().join("dst");
        let bytes = copy_dir_recursive(&src, &dst).unwrap();

        assert_eq!(bytes, 5);
        assert_eq!(fs::read_to_string(dst.join("nested/deeper/leaf.txt")).unwrap(), "345");
        assert!(src.join("top.txt").exists());
    }

    #[test]
    fn test_copies_keep_timestamps() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir(&src).unwrap();
        let file = src.join("old.txt");
        fs::write(&file, "old").unwrap();
        let atime = FileTime::from_unix_time(1_500_000_000, 0);
        let mtime = FileTime::from_unix_time(1_600_000_000, 0);
        filetime::set_file_times(&file, atime, mtime).unwrap();

        copy_file(&file, &temp.path().join("single.txt")).unwrap();
        copy_dir_recursive(&src, &temp.path().join("tree")).unwrap();

        for copy in [temp.path().join("single.txt"), temp.path().join("tree/old.txt")] {
            let meta = fs::metadata(&copy).unwrap();
            assert_eq!(FileTime::from_last_modification_time(&meta), mtime);
        }
    }

    #[test]
    fn test_resolve_folder_names_dot_paths() {
        let temp = TempDir::new().unwrap();
        let folder = temp.path().join("box");
        fs::create_dir_all(folder.join("sub")).unwrap();

        let (canonical, name) = resolve_folder(&folder.join("sub").join("..")).unwrap();

        assert_eq!(name, "box");
        assert_eq!(canonical, fs::canonicalize(&folder).unwrap());
        assert!(matches!(
            resolve_folder(&temp.path().join("missing")),
            Err(FileError::NotFound { .. })
        ));
    }

    #[test]
    fn test_copy_file_rejects_directory() {
        let temp = TempDir::new().unwrap();
        let err = copy_file(temp.path(), &temp.path().join("out")).unwrap_err();
        assert!(matches!(err, FileError::InvalidRequest { .. }));
    }
}
