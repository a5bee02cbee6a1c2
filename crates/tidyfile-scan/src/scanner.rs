//! JWalk-based directory scanner.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use jwalk::{Parallelism, WalkDir};
use tracing::{debug, warn};

use tidyfile_core::{FileDescriptor, ScanConfig, ScanError, ScanWarning, WarningKind};

use crate::metadata::read_metadata;

/// Files found by a scan, in enumeration order.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// Root that was scanned.
    pub root: PathBuf,
    /// Regular files and links to them, parents before children, siblings
    /// sorted by name.
    pub files: Vec<FileDescriptor>,
    /// Entries that could not be read.
    pub warnings: Vec<ScanWarning>,
}

impl ScanOutcome {
    /// Paths of all scanned files, in enumeration order.
    pub fn paths(&self) -> impl Iterator<Item = &std::path::Path> {
        self.files.iter().map(|f| f.path.as_path())
    }

    /// Total size of all scanned files.
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}

/// Single-threaded tree scanner.
///
/// Traversal is serial and name-sorted so that every consumer (duplicate
/// detection in particular) sees a stable order.
#[derive(Debug, Default)]
pub struct FileScanner;

impl FileScanner {
    /// Create a new scanner.
    pub fn new() -> Self {
        Self
    }

    /// Enumerate every regular file (or link to one) under `config.root`.
    pub fn scan(&self, config: &ScanConfig) -> Result<ScanOutcome, ScanError> {
        let root_path = config.root.clone();
        let root_metadata =
            std::fs::metadata(&root_path).map_err(|e| ScanError::io(&root_path, e))?;
        if !root_metadata.is_dir() {
            return Err(ScanError::NotADirectory { path: root_path });
        }

        let skip_dirs: Arc<BTreeSet<String>> = Arc::new(config.skip_dirs.clone());

        let walker = WalkDir::new(&root_path)
            .parallelism(Parallelism::Serial)
            .sort(true)
            .skip_hidden(!config.include_hidden)
            .follow_links(config.follow_symlinks)
            .min_depth(0)
            .max_depth(config.max_depth.map(|d| d as usize).unwrap_or(usize::MAX))
            .process_read_dir(move |_depth, _path, _state, children| {
                // Pruned here so skipped subtrees are never descended into
                children.retain(|entry| match entry {
                    Ok(e) if e.file_type().is_dir() => {
                        !skip_dirs.contains(e.file_name().to_string_lossy().as_ref())
                    }
                    _ => true,
                });
            });

        let mut outcome = ScanOutcome {
            root: root_path.clone(),
            ..Default::default()
        };

        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    warn!(path = %path.display(), error = %err, "unreadable entry");
                    outcome
                        .warnings
                        .push(ScanWarning::new(path, err.to_string(), WarningKind::ReadError));
                    continue;
                }
            };

            let path = entry.path();
            let file_type = entry.file_type();
            // Links are listed as themselves; keep those that resolve to a file
            if !file_type.is_file() && !(file_type.is_symlink() && path.is_file()) {
                continue;
            }

            match read_metadata(&path) {
                Ok(desc) => outcome.files.push(desc),
                Err(err) => {
                    // Removed or locked between listing and stat
                    warn!(path = %path.display(), error = %err, "skipping file");
                    outcome.warnings.push(ScanWarning::from_file_error(&err));
                }
            }
        }

        debug!(
            root = %root_path.display(),
            files = outcome.files.len(),
            warnings = outcome.warnings.len(),
            "scan complete"
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn names(outcome: &ScanOutcome) -> Vec<String> {
        outcome.files.iter().map(|f| f.name.to_string()).collect()
    }

    #[test]
    fn test_scan_flat_and_nested() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("b.txt"), "b").unwrap();
        fs::write(root.join("a.txt"), "a").unwrap();
        fs::create_dir(root.join("sub")).unwrap();
        fs::write(root.join("sub/c.txt"), "c").unwrap();

        let outcome = FileScanner::new().scan(&ScanConfig::new(root)).unwrap();

        assert_eq!(outcome.files.len(), 3);
        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.total_size(), 3);
        let found = names(&outcome);
        assert!(found.contains(&"c.txt".to_string()));
        let a = found.iter().position(|n| n == "a.txt").unwrap();
        let b = found.iter().position(|n| n == "b.txt").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_scan_skips_named_subtrees() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("txt_only/deeper")).unwrap();
        fs::write(root.join("txt_only/done.txt"), "x").unwrap();
        fs::write(root.join("txt_only/deeper/done2.txt"), "x").unwrap();
        fs::write(root.join("todo.txt"), "x").unwrap();

        let config = ScanConfig::new(root).with_skip_dirs(["txt_only"]);
        let outcome = FileScanner::new().scan(&config).unwrap();

        assert_eq!(names(&outcome), vec!["todo.txt".to_string()]);
    }

    #[test]
    fn test_scan_hidden_files() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join(".hidden"), "h").unwrap();
        fs::write(root.join("shown"), "s").unwrap();

        let all = FileScanner::new().scan(&ScanConfig::new(root)).unwrap();
        assert_eq!(all.files.len(), 2);

        let mut config = ScanConfig::new(root);
        config.include_hidden = false;
        let visible = FileScanner::new().scan(&config).unwrap();
        assert_eq!(names(&visible), vec!["shown".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_lists_links_to_files() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("real.dat"), "data").unwrap();
        fs::create_dir(root.join("dir")).unwrap();
        std::os::unix::fs::symlink(root.join("real.dat"), root.join("link.txt")).unwrap();
        std::os::unix::fs::symlink(root.join("dir"), root.join("dir_link")).unwrap();
        std::os::unix::fs::symlink(root.join("gone"), root.join("dangling")).unwrap();

        let outcome = FileScanner::new().scan(&ScanConfig::new(root)).unwrap();

        assert_eq!(names(&outcome), vec!["link.txt".to_string(), "real.dat".to_string()]);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_scan_missing_root() {
        let temp = TempDir::new().unwrap();
        let err = FileScanner::new()
            .scan(&ScanConfig::new(temp.path().join("missing")))
            .unwrap_err();
        assert!(matches!(err, ScanError::NotFound { .. }));
    }

    #[test]
    fn test_scan_root_is_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("f.txt");
        fs::write(&file, "x").unwrap();

        let err = FileScanner::new().scan(&ScanConfig::new(&file)).unwrap_err();
        assert!(matches!(err, ScanError::NotADirectory { .. }));
    }
}
