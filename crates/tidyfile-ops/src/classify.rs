//! Extension-based organization into `<root>/<folder>/` subdirectories.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use tidyfile_core::{ClassificationRules, FileDescriptor, FileError, ScanConfig, extension_of};
use tidyfile_scan::FileScanner;

use crate::conflict::resolve_destination;
use crate::outcome::{NoProgress, OperationResult, OperationType, ProgressObserver, run_batch};
use crate::transfer::{ensure_dir, move_file};

/// Outcome of organizing a directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizeReport {
    /// Extension to number of files moved; only extensions with at least one move.
    pub moved: BTreeMap<String, usize>,
    /// Per-file outcome for every file with a known extension.
    pub result: OperationResult,
}

impl OrganizeReport {
    /// Total files moved.
    pub fn total_moved(&self) -> usize {
        self.moved.values().sum()
    }
}

/// Moves files into folders named by their extension.
#[derive(Debug, Clone, Default)]
pub struct Organizer {
    rules: ClassificationRules,
}

impl Organizer {
    pub fn new(rules: ClassificationRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ClassificationRules {
        &self.rules
    }

    /// Organize every file under `root`.
    pub fn organize(&self, root: &Path) -> Result<OrganizeReport, FileError> {
        self.organize_with(root, &NoProgress)
    }

    /// Organize every file under `root`, reporting progress to `observer`.
    ///
    /// Subtrees named like a destination folder are never entered, so running
    /// this twice moves nothing the second time. Files with unknown
    /// extensions are left where they are.
    pub fn organize_with(
        &self,
        root: &Path,
        observer: &dyn ProgressObserver,
    ) -> Result<OrganizeReport, FileError> {
        let config = ScanConfig::new(root).with_skip_dirs(self.rules.folder_names());
        let outcome = FileScanner::new().scan(&config)?;

        let candidates: Vec<&FileDescriptor> = outcome
            .files
            .iter()
            .filter(|f| self.rules.contains(&f.extension))
            .collect();

        let present: BTreeSet<&str> = candidates.iter().map(|f| f.extension.as_str()).collect();
        debug!(
            root = %root.display(),
            candidates = candidates.len(),
            extensions = ?present,
            "organizing"
        );

        let paths: Vec<PathBuf> = candidates.iter().map(|f| f.path.clone()).collect();
        let mut moved: BTreeMap<String, usize> = BTreeMap::new();

        let result = run_batch(OperationType::Organize, &paths, observer, |path| {
            let (extension, dest) = self.relocate(path, root)?;
            *moved.entry(extension).or_default() += 1;
            Ok(Some(dest))
        });

        info!(
            root = %root.display(),
            moved = result.succeeded,
            failed = result.failed(),
            "organize complete"
        );

        Ok(OrganizeReport { moved, result })
    }

    /// Organize a single file into its folder under `root`.
    ///
    /// Returns `None` when the extension has no rule; the file is untouched.
    pub fn organize_file(
        &self,
        path: &Path,
        root: &Path,
    ) -> Result<Option<(String, PathBuf)>, FileError> {
        if !self.rules.contains(&extension_of(path)) {
            return Ok(None);
        }
        self.relocate(path, root).map(Some)
    }

    fn relocate(&self, path: &Path, root: &Path) -> Result<(String, PathBuf), FileError> {
        let extension = extension_of(path);
        let folder = self
            .rules
            .folder_for(&extension)
            .ok_or_else(|| FileError::invalid(format!("no rule for {extension}")))?;
        let name = path
            .file_name()
            .ok_or_else(|| FileError::invalid(format!("{} has no file name", path.display())))?;

        // Created on first use so only present extensions get a folder
        let dest_dir = root.join(folder);
        ensure_dir(&dest_dir)?;

        let dest = resolve_destination(&dest_dir, Path::new(name), SystemTime::now());
        move_file(path, &dest)?;
        debug!(from = %path.display(), to = %dest.display(), "moved");

        Ok((extension.to_string(), dest))
    }
}
