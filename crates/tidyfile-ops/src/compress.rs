//! Compressed container archives (zip and tar.gz).
//!
//! Building a container is all-or-nothing from the caller's view: the first
//! failure aborts and is returned. A partially written container is left on
//! disk.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use flate2::Compression;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use tracing::{debug, info};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use tidyfile_core::{FileError, ScanConfig};
use tidyfile_scan::FileScanner;

use crate::conflict::{suffixed_name, unique_appended_path};
use crate::outcome::{NoProgress, OperationProgress, OperationType, ProgressObserver};
use crate::transfer::{ensure_dir, resolve_folder};

/// How an archive is encoded on disk.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum ArchiveEncoding {
    /// Plain timestamped copies.
    #[default]
    #[strum(to_string = "none")]
    #[serde(rename = "none")]
    None,
    /// Zip container with per-entry deflate.
    #[strum(to_string = "zip")]
    #[serde(rename = "zip")]
    Zip,
    /// Gzip-compressed tarball.
    #[strum(to_string = "tar.gz", serialize = "tgz")]
    #[serde(rename = "tar.gz")]
    TarGz,
}

impl ArchiveEncoding {
    /// Parse an encoding name, rejecting anything unknown.
    pub fn parse(value: &str) -> Result<Self, FileError> {
        value
            .trim()
            .parse()
            .map_err(|_| FileError::UnsupportedEncoding {
                encoding: value.to_string(),
            })
    }

    /// File name tail including the leading dot, or `None` for plain copies.
    pub fn file_extension(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Zip => Some(".zip"),
            Self::TarGz => Some(".tar.gz"),
        }
    }

    pub fn is_compressed(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// The container tail, failing for encodings that are not containers.
    fn container_extension(&self) -> Result<&'static str, FileError> {
        self.file_extension()
            .ok_or_else(|| FileError::UnsupportedEncoding {
                encoding: self.to_string(),
            })
    }
}

/// Build a container holding `sources`, each stored under its base name.
///
/// When `archive_path` is `None` the container is written to
/// `archive_<timestamp>.<ext>` next to the first source.
pub fn compress_files(
    sources: &[PathBuf],
    archive_path: Option<&Path>,
    encoding: ArchiveEncoding,
) -> Result<PathBuf, FileError> {
    compress_files_with(sources, archive_path, encoding, &NoProgress)
}

/// [`compress_files`] with progress reporting and cancellation.
pub fn compress_files_with(
    sources: &[PathBuf],
    archive_path: Option<&Path>,
    encoding: ArchiveEncoding,
    observer: &dyn ProgressObserver,
) -> Result<PathBuf, FileError> {
    let tail = encoding.container_extension()?;
    let first = sources
        .first()
        .ok_or_else(|| FileError::invalid("no files provided for archiving"))?;

    let target = match archive_path {
        Some(path) => path.to_path_buf(),
        None => {
            let dir = first.parent().unwrap_or(Path::new(""));
            unique_appended_path(dir, "archive", tail, SystemTime::now())
        }
    };
    prepare_parent(&target)?;

    let mut used = HashSet::with_capacity(sources.len());
    let mut entries = Vec::with_capacity(sources.len());
    for source in sources {
        let name = source
            .file_name()
            .ok_or_else(|| FileError::invalid(format!("{} has no file name", source.display())))?;
        let name = unique_entry_name(Path::new(name), &mut used);
        entries.push((source.clone(), name));
    }

    write_container(&target, encoding, &entries, observer)?;
    info!(archive = %target.display(), entries = entries.len(), %encoding, "archive written");
    Ok(target)
}

/// Build a container holding every file under `folder`.
///
/// Zip entries are named relative to the folder's parent so the folder name
/// is their common prefix; tar.gz stores the folder under its base name. The
/// default destination is `<folder>_<timestamp>.<ext>` in the parent.
pub fn compress_folder(
    folder: &Path,
    archive_path: Option<&Path>,
    encoding: ArchiveEncoding,
) -> Result<PathBuf, FileError> {
    let tail = encoding.container_extension()?;
    let (folder, folder_name) = resolve_folder(folder)?;
    let folder = folder.as_path();
    let parent = folder.parent().unwrap_or(Path::new("/"));

    let target = match archive_path {
        Some(path) => path.to_path_buf(),
        None => unique_appended_path(parent, &folder_name, tail, SystemTime::now()),
    };
    prepare_parent(&target)?;

    match encoding {
        ArchiveEncoding::Zip => {
            let outcome = FileScanner::new().scan(&ScanConfig::new(folder))?;
            if let Some(warning) = outcome.warnings.first() {
                return Err(FileError::io(
                    &warning.path,
                    io::Error::other(warning.message.clone()),
                ));
            }
            let entries: Vec<(PathBuf, String)> = outcome
                .files
                .into_iter()
                .map(|f| {
                    let name = entry_name(f.path.strip_prefix(parent).unwrap_or(&f.path));
                    (f.path, name)
                })
                .collect();
            write_zip(&target, &entries, &NoProgress)?;
        }
        ArchiveEncoding::TarGz => {
            let mut builder = tar_builder(&target)?;
            builder
                .append_dir_all(&folder_name, folder)
                .map_err(|e| FileError::io(folder, e))?;
            finish_tar(builder, &target)?;
        }
        ArchiveEncoding::None => {
            return Err(FileError::UnsupportedEncoding {
                encoding: encoding.to_string(),
            });
        }
    }

    info!(archive = %target.display(), folder = %folder.display(), %encoding, "folder archive written");
    Ok(target)
}

/// `name`, or `name_1`, `name_2`... with the counter before the extension,
/// whichever is not yet in `used`.
fn unique_entry_name(name: &Path, used: &mut HashSet<String>) -> String {
    let mut candidate = name.to_string_lossy().into_owned();
    let mut counter = 1u32;
    while used.contains(&candidate) {
        candidate = suffixed_name(name, &counter.to_string());
        counter += 1;
    }
    used.insert(candidate.clone());
    candidate
}

fn prepare_parent(target: &Path) -> Result<(), FileError> {
    match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

/// Archive entry name with `/` separators regardless of platform.
fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn write_container(
    target: &Path,
    encoding: ArchiveEncoding,
    entries: &[(PathBuf, String)],
    observer: &dyn ProgressObserver,
) -> Result<(), FileError> {
    match encoding {
        ArchiveEncoding::Zip => write_zip(target, entries, observer),
        ArchiveEncoding::TarGz => {
            let mut builder = tar_builder(target)?;
            let mut progress = OperationProgress::new(OperationType::Compress, entries.len());
            for (source, name) in entries {
                if observer.is_cancelled() {
                    return Err(FileError::Cancelled);
                }
                progress.set_current_file(Some(source.clone()));
                observer.on_progress(&progress);

                builder
                    .append_path_with_name(source, name)
                    .map_err(|e| FileError::io(source, e))?;
                progress.complete_file(false);
            }
            finish_tar(builder, target)
        }
        ArchiveEncoding::None => Err(FileError::UnsupportedEncoding {
            encoding: encoding.to_string(),
        }),
    }
}

fn write_zip(
    target: &Path,
    entries: &[(PathBuf, String)],
    observer: &dyn ProgressObserver,
) -> Result<(), FileError> {
    let file = File::create(target).map_err(|e| FileError::io(target, e))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .large_file(true);
    let mut progress = OperationProgress::new(OperationType::Compress, entries.len());

    for (source, name) in entries {
        if observer.is_cancelled() {
            return Err(FileError::Cancelled);
        }
        progress.set_current_file(Some(source.clone()));
        observer.on_progress(&progress);

        let mut input = File::open(source).map_err(|e| FileError::io(source, e))?;
        zip.start_file(name.as_str(), options)
            .map_err(|e| zip_error(target, e))?;
        io::copy(&mut input, &mut zip).map_err(|e| FileError::io(source, e))?;
        debug!(entry = %name, "zip entry written");
        progress.complete_file(false);
    }

    let mut writer = zip.finish().map_err(|e| zip_error(target, e))?;
    writer.flush().map_err(|e| FileError::io(target, e))
}

fn tar_builder(target: &Path) -> Result<tar::Builder<GzEncoder<BufWriter<File>>>, FileError> {
    let file = File::create(target).map_err(|e| FileError::io(target, e))?;
    let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);
    Ok(builder)
}

fn finish_tar(
    builder: tar::Builder<GzEncoder<BufWriter<File>>>,
    target: &Path,
) -> Result<(), FileError> {
    let encoder = builder.into_inner().map_err(|e| FileError::io(target, e))?;
    let mut writer = encoder.finish().map_err(|e| FileError::io(target, e))?;
    writer.flush().map_err(|e| FileError::io(target, e))
}

fn zip_error(target: &Path, err: ZipError) -> FileError {
    match err {
        ZipError::Io(e) => FileError::io(target, e),
        other => FileError::io(target, io::Error::other(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use strum::IntoEnumIterator;
    use tempfile::TempDir;

    #[test]
    fn test_encoding_parse_and_display() {
        assert_eq!(ArchiveEncoding::parse("zip").unwrap(), ArchiveEncoding::Zip);
        assert_eq!(ArchiveEncoding::parse("TAR.GZ").unwrap(), ArchiveEncoding::TarGz);
        assert_eq!(ArchiveEncoding::parse("tgz").unwrap(), ArchiveEncoding::TarGz);
        assert_eq!(ArchiveEncoding::parse("none").unwrap(), ArchiveEncoding::None);
        assert!(matches!(
            ArchiveEncoding::parse("rar"),
            Err(FileError::UnsupportedEncoding { .. })
        ));

        let names: Vec<String> = ArchiveEncoding::iter().map(|e| e.to_string()).collect();
        assert_eq!(names, vec!["none", "zip", "tar.gz"]);
    }

    #[test]
    fn test_none_is_not_a_container() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.txt");
        fs::write(&file, "a").unwrap();

        let err = compress_files(&[file], None, ArchiveEncoding::None).unwrap_err();
        assert!(matches!(err, FileError::UnsupportedEncoding { .. }));
    }

    #[test]
    fn test_empty_sources_rejected() {
        let err = compress_files(&[], None, ArchiveEncoding::Zip).unwrap_err();
        assert!(matches!(err, FileError::InvalidRequest { .. }));
    }

    #[test]
    fn test_default_destination_next_to_first_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.txt");
        fs::write(&file, "a").unwrap();

        let archive = compress_files(&[file], None, ArchiveEncoding::TarGz).unwrap();

        assert_eq!(archive.parent(), Some(temp.path()));
        let name = archive.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("archive_") && name.ends_with(".tar.gz"), "{name}");
    }

    #[test]
    fn test_missing_source_fails() {
        let temp = TempDir::new().unwrap();
        let present = temp.path().join("a.txt");
        fs::write(&present, "a").unwrap();
        let missing = temp.path().join("gone.txt");

        let err = compress_files(
            &[present, missing],
            Some(&temp.path().join("out.zip")),
            ArchiveEncoding::Zip,
        )
        .unwrap_err();
        assert!(matches!(err, FileError::NotFound { .. }));
    }

    #[test]
    fn test_unique_entry_name_counts_repeats() {
        let mut used = HashSet::new();
        let names: Vec<String> = ["notes.txt", "notes_1.txt", "notes.txt", "README", "README"]
            .into_iter()
            .map(|n| unique_entry_name(Path::new(n), &mut used))
            .collect();
        assert_eq!(
            names,
            vec!["notes.txt", "notes_1.txt", "notes_2.txt", "README", "README_1"]
        );
    }

    #[test]
    fn test_entry_name_uses_forward_slashes() {
        let rel = Path::new("photos").join("2024").join("beach.jpg");
        assert_eq!(entry_name(&rel), "photos/2024/beach.jpg");
    }
}
