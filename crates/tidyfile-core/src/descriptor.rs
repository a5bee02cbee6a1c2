//! File descriptor and content fingerprint types.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Local};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// BLAKE3 digest of a file's content, used only for equality comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentFingerprint(pub [u8; 32]);

impl ContentFingerprint {
    /// Create a new fingerprint from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Get the fingerprint as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Snapshot of a file's metadata at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// Full path as enumerated.
    pub path: PathBuf,
    /// File name (last path component).
    pub name: CompactString,
    /// Lowercased extension with leading dot, empty if none.
    pub extension: CompactString,
    /// Size in bytes.
    pub size: u64,
    /// Creation time (platform-dependent).
    pub created: Option<SystemTime>,
    /// Last modification time.
    pub modified: SystemTime,
    /// Last access time.
    pub accessed: SystemTime,
}

impl FileDescriptor {
    /// Build a descriptor from a path and its metadata.
    pub fn from_metadata(path: impl Into<PathBuf>, metadata: &std::fs::Metadata) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| CompactString::from(n.to_string_lossy()))
            .unwrap_or_default();
        let extension = extension_of(&path);

        Self {
            name,
            extension,
            size: metadata.len(),
            created: metadata.created().ok(),
            modified: metadata.modified().unwrap_or(std::time::UNIX_EPOCH),
            accessed: metadata.accessed().unwrap_or(std::time::UNIX_EPOCH),
            path,
        }
    }

    /// Check if the file was last accessed strictly before `cutoff`.
    pub fn accessed_before(&self, cutoff: SystemTime) -> bool {
        self.accessed < cutoff
    }

    /// Time since last access, relative to `reference`.
    pub fn access_age(&self, reference: SystemTime) -> Duration {
        reference
            .duration_since(self.accessed)
            .unwrap_or(Duration::ZERO)
    }

    /// Check if this descriptor has the given extension (case-insensitive).
    pub fn has_extension(&self, extension: &str) -> bool {
        self.extension
            .eq_ignore_ascii_case(&crate::normalize_extension(extension))
    }
}

/// Lowercased extension of a path with leading dot, or empty.
///
/// Dotfiles such as `.bashrc` have no extension; `archive.tar.gz` yields `.gz`.
pub fn extension_of(path: &Path) -> CompactString {
    match path.extension() {
        Some(ext) => {
            let mut out = CompactString::with_capacity(ext.len() + 1);
            out.push('.');
            out.push_str(&ext.to_string_lossy().to_lowercase());
            out
        }
        None => CompactString::default(),
    }
}

/// `YYYYMMDDHHMMSS` rendering of `time` in local time, used for collision-safe names.
pub fn timestamp_suffix(time: SystemTime) -> String {
    let local: DateTime<Local> = time.into();
    local.format("%Y%m%d%H%M%S").to_string()
}
