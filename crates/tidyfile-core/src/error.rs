//! Error types shared across tidyfile.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by file-level operations (read, hash, move, copy, delete, archive).
#[derive(Debug, Error)]
pub enum FileError {
    /// The path vanished or never existed.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    AccessDenied { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Archive encoding outside the supported set.
    #[error("Unsupported archive encoding: {encoding}")]
    UnsupportedEncoding { encoding: String },

    /// The request itself is unusable (empty source list, bad destination, ...).
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Some items in a batch failed while others succeeded.
    #[error("{failed} of {} items failed", .succeeded + .failed)]
    PartialBatchFailure { succeeded: usize, failed: usize },

    /// The host cancelled the operation.
    #[error("Operation cancelled")]
    Cancelled,
}

impl FileError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::AccessDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create a not-found error.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create an invalid request error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Classify this error for a per-item failure record.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NotFound { .. } => FailureKind::NotFound,
            Self::AccessDenied { .. } => FailureKind::AccessDenied,
            Self::Cancelled => FailureKind::Cancelled,
            _ => FailureKind::Io,
        }
    }
}

/// Kind of a single failed item inside a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    NotFound,
    AccessDenied,
    Io,
    /// Skipped because the host cancelled the batch.
    Cancelled,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::AccessDenied => write!(f, "access denied"),
            Self::Io => write!(f, "I/O error"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Errors that abort a whole tree enumeration.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

impl From<ScanError> for FileError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::PermissionDenied { path } => Self::AccessDenied { path },
            ScanError::NotFound { path } => Self::NotFound { path },
            ScanError::Io { path, source } => Self::Io { path, source },
            ScanError::NotADirectory { path } => Self::InvalidRequest {
                message: format!("not a directory: {}", path.display()),
            },
            ScanError::InvalidConfig { message } => Self::InvalidRequest { message },
        }
    }
}

/// Errors loading classification rules or other configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Could not read the configuration file.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for the expected shape.
    #[error("Failed to parse rules: {0}")]
    Parse(#[from] toml::de::Error),

    /// A rule is structurally invalid.
    #[error("Invalid rule: {message}")]
    InvalidRule { message: String },
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Permission was denied.
    PermissionDenied,
    /// Error reading a directory entry.
    ReadError,
    /// Error reading metadata (often a path removed mid-scan).
    MetadataError,
}

/// Non-fatal warning encountered during a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a warning from a failed metadata read.
    pub fn from_file_error(err: &FileError) -> Self {
        let (path, kind) = match err {
            FileError::AccessDenied { path } => (path.clone(), WarningKind::PermissionDenied),
            FileError::NotFound { path } | FileError::Io { path, .. } => {
                (path.clone(), WarningKind::MetadataError)
            }
            _ => (PathBuf::new(), WarningKind::ReadError),
        };
        Self {
            path,
            message: err.to_string(),
            kind,
        }
    }
}
