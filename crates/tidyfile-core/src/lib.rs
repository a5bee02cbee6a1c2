//! Core types and configuration for tidyfile.
//!
//! This crate provides the data model shared by the rest of the workspace:
//! file descriptors, content fingerprints, the error taxonomy, and the
//! scan and classification configuration.

mod config;
mod descriptor;
mod error;

pub use config::{ClassificationRules, ScanConfig, ScanConfigBuilder, normalize_extension};
pub use descriptor::{ContentFingerprint, FileDescriptor, extension_of, timestamp_suffix};
pub use error::{ConfigError, FailureKind, FileError, ScanError, ScanWarning, WarningKind};
