use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;
use tidyfile_core::{
    ClassificationRules, ContentFingerprint, FailureKind, FileDescriptor, FileError, ScanConfig,
    extension_of, normalize_extension,
};

#[test]
fn test_fingerprint_equality() {
    let a = ContentFingerprint::new([0x11; 32]);
    let b = ContentFingerprint::new([0x11; 32]);
    let c = ContentFingerprint::new([0x22; 32]);

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert!(a.to_hex().chars().all(|ch| ch.is_ascii_hexdigit()));
}

#[test]
fn test_descriptor_serialization_roundtrip() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("data.json");
    fs::write(&path, "{}").unwrap();

    let desc = FileDescriptor::from_metadata(&path, &fs::metadata(&path).unwrap());
    let json = serde_json::to_string(&desc).unwrap();
    let back: FileDescriptor = serde_json::from_str(&json).unwrap();

    assert_eq!(desc, back);
}

#[test]
fn test_descriptor_access_age_never_negative() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("future.txt");
    fs::write(&path, "x").unwrap();
    let desc = FileDescriptor::from_metadata(&path, &fs::metadata(&path).unwrap());

    let earlier = desc.accessed - Duration::from_secs(60);
    assert_eq!(desc.access_age(earlier), Duration::ZERO);
}

#[test]
fn test_scan_config_serde_defaults() {
    let config: ScanConfig = serde_json::from_str(r#"{"root": "/data"}"#).unwrap();

    assert_eq!(config.root, PathBuf::from("/data"));
    assert!(config.include_hidden);
    assert!(!config.follow_symlinks);
    assert!(config.skip_dirs.is_empty());
}

#[test]
fn test_rules_lookup_is_case_insensitive() {
    let rules = ClassificationRules::default();

    for ext in [".TXT", "txt", ".txt", "Txt"] {
        assert_eq!(rules.folder_for(ext), Some("txt_only"), "lookup for {ext}");
    }
    assert!(!rules.contains(".unknownext"));
}

#[test]
fn test_rules_load_from_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("rules.toml");
    fs::write(&path, "[rules]\n\".log\" = \"logs\"\n").unwrap();

    let rules = ClassificationRules::load(&path).unwrap();
    assert_eq!(rules.folder_for(".log"), Some("logs"));
    assert_eq!(rules.iter().count(), 1);
}

#[test]
fn test_rules_load_missing_file() {
    let err = ClassificationRules::load(std::path::Path::new("/definitely/not/here.toml"));
    assert!(err.is_err());
}

#[test]
fn test_error_kinds() {
    assert_eq!(FileError::not_found("/x").kind(), FailureKind::NotFound);
    assert_eq!(FileError::Cancelled.kind(), FailureKind::Cancelled);
    assert_eq!(
        FileError::UnsupportedEncoding {
            encoding: "rar".into()
        }
        .to_string(),
        "Unsupported archive encoding: rar"
    );
}

#[test]
fn test_extension_helpers_agree() {
    let path = PathBuf::from("/tmp/Photo.JPEG");
    assert_eq!(extension_of(&path), normalize_extension("JPEG").as_str());
}
