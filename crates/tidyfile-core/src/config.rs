//! Scan configuration and classification rules.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for enumerating a directory tree.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Root path to scan.
    pub root: PathBuf,

    /// Follow symbolic links.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Maximum depth to traverse (None = unlimited).
    #[builder(default)]
    #[serde(default)]
    pub max_depth: Option<u32>,

    /// Directory names whose whole subtree is skipped.
    #[builder(default)]
    #[serde(default)]
    pub skip_dirs: BTreeSet<String>,

    /// Include hidden files (starting with .).
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub include_hidden: bool,
}

fn default_true() -> bool {
    true
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a simple config for scanning a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            follow_symlinks: false,
            max_depth: None,
            skip_dirs: BTreeSet::new(),
            include_hidden: true,
        }
    }

    /// Skip every subtree whose directory name is one of `names`.
    pub fn with_skip_dirs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_dirs.extend(names.into_iter().map(Into::into));
        self
    }

    /// Check if a directory subtree should be skipped.
    pub fn should_skip_dir(&self, name: &str) -> bool {
        self.skip_dirs.contains(name)
    }

    /// Check if hidden files should be skipped.
    pub fn should_skip_hidden(&self, name: &str) -> bool {
        !self.include_hidden && name.starts_with('.')
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

/// Built-in extension table. Every entry maps to `<ext>_only`.
const DEFAULT_EXTENSIONS: &[&str] = &[
    "pdf", "jpg", "png", "jpeg", "docx", "pptx", "doc", "txt", "xlsx", "zip", "mp3", "mp4",
    "exe", "dll", "html", "css", "js", "py", "java", "c", "cpp", "h", "json", "xml", "csv",
];

/// Normalize an extension to lowercase with a single leading dot.
///
/// `"TXT"`, `".txt"` and `".Txt"` all become `".txt"`. An empty input stays empty.
pub fn normalize_extension(ext: &str) -> String {
    let trimmed = ext.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(".{}", trimmed.to_lowercase())
    }
}

/// Immutable mapping from file extension to destination folder name.
///
/// The default table covers common document, media, and source types. A custom
/// table can be built from pairs or loaded from TOML:
///
/// ```toml
/// [rules]
/// ".txt" = "text"
/// ".md" = "text"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationRules {
    rules: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct RulesFile {
    rules: BTreeMap<String, String>,
}

impl ClassificationRules {
    /// Build a rule set from `(extension, folder)` pairs.
    pub fn from_pairs<I, E, F>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (E, F)>,
        E: AsRef<str>,
        F: Into<String>,
    {
        let mut rules = BTreeMap::new();
        for (ext, folder) in pairs {
            let ext = normalize_extension(ext.as_ref());
            let folder = folder.into();
            if ext.is_empty() {
                return Err(ConfigError::InvalidRule {
                    message: "extension cannot be empty".to_string(),
                });
            }
            if folder.is_empty() || folder.contains(['/', '\\']) || folder == "." || folder == ".." {
                return Err(ConfigError::InvalidRule {
                    message: format!("folder for {ext} must be a plain directory name, got {folder:?}"),
                });
            }
            rules.insert(ext, folder);
        }
        Ok(Self { rules })
    }

    /// Parse a rule set from a TOML document with a `[rules]` table.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let file: RulesFile = toml::from_str(s)?;
        Self::from_pairs(file.rules)
    }

    /// Load a rule set from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Destination folder for an extension, if it is known.
    pub fn folder_for(&self, extension: &str) -> Option<&str> {
        self.rules.get(&normalize_extension(extension)).map(String::as_str)
    }

    /// Check whether an extension has a rule.
    pub fn contains(&self, extension: &str) -> bool {
        self.folder_for(extension).is_some()
    }

    /// All distinct destination folder names.
    pub fn folder_names(&self) -> BTreeSet<&str> {
        self.rules.values().map(String::as_str).collect()
    }

    /// Iterate over `(extension, folder)` pairs in extension order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rules.iter().map(|(e, f)| (e.as_str(), f.as_str()))
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for ClassificationRules {
    fn default() -> Self {
        let rules = DEFAULT_EXTENSIONS
            .iter()
            .map(|ext| (format!(".{ext}"), format!("{ext}_only")))
            .collect();
        Self { rules }
    }
}
