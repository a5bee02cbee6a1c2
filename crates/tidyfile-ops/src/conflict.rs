//! Collision-safe destination naming.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tidyfile_core::timestamp_suffix;

/// Insert `_<suffix>` between a file's stem and extension.
///
/// `report.pdf` becomes `report_<suffix>.pdf`; `notes` becomes `notes_<suffix>`.
pub fn suffixed_name(name: &Path, suffix: &str) -> String {
    let stem = name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    match name.extension() {
        Some(ext) => format!("{}_{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{stem}_{suffix}"),
    }
}

/// First free timestamped destination for `name` inside `dir`.
///
/// Tries `name_<ts>.ext`, then `name_<ts>_1.ext`, `name_<ts>_2.ext`, and so on,
/// so an existing file is never overwritten even when several collide within
/// the same second.
pub fn unique_timestamped_path(dir: &Path, name: &Path, time: SystemTime) -> PathBuf {
    let stamp = timestamp_suffix(time);
    let candidate = dir.join(suffixed_name(name, &stamp));
    if !candidate.exists() {
        return candidate;
    }

    let mut counter = 1u32;
    loop {
        let candidate = dir.join(suffixed_name(name, &format!("{stamp}_{counter}")));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// First free `dir/<name>_<ts>[_<n>]<tail>` with the suffix appended to the
/// whole `name`, as used for folder copies and container files.
pub fn unique_appended_path(dir: &Path, name: &str, tail: &str, time: SystemTime) -> PathBuf {
    let stamp = timestamp_suffix(time);
    let candidate = dir.join(format!("{name}_{stamp}{tail}"));
    if !candidate.exists() {
        return candidate;
    }

    let mut counter = 1u32;
    loop {
        let candidate = dir.join(format!("{name}_{stamp}_{counter}{tail}"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// `dir/name` if free, otherwise a unique timestamped variant.
pub fn resolve_destination(dir: &Path, name: &Path, time: SystemTime) -> PathBuf {
    let direct = dir.join(name);
    if direct.exists() {
        unique_timestamped_path(dir, name, time)
    } else {
        direct
    }
}
