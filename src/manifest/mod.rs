//! Dependency manifest handling
//!
//! Parses `requirements.txt`-style manifests and the installed-package
//! list reported by `pip list --format=json`, and computes which
//! requirements are missing. Names are compared in normalized form
//! (lowercase, with `-`, `_` and `.` treated as equivalent), matching how
//! the package index treats them.

use crate::errors::{LaunchError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// One requirement line from the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Normalized package name
    pub name: String,

    /// Raw version constraint tail (`==2.31.0`, `>=1.0,<2`), empty if none
    pub spec: String,
}

/// One entry from `pip list --format=json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstalledPackage {
    pub name: String,
    pub version: String,
}

/// Normalize a package name per index rules
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .to_ascii_lowercase()
        .replace(['_', '.'], "-")
}

/// Parse the full manifest text into requirements.
///
/// Comment lines, blank lines, and pip option lines (`-r`, `-e`,
/// `--index-url`, ...) are skipped. Inline comments, extras brackets, and
/// environment-marker tails are stripped before the name is taken.
pub fn parse_manifest(text: &str) -> Result<Vec<Requirement>> {
    let mut requirements = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = strip_inline_comment(raw).trim();

        if line.is_empty() || line.starts_with('#') || line.starts_with('-') {
            continue;
        }

        // Environment markers apply to the install decision pip makes, not
        // to name extraction.
        let line = line.split(';').next().unwrap_or("").trim();

        // Direct-reference requirements: `name @ https://...`
        let line = line.split(" @ ").next().unwrap_or("").trim();

        let name_end = line
            .find(|c: char| ['[', '<', '>', '=', '!', '~', ' '].contains(&c))
            .unwrap_or(line.len());
        let name = &line[..name_end];

        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || "-_.".contains(c)) {
            return Err(LaunchError::ManifestParse {
                line: idx + 1,
                text: raw.to_string(),
            });
        }

        let mut spec = line[name_end..].trim_start();
        if let Some(bracket_end) = spec.strip_prefix('[').and_then(|rest| rest.find(']')) {
            spec = spec[bracket_end + 2..].trim_start();
        }

        requirements.push(Requirement {
            name: normalize_name(name),
            spec: spec.trim().to_string(),
        });
    }

    Ok(requirements)
}

/// Read and parse a manifest file; absence is the fatal `ManifestMissing`
pub fn load_manifest(path: &Path) -> Result<Vec<Requirement>> {
    if !path.exists() {
        return Err(LaunchError::ManifestMissing {
            path: path.display().to_string(),
        });
    }

    let text = std::fs::read_to_string(path)?;
    parse_manifest(&text)
}

/// Decode the JSON package list printed by `pip list --format=json`
pub fn parse_installed(json: &str) -> Result<Vec<InstalledPackage>> {
    serde_json::from_str(json.trim())
        .map_err(|e| LaunchError::PackageListError(e.to_string()))
}

/// Requirement names not present in the installed set
pub fn missing_requirements(
    requirements: &[Requirement],
    installed: &[InstalledPackage],
) -> Vec<String> {
    let have: HashSet<String> = installed
        .iter()
        .map(|p| normalize_name(&p.name))
        .collect();

    requirements
        .iter()
        .filter(|r| !have.contains(&r.name))
        .map(|r| r.name.clone())
        .collect()
}

/// Whether the manifest names a package
pub fn requires_package(requirements: &[Requirement], name: &str) -> bool {
    let wanted = normalize_name(name);
    requirements.iter().any(|r| r.name == wanted)
}

fn strip_inline_comment(line: &str) -> &str {
    // A '#' that starts the line or follows whitespace begins a comment
    match line.find(" #") {
        Some(pos) => &line[..pos],
        None => line,
    }
}
