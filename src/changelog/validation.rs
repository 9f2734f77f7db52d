use std::fs;
use std::path::Path;

use super::parser::{parse_changelog, parse_changelog_file};
use super::{
    find_entry, normalize_version, ChangelogEntry, ChangelogValidation, MIN_ENTRY_LENGTH,
};
use crate::error::ChangelogError;

/// Validate changelog text for a specific version.
pub fn validate_document(document: &str, expected_version: &str) -> ChangelogValidation {
    check_entries(&parse_changelog(document), expected_version)
}

/// Validate the changelog file at `path` for a specific version.
///
/// Problems are reported in the returned value, never as an `Err`.
pub fn validate_changelog(path: &Path, expected_version: &str) -> ChangelogValidation {
    if !path.exists() {
        let mut validation = ChangelogValidation::new();
        validation.fail(format!("Changelog file not found: {}", path.display()));
        return validation;
    }

    match parse_changelog_file(path) {
        Ok(entries) => check_entries(&entries, expected_version),
        Err(e) => {
            let mut validation = ChangelogValidation::new();
            validation.fail(format!("Error validating changelog: {}", e));
            validation
        }
    }
}

fn check_entries(entries: &[ChangelogEntry], expected_version: &str) -> ChangelogValidation {
    let mut validation = ChangelogValidation::new();

    if entries.is_empty() {
        validation.fail("Changelog is empty or could not be parsed");
        return validation;
    }

    if entries
        .iter()
        .any(|e| e.is_unreleased() && !e.content.trim().is_empty())
    {
        validation.has_unreleased = true;
        validation.warn(
            "Changelog has content in the Unreleased section. \
             Consider moving it to the version section or removing it.",
        );
    }

    let Some(entry) = find_entry(entries, expected_version) else {
        let known: Vec<&str> = entries
            .iter()
            .filter(|e| !e.is_unreleased())
            .map(|e| e.version.as_str())
            .collect();
        validation.fail(format!(
            "Changelog does not contain an entry for version {}. Found versions: {}",
            expected_version,
            known.join(", ")
        ));
        return validation;
    };

    validation.has_version_entry = true;
    validation.version_content = Some(entry.content.clone());

    let content_len = entry.content.trim().chars().count();
    if content_len == 0 {
        validation.fail(format!("Changelog entry for {} is empty", expected_version));
    } else if content_len < MIN_ENTRY_LENGTH {
        validation.warn(format!(
            "Changelog entry for {} seems very short. Make sure to document all changes.",
            expected_version
        ));
    }

    validation
}

/// Render the standalone document for one entry.
///
/// The header repeats `version` exactly as the caller wrote it.
fn render_entry(version: &str, entry: &ChangelogEntry) -> String {
    let date = entry
        .date
        .as_ref()
        .map(|d| format!(" ({})", d))
        .unwrap_or_default();
    format!("## {}{}\n\n{}\n", version, date, entry.content)
}

/// Write the changelog section for `version` to `output_path`.
///
/// Callers are expected to run [`validate_changelog`] first; a missing entry
/// here is reported as [`ChangelogError::VersionNotFound`].
pub fn extract_version_changelog(
    changelog_path: &Path,
    version: &str,
    output_path: &Path,
) -> Result<(), ChangelogError> {
    let entries = parse_changelog_file(changelog_path)?;

    let entry = find_entry(&entries, version).ok_or_else(|| ChangelogError::VersionNotFound {
        version: version.to_string(),
    })?;

    tracing::debug!(
        "Extracting changelog for {} (normalized {})",
        version,
        normalize_version(version)
    );

    fs::write(output_path, render_entry(version, entry)).map_err(|source| {
        ChangelogError::Write {
            path: output_path.to_path_buf(),
            source,
        }
    })
}
