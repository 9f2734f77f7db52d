//! Changelog engine
//!
//! Parses a Markdown changelog into per-version entries, checks that a
//! release version has a usable entry, and extracts that entry into a
//! standalone document for the release tool.
//!
//! Supported headers:
//!
//! ```text
//! ## v1.0.0 (2025-01-13)
//! ## 1.0.0
//! ## 1.0.0-beta.1
//! # Unreleased
//! ```
//!
//! Parsing is deliberately permissive: unusual Markdown produces odd or empty
//! entries, never an error. Only reading and writing files can fail.

pub mod parser;
pub mod validation;

pub use parser::{parse_changelog, parse_changelog_file};
pub use validation::{extract_version_changelog, validate_changelog, validate_document};

/// Version marker used for the `Unreleased` section.
pub const UNRELEASED: &str = "unreleased";

/// Trimmed content shorter than this triggers a "very short" warning.
pub const MIN_ENTRY_LENGTH: usize = 20;

/// One section of a changelog document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogEntry {
    /// Version without the `v` prefix, or [`UNRELEASED`]
    pub version: String,
    /// Date from a parenthesized header suffix, if any
    pub date: Option<String>,
    /// Trimmed text between this header and the next
    pub content: String,
}

impl ChangelogEntry {
    pub fn is_unreleased(&self) -> bool {
        self.version == UNRELEASED
    }

    /// Whether this entry belongs to `version`, with or without a `v` prefix.
    ///
    /// The unreleased section never matches.
    pub fn matches_version(&self, version: &str) -> bool {
        if self.is_unreleased() {
            return false;
        }
        let normalized = normalize_version(version);
        self.version == normalized || self.version == format!("v{}", normalized)
    }
}

/// Outcome of validating a changelog against a release version.
///
/// Every field is populated on every path; callers decide what to do with
/// `valid == false`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangelogValidation {
    pub valid: bool,
    pub has_unreleased: bool,
    pub has_version_entry: bool,
    pub version_content: Option<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ChangelogValidation {
    fn new() -> Self {
        ChangelogValidation {
            valid: true,
            ..Default::default()
        }
    }

    /// Record an error; a validation with errors is never valid.
    fn fail(&mut self, error: impl Into<String>) {
        self.valid = false;
        self.errors.push(error.into());
    }

    fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

/// Strip one leading `v` from a version string.
pub fn normalize_version(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}

/// Find the entry for `version` in document order.
pub fn find_entry<'a>(entries: &'a [ChangelogEntry], version: &str) -> Option<&'a ChangelogEntry> {
    entries.iter().find(|e| e.matches_version(version))
}
