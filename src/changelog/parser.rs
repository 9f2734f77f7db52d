use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use super::{ChangelogEntry, UNRELEASED};
use crate::error::ChangelogError;

fn version_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^##\s+v?(\d+\.\d+\.\d+(?:-[a-zA-Z0-9.]+)?)\s*(?:\(([^)]+)\))?")
            .expect("version header pattern is valid")
    })
}

fn unreleased_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^#{1,2}\s+Unreleased").expect("unreleased header pattern is valid")
    })
}

/// Recognize a section header, returning the entry it opens.
fn parse_header(line: &str) -> Option<ChangelogEntry> {
    if let Some(caps) = version_header().captures(line) {
        return Some(ChangelogEntry {
            version: caps[1].to_string(),
            date: caps.get(2).map(|m| m.as_str().to_string()),
            content: String::new(),
        });
    }

    if unreleased_header().is_match(line) {
        return Some(ChangelogEntry {
            version: UNRELEASED.to_string(),
            date: None,
            content: String::new(),
        });
    }

    None
}

/// Parse changelog text into entries, in document order.
///
/// Text before the first header is ignored. Each entry's content is the
/// trimmed text up to the next header.
pub fn parse_changelog(document: &str) -> Vec<ChangelogEntry> {
    let mut entries = Vec::new();
    let mut current: Option<ChangelogEntry> = None;
    let mut lines: Vec<&str> = Vec::new();

    for line in document.lines() {
        if let Some(next) = parse_header(line) {
            if let Some(mut entry) = current.take() {
                entry.content = lines.join("\n").trim().to_string();
                entries.push(entry);
            }
            current = Some(next);
            lines.clear();
        } else if current.is_some() {
            lines.push(line);
        }
    }

    if let Some(mut entry) = current {
        entry.content = lines.join("\n").trim().to_string();
        entries.push(entry);
    }

    entries
}

/// Read and parse a changelog file.
pub fn parse_changelog_file(path: &Path) -> Result<Vec<ChangelogEntry>, ChangelogError> {
    let document = fs::read_to_string(path).map_err(|source| ChangelogError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_changelog(&document))
}
