use std::fmt;

use crate::error::{ReleaseError, Result};
use crate::git::tag_from_ref;

/// The version being released, as derived from the triggering tag.
///
/// Keeps the tag exactly as written (e.g. `v1.2.3`) next to its parsed
/// semantic version, since tag names and changelog headers may disagree on
/// the `v` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseVersion {
    pub tag: String,
    pub semver: semver::Version,
}

impl ReleaseVersion {
    /// Parses a release version from a tag name.
    ///
    /// Accepts an optional leading `v`; the rest must be a semantic version.
    ///
    /// # Example
    /// ```ignore
    /// let v = ReleaseVersion::from_tag("v1.2.3").unwrap();
    /// assert_eq!(v.semver, semver::Version::new(1, 2, 3));
    /// ```
    pub fn from_tag(tag: &str) -> Result<Self> {
        let bare = tag.strip_prefix('v').unwrap_or(tag);
        let semver = semver::Version::parse(bare).map_err(|e| {
            ReleaseError::configuration(format!(
                "Tag '{}' is not a semantic version: {}",
                tag, e
            ))
        })?;
        Ok(ReleaseVersion {
            tag: tag.to_string(),
            semver,
        })
    }

    pub fn is_prerelease(&self) -> bool {
        !self.semver.pre.is_empty()
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag)
    }
}

/// Derives the release version from a VCS reference.
///
/// # Arguments
/// * `git_ref` - Full reference, e.g. `refs/tags/v1.2.3`
///
/// # Returns
/// * `Ok(ReleaseVersion)` - The tag and its parsed version
/// * `Err` - If the reference is a branch or pull request, or the tag is not a
///   semantic version
pub fn resolve_version(git_ref: &str) -> Result<ReleaseVersion> {
    let tag = tag_from_ref(git_ref).ok_or_else(|| {
        ReleaseError::configuration(format!(
            "Reference '{}' is not a tag. Releases must be triggered by pushing a version tag (refs/tags/<version>).",
            git_ref
        ))
    })?;
    ReleaseVersion::from_tag(tag)
}
