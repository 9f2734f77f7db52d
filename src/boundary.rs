use std::fmt;
use std::path::PathBuf;

/// Where a tag lives during rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagScope {
    Remote,
    Local,
}

impl fmt::Display for TagScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagScope::Remote => write!(f, "remote"),
            TagScope::Local => write!(f, "local"),
        }
    }
}

/// Warnings raised around the edges of a release run.
/// These are non-fatal issues that should be reported to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// The release tag is already on the remote (a re-run or manual retry)
    TagAlreadyOnRemote { tag: String },
    /// Could not ask the remote about the tag
    TagQueryFailed { tag: String, reason: String },
    /// Advice from changelog validation
    Changelog(String),
    /// A directory needed later could not be created up front
    DirectoryCreateFailed { path: PathBuf, reason: String },
    /// The registry fork could not be fast-forwarded to upstream
    ForkOutOfSync { reason: String },
    /// Authenticated URL rewriting before rollback failed
    UrlRewriteFailed { reason: String },
    /// Deleting the release tag during rollback failed
    TagCleanupFailed {
        tag: String,
        scope: TagScope,
        reason: String,
    },
    /// The extracted changelog could not be removed
    ArtifactCleanupFailed { path: PathBuf, reason: String },
    /// The tracking commit was not created or pushed
    TrackingCommitSkipped { reason: String },
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::TagAlreadyOnRemote { tag } => write!(
                f,
                "Tag '{}' already exists on the remote; continuing as a re-run",
                tag
            ),
            BoundaryWarning::TagQueryFailed { tag, reason } => {
                write!(f, "Could not check remote for tag '{}': {}", tag, reason)
            }
            BoundaryWarning::Changelog(message) => write!(f, "{}", message),
            BoundaryWarning::DirectoryCreateFailed { path, reason } => {
                write!(f, "Could not create directory {}: {}", path.display(), reason)
            }
            BoundaryWarning::ForkOutOfSync { reason } => write!(
                f,
                "Your fork may be out of sync with upstream: {}",
                reason
            ),
            BoundaryWarning::UrlRewriteFailed { reason } => {
                write!(f, "Could not configure credentials for rollback: {}", reason)
            }
            BoundaryWarning::TagCleanupFailed { tag, scope, reason } => {
                write!(f, "Failed to delete {} tag '{}': {}", scope, tag, reason)
            }
            BoundaryWarning::ArtifactCleanupFailed { path, reason } => write!(
                f,
                "Failed to remove temporary changelog {}: {}",
                path.display(),
                reason
            ),
            BoundaryWarning::TrackingCommitSkipped { reason } => {
                write!(f, "Skipping release tracking commit: {}", reason)
            }
        }
    }
}
