//! Source-control gateway
//!
//! The release pipeline never touches a repository directly. Every git
//! operation it needs goes through the [SourceControl] trait:
//!
//! - [system::SystemGit]: shells out to `git` through a
//!   [crate::exec::CommandExecutor]
//! - [mock::MockSourceControl]: in-memory tags and branch state for tests
//!
//! Operations on a secondary clone (the registry fork) take the clone's path
//! explicitly instead of relying on the process working directory.

pub mod mock;
pub mod system;

pub use mock::MockSourceControl;
pub use system::SystemGit;

use std::path::Path;

use crate::error::Result;

/// Outcome of an operation that may find its goal already satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOutcome {
    /// The remote was added
    Added,
    /// A remote with that name already existed
    AlreadyPresent,
    /// Adding the remote failed
    Failed(String),
}

/// Git operations needed by the release pipeline.
pub trait SourceControl {
    /// Set the global commit identity.
    fn configure_identity(&self, name: &str, email: &str) -> Result<()>;

    /// Rewrite URLs starting with `prefix` to authenticated HTTPS using `token`.
    fn rewrite_url(&self, prefix: &str, token: &str) -> Result<()>;

    /// Whether `tag` exists on the remote.
    fn remote_tag_exists(&self, tag: &str) -> Result<bool>;

    /// Whether `tag` exists in the local repository.
    fn local_tag_exists(&self, tag: &str) -> Result<bool>;

    fn delete_remote_tag(&self, tag: &str) -> Result<()>;

    fn delete_local_tag(&self, tag: &str) -> Result<()>;

    /// The checked-out branch, or `None` on a detached HEAD.
    fn current_branch(&self) -> Result<Option<String>>;

    /// Create a commit with no changes.
    fn commit_empty(&self, message: &str) -> Result<()>;

    /// Push the current HEAD to `branch` on the remote.
    fn push_branch(&self, branch: &str) -> Result<()>;

    /// Clone `url` into `dest`.
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<()>;

    /// Add a remote to the repository at `repo` unless one already exists.
    fn add_remote(&self, repo: &Path, name: &str, url: &str) -> RemoteOutcome;

    fn fetch(&self, repo: &Path, remote: &str, branch: &str) -> Result<()>;

    fn checkout(&self, repo: &Path, branch: &str) -> Result<()>;

    /// Fast-forward the checked-out branch of `repo` to `target`.
    fn fast_forward(&self, repo: &Path, target: &str) -> Result<()>;
}

/// Strip the `refs/tags/` prefix from a reference.
///
/// Returns `None` for branch, pull-request, or other references.
pub fn tag_from_ref(git_ref: &str) -> Option<&str> {
    git_ref
        .strip_prefix("refs/tags/")
        .filter(|tag| !tag.is_empty())
}
