use std::cell::RefCell;
use std::collections::HashSet;
use std::path::Path;

use crate::error::{ReleaseError, Result};
use crate::git::{RemoteOutcome, SourceControl};

/// Mock gateway for testing without a repository.
///
/// Keeps local and remote tag sets in memory and records every mutating call
/// as a short event string (e.g. `"delete-remote v1.0.0"`).
#[derive(Debug, Default)]
pub struct MockSourceControl {
    remote_tags: RefCell<HashSet<String>>,
    local_tags: RefCell<HashSet<String>>,
    branch: Option<String>,
    failing: HashSet<&'static str>,
    events: RefCell<Vec<String>>,
}

impl MockSourceControl {
    /// Create a gateway with no tags and a detached HEAD
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_remote_tag(&mut self, tag: impl Into<String>) {
        self.remote_tags.get_mut().insert(tag.into());
    }

    pub fn add_local_tag(&mut self, tag: impl Into<String>) {
        self.local_tags.get_mut().insert(tag.into());
    }

    pub fn set_branch(&mut self, branch: impl Into<String>) {
        self.branch = Some(branch.into());
    }

    /// Make an operation fail.
    ///
    /// Names: `identity`, `rewrite-url`, `remote-query`, `local-query`,
    /// `delete-remote`, `delete-local`, `commit`, `push`, `clone`, `fetch`,
    /// `checkout`, `fast-forward`, `add-remote`.
    pub fn fail(&mut self, operation: &'static str) {
        self.failing.insert(operation);
    }

    /// Recorded events, in order
    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    pub fn has_remote_tag(&self, tag: &str) -> bool {
        self.remote_tags.borrow().contains(tag)
    }

    pub fn has_local_tag(&self, tag: &str) -> bool {
        self.local_tags.borrow().contains(tag)
    }

    fn record(&self, operation: &'static str, detail: &str) -> Result<()> {
        self.events
            .borrow_mut()
            .push(format!("{} {}", operation, detail).trim_end().to_string());
        if self.failing.contains(operation) {
            return Err(ReleaseError::CommandFailed {
                command: format!("git {}", operation),
                status: 1,
                stderr: format!("mock failure: {}", operation),
            });
        }
        Ok(())
    }
}

impl SourceControl for MockSourceControl {
    fn configure_identity(&self, name: &str, email: &str) -> Result<()> {
        self.record("identity", &format!("{} <{}>", name, email))
    }

    fn rewrite_url(&self, prefix: &str, _token: &str) -> Result<()> {
        self.record("rewrite-url", prefix)
    }

    fn remote_tag_exists(&self, tag: &str) -> Result<bool> {
        self.record("remote-query", tag)?;
        Ok(self.has_remote_tag(tag))
    }

    fn local_tag_exists(&self, tag: &str) -> Result<bool> {
        self.record("local-query", tag)?;
        Ok(self.has_local_tag(tag))
    }

    fn delete_remote_tag(&self, tag: &str) -> Result<()> {
        self.record("delete-remote", tag)?;
        self.remote_tags.borrow_mut().remove(tag);
        Ok(())
    }

    fn delete_local_tag(&self, tag: &str) -> Result<()> {
        self.record("delete-local", tag)?;
        self.local_tags.borrow_mut().remove(tag);
        Ok(())
    }

    fn current_branch(&self) -> Result<Option<String>> {
        Ok(self.branch.clone())
    }

    fn commit_empty(&self, message: &str) -> Result<()> {
        self.record("commit", message)
    }

    fn push_branch(&self, branch: &str) -> Result<()> {
        self.record("push", branch)
    }

    fn clone_repo(&self, url: &str, _dest: &Path) -> Result<()> {
        self.record("clone", url)
    }

    fn add_remote(&self, _repo: &Path, name: &str, _url: &str) -> RemoteOutcome {
        match self.record("add-remote", name) {
            Ok(()) => RemoteOutcome::Added,
            Err(e) => RemoteOutcome::Failed(e.to_string()),
        }
    }

    fn fetch(&self, _repo: &Path, remote: &str, branch: &str) -> Result<()> {
        self.record("fetch", &format!("{} {}", remote, branch))
    }

    fn checkout(&self, _repo: &Path, branch: &str) -> Result<()> {
        self.record("checkout", branch)
    }

    fn fast_forward(&self, _repo: &Path, target: &str) -> Result<()> {
        self.record("fast-forward", target)
    }
}
