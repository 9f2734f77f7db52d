//! The external release tool and the registry fork it submits from.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::boundary::BoundaryWarning;
use crate::config::{RegistryConfig, ToolConfig};
use crate::error::{ReleaseError, Result};
use crate::exec::CommandSpec;
use crate::git::{RemoteOutcome, SourceControl};

/// Name of the release tool's configuration file.
pub const TOOL_CONFIG_FILE: &str = "release.yml";

/// Builds invocations of the release tool (`dune-release`).
#[derive(Debug, Clone)]
pub struct ReleaseTool {
    command: Vec<String>,
    delegate: String,
}

impl ReleaseTool {
    pub fn new(config: &ToolConfig) -> Self {
        ReleaseTool {
            command: config.command.clone(),
            delegate: config.delegate.clone(),
        }
    }

    /// Program that has to be on the search path for the tool to run.
    pub fn launcher(&self) -> &str {
        self.command.first().map(String::as_str).unwrap_or("dune-release")
    }

    /// Display name of the tool itself (last element of the command).
    pub fn name(&self) -> &str {
        self.command.last().map(String::as_str).unwrap_or("dune-release")
    }

    fn spec<I, S>(&self, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parts = self.command.iter();
        let program = parts.next().cloned().unwrap_or_else(|| "dune-release".to_string());
        CommandSpec::new(program).args(parts.cloned()).args(args)
    }

    /// Attach the credential environment used by publish and submit.
    fn authenticated(&self, spec: CommandSpec, token: &str) -> CommandSpec {
        spec.env("DUNE_RELEASE_DELEGATE", self.delegate.clone())
            .env("GITHUB_TOKEN", token)
            .secret(token)
    }

    fn change_log_arg(changelog: &Path) -> String {
        format!("--change-log={}", changelog.display())
    }

    pub fn probe(&self) -> CommandSpec {
        self.spec(["--version"]).quiet()
    }

    pub fn lint(&self) -> CommandSpec {
        self.spec(["lint"])
    }

    /// Build the distribution archive; tests and lint are covered elsewhere.
    pub fn distrib(&self) -> CommandSpec {
        self.spec(["distrib", "--skip-tests", "--skip-lint"])
    }

    pub fn publish(&self, changelog: &Path, token: &str) -> CommandSpec {
        let spec = self
            .spec(["publish", "--yes"])
            .arg(Self::change_log_arg(changelog));
        self.authenticated(spec, token)
    }

    pub fn opam_pkg(&self, package: &str, changelog: &Path) -> CommandSpec {
        self.spec(["opam", "pkg", "-p", package, "--yes"])
            .arg(Self::change_log_arg(changelog))
    }

    pub fn opam_submit(&self, changelog: &Path, token: &str, workspace: &Path) -> CommandSpec {
        let spec = self
            .spec(["opam", "submit", "--yes"])
            .arg(Self::change_log_arg(changelog))
            .cwd(workspace);
        self.authenticated(spec, token)
    }
}

/// Contents of the release tool's `release.yml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSettingsFile {
    pub user: String,
    pub remote: String,
    pub local: PathBuf,
}

/// Write `release.yml` into `dir`, creating the directory if needed.
pub fn write_tool_settings(dir: &Path, settings: &ToolSettingsFile) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let text = serde_yaml::to_string(settings).map_err(|e| {
        ReleaseError::configuration(format!("Cannot serialize {}: {}", TOOL_CONFIG_FILE, e))
    })?;
    let path = dir.join(TOOL_CONFIG_FILE);
    fs::write(&path, text)?;
    tracing::debug!("Release tool configuration written to {}", path.display());
    Ok(path)
}

/// Clone the registry fork into `local` and bring it up to date with upstream.
///
/// Clone, fetch, and checkout failures are fatal. A failed fast-forward only
/// means the fork is stale and is returned as a warning, as is a parent
/// directory that could not be created (the clone may still succeed).
pub fn prepare_registry_fork<G: SourceControl + ?Sized>(
    git: &G,
    registry: &RegistryConfig,
    local: &Path,
) -> Result<Vec<BoundaryWarning>> {
    let mut warnings = Vec::new();

    if let Some(parent) = local.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warnings.push(BoundaryWarning::DirectoryCreateFailed {
                path: parent.to_path_buf(),
                reason: e.to_string(),
            });
        }
    }

    git.clone_repo(&registry.fork_url(), local)?;

    match git.add_remote(local, "upstream", &registry.upstream_url) {
        RemoteOutcome::Added => tracing::debug!("Added upstream remote"),
        RemoteOutcome::AlreadyPresent => tracing::debug!("Upstream remote already exists"),
        RemoteOutcome::Failed(reason) => {
            return Err(ReleaseError::configuration(format!(
                "Could not add upstream remote to {}: {}",
                local.display(),
                reason
            )))
        }
    }

    git.fetch(local, "upstream", &registry.branch)?;
    git.checkout(local, &registry.branch)?;

    let target = format!("upstream/{}", registry.branch);
    if let Err(e) = git.fast_forward(local, &target) {
        warnings.push(BoundaryWarning::ForkOutOfSync {
            reason: e.to_string(),
        });
    }

    Ok(warnings)
}
