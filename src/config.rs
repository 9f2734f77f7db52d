use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{ReleaseError, Result};
use crate::git::tag_from_ref;

/// Settings file looked up in the working directory.
pub const SETTINGS_FILE: &str = "dune-publish.toml";

/// Changelog used when none is given.
pub const DEFAULT_CHANGELOG: &str = "./CHANGES.md";

/// Registry fork location on CI runners.
pub const RUNNER_REGISTRY_PATH: &str = "/home/runner/git/opam-repository";

/// Registry fork location everywhere else.
pub const LOCAL_REGISTRY_PATH: &str = "/tmp/opam-repository-test";

/// File-backed settings for dune-publish.
///
/// Everything here has a sensible default, so the settings file is optional.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Settings {
    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub git: GitConfig,

    #[serde(default)]
    pub tool: ToolConfig,

    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub release: ReleaseBehavior,
}

fn default_identity_name() -> String {
    "GitHub Actions".to_string()
}

fn default_identity_email() -> String {
    "actions@github.com".to_string()
}

/// Commit identity configured before any authenticated git operation.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct IdentityConfig {
    #[serde(default = "default_identity_name")]
    pub name: String,

    #[serde(default = "default_identity_email")]
    pub email: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        IdentityConfig {
            name: default_identity_name(),
            email: default_identity_email(),
        }
    }
}

fn default_remote() -> String {
    "origin".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GitConfig {
    /// Remote holding the release tag
    #[serde(default = "default_remote")]
    pub remote: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        GitConfig {
            remote: default_remote(),
        }
    }
}

fn default_tool_command() -> Vec<String> {
    vec![
        "opam".to_string(),
        "exec".to_string(),
        "--".to_string(),
        "dune-release".to_string(),
    ]
}

fn default_delegate() -> String {
    "github-dune-release".to_string()
}

/// How the release tool is invoked.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ToolConfig {
    /// Command prefix; subcommands are appended to it
    #[serde(default = "default_tool_command")]
    pub command: Vec<String>,

    /// Value of `DUNE_RELEASE_DELEGATE` for publish and submit
    #[serde(default = "default_delegate")]
    pub delegate: String,

    /// Directory for the tool's `release.yml`; defaults to `~/.config/dune`
    #[serde(default)]
    pub config_dir: Option<PathBuf>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        ToolConfig {
            command: default_tool_command(),
            delegate: default_delegate(),
            config_dir: None,
        }
    }
}

impl ToolConfig {
    /// Directory holding the release tool's own configuration.
    pub fn config_dir(&self) -> Option<PathBuf> {
        self.config_dir
            .clone()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config").join("dune")))
    }
}

fn default_upstream_url() -> String {
    "https://github.com/ocaml/opam-repository.git".to_string()
}

fn default_fork() -> String {
    "ocaml/opam-repository".to_string()
}

fn default_registry_branch() -> String {
    "master".to_string()
}

/// Package registry that receives the submission.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RegistryConfig {
    #[serde(default = "default_upstream_url")]
    pub upstream_url: String,

    /// Fork slug (`owner/name`) the release tool pushes to
    #[serde(default = "default_fork")]
    pub fork: String,

    #[serde(default = "default_registry_branch")]
    pub branch: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            upstream_url: default_upstream_url(),
            fork: default_fork(),
            branch: default_registry_branch(),
        }
    }
}

impl RegistryConfig {
    /// SSH URL of the fork, as the release tool expects it.
    pub fn fork_url(&self) -> String {
        format!("git@github.com:{}", self.fork)
    }

    /// Where submitted pull requests can be followed.
    pub fn pulls_url(&self) -> String {
        let slug = self
            .upstream_url
            .trim_end_matches(".git")
            .trim_start_matches("https://github.com/");
        format!("https://github.com/{}/pulls", slug)
    }
}

/// Post-release behavior.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct ReleaseBehavior {
    /// Push an empty commit recording the release
    #[serde(default)]
    pub tracking_commit: bool,
}

/// Loads settings from file or returns defaults.
///
/// Attempts to load settings in the following order:
/// 1. Custom path provided as parameter
/// 2. `dune-publish.toml` in current directory
/// 3. `<config dir>/.dune-publish.toml` in user config directory
/// 4. Default settings if no file found
///
/// # Returns
/// * `Ok(Settings)` - Loaded or default settings
/// * `Err` - If a file exists but cannot be read or parsed
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let candidate = match path {
        Some(p) => Some(p.to_path_buf()),
        None => {
            let local = PathBuf::from(SETTINGS_FILE);
            if local.exists() {
                Some(local)
            } else {
                dirs::config_dir()
                    .map(|dir| dir.join(format!(".{}", SETTINGS_FILE)))
                    .filter(|p| p.exists())
            }
        }
    };

    let Some(file) = candidate else {
        return Ok(Settings::default());
    };

    let text = fs::read_to_string(&file).map_err(|e| {
        ReleaseError::configuration(format!("Cannot read {}: {}", file.display(), e))
    })?;
    toml::from_str(&text).map_err(|e| {
        ReleaseError::configuration(format!("Invalid settings in {}: {}", file.display(), e))
    })
}

/// Default registry fork location, depending on whether this is a CI runner.
pub fn default_registry_local_path() -> PathBuf {
    if std::env::var_os("RUNNER_TEMP").is_some() {
        PathBuf::from(RUNNER_REGISTRY_PATH)
    } else {
        PathBuf::from(LOCAL_REGISTRY_PATH)
    }
}

/// Raw inputs for a release, before validation.
///
/// Mirrors the CLI arguments without depending on clap.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseInputs {
    pub package: String,
    pub changelog: PathBuf,
    pub git_ref: String,
    pub repository: String,
    pub workspace: PathBuf,
    pub publish: bool,
    pub submit: bool,
    pub token: String,
    pub actor: String,
    pub registry_local: PathBuf,
}

/// Validated, immutable configuration for one release run.
#[derive(Clone)]
pub struct ReleaseContext {
    package: String,
    changelog: PathBuf,
    git_ref: String,
    repository: String,
    workspace: PathBuf,
    publish: bool,
    submit: bool,
    token: String,
    actor: String,
    registry_local: PathBuf,
}

fn required(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ReleaseError::configuration(format!(
            "Input required and not supplied: {}",
            name
        )));
    }
    Ok(())
}

/// Anchor a relative path at `base`, dropping `.` components.
fn resolve_in(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let relative: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    base.join(relative)
}

impl ReleaseContext {
    /// Validate inputs at the boundary.
    ///
    /// Fails when a required input is empty or the reference is not a tag.
    /// A relative changelog path is resolved against the workspace, since
    /// the release tool runs there rather than in the process directory.
    pub fn new(inputs: ReleaseInputs) -> Result<Self> {
        required(&inputs.package, "package-name")?;
        required(&inputs.token, "github-token")?;
        required(&inputs.repository, "repository")?;

        if tag_from_ref(&inputs.git_ref).is_none() {
            return Err(ReleaseError::configuration(format!(
                "Reference '{}' is not a tag. Releases must be triggered by pushing a version tag.",
                inputs.git_ref
            )));
        }

        Ok(ReleaseContext {
            package: inputs.package,
            changelog: resolve_in(&inputs.workspace, &inputs.changelog),
            git_ref: inputs.git_ref,
            repository: inputs.repository,
            workspace: inputs.workspace,
            publish: inputs.publish,
            submit: inputs.submit,
            token: inputs.token,
            actor: inputs.actor,
            registry_local: inputs.registry_local,
        })
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn changelog(&self) -> &Path {
        &self.changelog
    }

    pub fn git_ref(&self) -> &str {
        &self.git_ref
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn publish(&self) -> bool {
        self.publish
    }

    pub fn submit(&self) -> bool {
        self.submit
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    pub fn registry_local(&self) -> &Path {
        &self.registry_local
    }

    /// Whether this run can leave release side effects behind.
    ///
    /// A run with both destinations disabled only validates.
    pub fn is_real_release(&self) -> bool {
        self.publish || self.submit
    }

    /// Tag named by the reference.
    pub fn tag(&self) -> &str {
        tag_from_ref(&self.git_ref).unwrap_or(&self.git_ref)
    }

    /// Hosted release page for the tag.
    pub fn release_url(&self) -> String {
        format!(
            "https://github.com/{}/releases/tag/{}",
            self.repository,
            self.tag()
        )
    }
}

impl fmt::Debug for ReleaseContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseContext")
            .field("package", &self.package)
            .field("changelog", &self.changelog)
            .field("git_ref", &self.git_ref)
            .field("repository", &self.repository)
            .field("workspace", &self.workspace)
            .field("publish", &self.publish)
            .field("submit", &self.submit)
            .field("token", &"***")
            .field("actor", &self.actor)
            .field("registry_local", &self.registry_local)
            .finish()
    }
}
