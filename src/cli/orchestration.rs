//! Release workflow orchestration
//!
//! Keeps `main.rs` down to argument parsing: this module turns validated
//! inputs into a pipeline run against the real system, and records the
//! run's outputs for the workflow runner.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::config::{ReleaseContext, ReleaseInputs, Settings};
use crate::error::Result;
use crate::exec::SystemExecutor;
use crate::git::SystemGit;
use crate::pipeline::{Pipeline, ReleaseReport};
use crate::ui;

/// Result of a successful release workflow
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowResult {
    /// The released tag
    pub tag: String,

    /// Whether the tag was published as a hosted release
    pub published: bool,

    /// Whether the package was submitted to the registry
    pub submitted: bool,

    /// Number of warnings raised along the way
    pub warnings: usize,
}

impl From<ReleaseReport> for WorkflowResult {
    fn from(report: ReleaseReport) -> Self {
        WorkflowResult {
            tag: report.version.tag,
            published: report.release_url.is_some(),
            submitted: report.registry_url.is_some(),
            warnings: report.warnings.len(),
        }
    }
}

/// Final status reported to the workflow runner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseStatus {
    Success,
    Failed,
}

impl ReleaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseStatus::Success => "success",
            ReleaseStatus::Failed => "failed",
        }
    }
}

/// Main release workflow
///
/// 1. Validate inputs into a release context
/// 2. Print the run configuration
/// 3. Run the pipeline with the system executor and system git
///
/// # Arguments
///
/// * `inputs` - Raw inputs from flags and environment
/// * `settings` - Loaded settings file (or defaults)
pub fn run_release_workflow(inputs: ReleaseInputs, settings: &Settings) -> Result<WorkflowResult> {
    let ctx = ReleaseContext::new(inputs)?;
    tracing::debug!("Release context: {:?}", ctx);

    ui::display_release_banner(&ctx, &settings.registry.fork);

    let executor = SystemExecutor::new();
    let git = SystemGit::new(
        &executor,
        settings.git.remote.clone(),
        Some(ctx.workspace().to_path_buf()),
    );

    let report = Pipeline::new(&ctx, settings, &executor, &git).run()?;
    Ok(report.into())
}

/// Append `key=value` outputs to the runner's output file.
///
/// The version is only written when known.
pub fn record_outputs(path: &Path, status: ReleaseStatus, version: Option<&str>) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "release-status={}", status.as_str())?;
    if let Some(version) = version {
        writeln!(file, "version={}", version)?;
    }
    Ok(())
}
