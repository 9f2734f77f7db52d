use std::fs;
use std::path::{Path, PathBuf};

use crate::boundary::BoundaryWarning;
use crate::pipeline::Stage;
use crate::ui;
use crate::version::ReleaseVersion;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed { stage: Stage },
}

/// Mutable state of one pipeline run.
///
/// Owned by the pipeline for the duration of a release. Whatever happens,
/// [PipelineRun::finalize] is called before the run's result is returned.
#[derive(Debug, Default)]
pub struct PipelineRun {
    stage: Option<Stage>,
    version: Option<ReleaseVersion>,
    artifact: Option<PathBuf>,
    outcome: Option<Outcome>,
    published: bool,
    submitted: bool,
    warnings: Vec<BoundaryWarning>,
}

impl PipelineRun {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a stage and print its heading.
    pub fn enter(&mut self, stage: Stage) {
        tracing::debug!("Entering stage {:?}", stage);
        self.stage = Some(stage);
        ui::display_group(stage.title());
    }

    pub fn stage(&self) -> Option<Stage> {
        self.stage
    }

    pub fn set_version(&mut self, version: ReleaseVersion) {
        self.version = Some(version);
    }

    pub fn version(&self) -> Option<&ReleaseVersion> {
        self.version.as_ref()
    }

    /// Record the extracted changelog so finalization removes it.
    ///
    /// Call this before writing the file, so a partial write is cleaned up too.
    pub fn track_artifact(&mut self, path: PathBuf) {
        self.artifact = Some(path);
    }

    pub fn artifact(&self) -> Option<&Path> {
        self.artifact.as_deref()
    }

    pub fn mark_published(&mut self) {
        self.published = true;
    }

    pub fn mark_submitted(&mut self) {
        self.submitted = true;
    }

    pub fn published(&self) -> bool {
        self.published
    }

    pub fn submitted(&self) -> bool {
        self.submitted
    }

    /// Surface a warning now and keep it for the report.
    pub fn warn(&mut self, warning: BoundaryWarning) {
        ui::display_boundary_warning(&warning);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[BoundaryWarning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<BoundaryWarning> {
        std::mem::take(&mut self.warnings)
    }

    pub fn set_outcome(&mut self, outcome: Outcome) {
        self.outcome = Some(outcome);
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Remove transient files. Never fails; problems become warnings.
    pub fn finalize(&mut self) {
        let Some(path) = self.artifact.take() else {
            return;
        };
        if !path.exists() {
            return;
        }
        match fs::remove_file(&path) {
            Ok(()) => tracing::debug!("Removed temporary changelog {}", path.display()),
            Err(e) => self.warn(BoundaryWarning::ArtifactCleanupFailed {
                path,
                reason: e.to_string(),
            }),
        }
    }
}

/// Path of the per-version changelog: `<dir>/<stem>-<version><ext>`.
///
/// # Example
/// ```ignore
/// assert_eq!(
///     extracted_changelog_path(Path::new("docs/CHANGES.md"), "v1.0.0"),
///     PathBuf::from("docs/CHANGES-v1.0.0.md"),
/// );
/// ```
pub fn extracted_changelog_path(changelog: &Path, version: &str) -> PathBuf {
    let stem = changelog
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "CHANGES".to_string());
    let ext = changelog
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let name = format!("{}-{}{}", stem, version, ext);
    match changelog.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}
