//! Release pipeline
//!
//! Runs the release stages strictly in order against a single version:
//!
//! 1. Dependency check (all tools probed, all missing ones reported)
//! 2. Tag check on the remote (an existing tag is only a warning)
//! 3. Git identity and authenticated URL rewriting
//! 4. Version resolution from the tag reference
//! 5. Changelog validation
//! 6. Changelog extraction into a per-version file
//! 7. Lint
//! 8. Registry fork preparation (only when submitting)
//! 9. Distribution archive
//! 10. Publish to GitHub (optional)
//! 11. opam packaging (always)
//! 12. Submission to opam-repository (optional)
//! 13. Success report and optional tracking commit
//!
//! A failure in stages 3–12 stops the run and rolls back the release tag
//! (see [rollback]). The extracted changelog is removed on every path.

pub mod rollback;
pub mod run;
pub mod stage;

pub use rollback::{rollback_tag, RollbackSummary};
pub use run::{extracted_changelog_path, Outcome, PipelineRun};
pub use stage::Stage;

use crate::boundary::BoundaryWarning;
use crate::changelog;
use crate::config::{ReleaseContext, Settings};
use crate::error::{ReleaseError, Result};
use crate::exec::CommandExecutor;
use crate::git::SourceControl;
use crate::tooling::{self, ReleaseTool, ToolSettingsFile};
use crate::ui;
use crate::version::{resolve_version, ReleaseVersion};

/// Summary of a successful release.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseReport {
    pub version: ReleaseVersion,
    /// Hosted release page, when the release was published
    pub release_url: Option<String>,
    /// Where the registry pull request can be followed, when submitted
    pub registry_url: Option<String>,
    pub tracking_commit: bool,
    pub warnings: Vec<BoundaryWarning>,
}

/// Advice printed next to each missing tool.
fn remediation(tool: &str) -> String {
    match tool {
        "git" => "git: install git on the runner".to_string(),
        "opam" => "opam: set up OCaml first (e.g. with ocaml/setup-ocaml)".to_string(),
        "dune-release" => "dune-release: run `opam install dune-release`".to_string(),
        other => format!("{}: install it and make sure it is on PATH", other),
    }
}

/// The release orchestrator.
///
/// Borrows its collaborators so callers (and tests) keep access to them
/// after the run.
pub struct Pipeline<'a, E: CommandExecutor + ?Sized, G: SourceControl + ?Sized> {
    ctx: &'a ReleaseContext,
    settings: &'a Settings,
    executor: &'a E,
    git: &'a G,
    tool: ReleaseTool,
}

impl<'a, E: CommandExecutor + ?Sized, G: SourceControl + ?Sized> Pipeline<'a, E, G> {
    pub fn new(
        ctx: &'a ReleaseContext,
        settings: &'a Settings,
        executor: &'a E,
        git: &'a G,
    ) -> Self {
        Pipeline {
            ctx,
            settings,
            executor,
            git,
            tool: ReleaseTool::new(&settings.tool),
        }
    }

    /// Run every stage, rolling back on failure and always cleaning up.
    ///
    /// # Returns
    /// * `Ok(ReleaseReport)` - All stages succeeded
    /// * `Err` - The error of the failing stage, with credential guidance
    ///   attached when it looks like an access problem
    pub fn run(&self) -> Result<ReleaseReport> {
        let mut run = PipelineRun::new();

        if !self.ctx.is_real_release() {
            ui::display_warning(
                "Publish and submit are both disabled: validation run, nothing will be released",
            );
        }

        let result = self.execute(&mut run);

        let result = match result {
            Ok(report) => {
                run.set_outcome(Outcome::Succeeded);
                Ok(report)
            }
            Err(err) => {
                let stage = run.stage().unwrap_or(Stage::DependencyCheck);
                run.set_outcome(Outcome::Failed { stage });
                ui::display_error(&format!("Release failed during '{}'", stage));
                if stage.rolls_back() {
                    rollback_tag(self.git, self.ctx, &mut run);
                }
                Err(err.with_credential_guidance())
            }
        };

        run.finalize();
        tracing::debug!(
            "Run for {} finished: {:?}",
            run.version().map_or(self.ctx.tag(), |v| v.tag.as_str()),
            run.outcome()
        );

        result.map(|mut report| {
            report.warnings = run.take_warnings();
            report
        })
    }

    fn execute(&self, run: &mut PipelineRun) -> Result<ReleaseReport> {
        run.enter(Stage::DependencyCheck);
        self.check_dependencies()?;

        run.enter(Stage::TagCheck);
        self.check_tag(run);

        run.enter(Stage::Identity);
        let identity = &self.settings.identity;
        self.git.configure_identity(&identity.name, &identity.email)?;
        self.git.rewrite_url("git@github.com:", self.ctx.token())?;

        run.enter(Stage::VersionResolution);
        let version = resolve_version(self.ctx.git_ref())?;
        ui::display_status(&format!("Extracted version: {}", version));
        if version.is_prerelease() {
            ui::display_notice(&format!("{} is a pre-release", version));
        }
        run.set_version(version.clone());

        run.enter(Stage::ChangelogValidation);
        self.validate_changelog(run, &version)?;

        run.enter(Stage::ChangelogExtraction);
        let notes = extracted_changelog_path(self.ctx.changelog(), &version.tag);
        run.track_artifact(notes.clone());
        changelog::extract_version_changelog(self.ctx.changelog(), &version.tag, &notes)?;
        ui::display_success(&format!(
            "Created version-specific changelog at: {}",
            notes.display()
        ));

        run.enter(Stage::Lint);
        self.executor.run(&self.tool.lint())?;

        run.enter(Stage::RegistryPreparation);
        if self.ctx.submit() {
            self.prepare_registry(run)?;
        } else {
            ui::display_skip("Registry preparation", "submission disabled");
        }

        run.enter(Stage::Distribution);
        self.executor.run(&self.tool.distrib())?;

        run.enter(Stage::Publish);
        if self.ctx.publish() {
            self.executor
                .run(&self.tool.publish(&notes, self.ctx.token()))?;
            run.mark_published();
        } else {
            ui::display_skip("Publishing to GitHub", "publish-to-github is disabled");
        }

        run.enter(Stage::Packaging);
        self.executor
            .run(&self.tool.opam_pkg(self.ctx.package(), &notes))?;

        run.enter(Stage::Submission);
        if self.ctx.submit() {
            self.executor.run(&self.tool.opam_submit(
                &notes,
                self.ctx.token(),
                self.ctx.workspace(),
            ))?;
            run.mark_submitted();
        } else {
            ui::display_skip("Submitting to opam repository", "submit-to-opam is disabled");
        }

        run.enter(Stage::Report);
        Ok(self.report(run, version))
    }

    /// Probe every required tool before failing, so the error lists them all.
    fn check_dependencies(&self) -> Result<()> {
        let launcher = self.tool.launcher();
        let mut programs = vec!["git"];
        if launcher != "git" {
            programs.push(launcher);
        }

        let mut missing: Vec<String> = programs
            .into_iter()
            .filter(|p| !self.executor.is_available(p))
            .map(str::to_string)
            .collect();

        // The tool itself can only be probed once its launcher is present
        if !missing.iter().any(|m| m == launcher) {
            if let Err(e) = self.executor.run(&self.tool.probe()) {
                tracing::debug!("Release tool probe failed: {}", e);
                missing.push(self.tool.name().to_string());
            }
        }

        if missing.is_empty() {
            ui::display_success("All required tools are available");
            return Ok(());
        }

        for tool in &missing {
            ui::display_warning(&remediation(tool));
        }
        Err(ReleaseError::DependencyMissing { missing })
    }

    fn check_tag(&self, run: &mut PipelineRun) {
        let tag = self.ctx.tag();
        match self.git.remote_tag_exists(tag) {
            Ok(true) => run.warn(BoundaryWarning::TagAlreadyOnRemote {
                tag: tag.to_string(),
            }),
            Ok(false) => tracing::debug!("Tag {} not found on remote", tag),
            Err(e) => run.warn(BoundaryWarning::TagQueryFailed {
                tag: tag.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    fn validate_changelog(&self, run: &mut PipelineRun, version: &ReleaseVersion) -> Result<()> {
        let validation = changelog::validate_changelog(self.ctx.changelog(), &version.tag);

        for warning in &validation.warnings {
            run.warn(BoundaryWarning::Changelog(warning.clone()));
        }

        if !validation.valid {
            for error in &validation.errors {
                ui::display_error(error);
            }
            return Err(ReleaseError::ChangelogInvalid {
                errors: validation.errors,
            });
        }

        ui::display_success(&format!("Changelog has an entry for {}", version));
        Ok(())
    }

    fn prepare_registry(&self, run: &mut PipelineRun) -> Result<()> {
        let dir = self.settings.tool.config_dir().ok_or_else(|| {
            ReleaseError::configuration("Cannot locate a home directory for the release tool configuration")
        })?;
        let file = ToolSettingsFile {
            user: self.ctx.actor().to_string(),
            remote: self.settings.registry.fork_url(),
            local: self.ctx.registry_local().to_path_buf(),
        };
        tooling::write_tool_settings(&dir, &file)?;

        let warnings = tooling::prepare_registry_fork(
            self.git,
            &self.settings.registry,
            self.ctx.registry_local(),
        )?;
        for warning in warnings {
            run.warn(warning);
        }
        Ok(())
    }

    fn report(&self, run: &mut PipelineRun, version: ReleaseVersion) -> ReleaseReport {
        let release_url = run.published().then(|| self.ctx.release_url());
        let registry_url = run.submitted().then(|| self.settings.registry.pulls_url());

        if self.ctx.is_real_release() {
            ui::display_success(&format!("Release {} completed successfully!", version));
        } else {
            ui::display_success(&format!(
                "Validation run for {} completed successfully (nothing was released)",
                version
            ));
        }
        if let Some(url) = &release_url {
            ui::display_notice(&format!("GitHub release: {}", url));
        }
        if let Some(url) = &registry_url {
            ui::display_notice(&format!("Monitor the opam pull request: {}", url));
        }

        let tracking_commit =
            self.settings.release.tracking_commit && self.push_tracking_commit(run, &version);

        ReleaseReport {
            version,
            release_url,
            registry_url,
            tracking_commit,
            warnings: Vec::new(),
        }
    }

    /// Record the release on the current branch. Never fails the run.
    fn push_tracking_commit(&self, run: &mut PipelineRun, version: &ReleaseVersion) -> bool {
        let skip = |run: &mut PipelineRun, reason: String| {
            run.warn(BoundaryWarning::TrackingCommitSkipped { reason });
            false
        };

        let branch = match self.git.current_branch() {
            Ok(Some(branch)) => branch,
            Ok(None) => return skip(run, "HEAD is detached, no branch to push to".to_string()),
            Err(e) => return skip(run, e.to_string()),
        };

        let message = format!("chore(release): {} {}", self.ctx.package(), version);
        if let Err(e) = self.git.commit_empty(&message) {
            return skip(run, e.to_string());
        }
        if let Err(e) = self.git.push_branch(&branch) {
            return skip(run, e.to_string());
        }

        ui::display_success(&format!("Pushed release tracking commit to {}", branch));
        true
    }
}
