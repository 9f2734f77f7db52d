// tests/pipeline_test.rs
//
// Drives the pipeline through SystemGit with a recording executor, so the
// exact git and release-tool command lines are checked end to end.
use dune_publish::config::{ReleaseContext, ReleaseInputs, Settings};
use dune_publish::exec::RecordingExecutor;
use dune_publish::git::{MockSourceControl, SystemGit};
use dune_publish::pipeline::{rollback_tag, Pipeline, PipelineRun};
use dune_publish::ReleaseError;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const CHANGES: &str = "## v1.0.0 (2025-01-13)\n\n- Added feature A\n- Fixed bug B\n\n## v0.9.0\n\n- Initial release\n";

fn inputs(dir: &Path, publish: bool, submit: bool) -> ReleaseInputs {
    ReleaseInputs {
        package: "mypkg".to_string(),
        changelog: dir.join("CHANGES.md"),
        git_ref: "refs/tags/v1.0.0".to_string(),
        repository: "owner/mypkg".to_string(),
        workspace: dir.to_path_buf(),
        publish,
        submit,
        token: "ghp_secret".to_string(),
        actor: "octocat".to_string(),
        registry_local: dir.join("opam-repository"),
    }
}

fn settings_in(dir: &Path) -> Settings {
    let mut settings = Settings::default();
    settings.tool.config_dir = Some(dir.join("dune"));
    settings
}

fn setup(publish: bool, submit: bool) -> (TempDir, ReleaseContext, Settings) {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("CHANGES.md"), CHANGES).unwrap();
    let ctx = ReleaseContext::new(inputs(dir.path(), publish, submit)).unwrap();
    let settings = settings_in(dir.path());
    (dir, ctx, settings)
}

fn tagged_git() -> MockSourceControl {
    let mut git = MockSourceControl::new();
    git.add_remote_tag("v1.0.0");
    git.add_local_tag("v1.0.0");
    git
}

/// Executor that reports the release tag on both sides.
fn tagged_executor() -> RecordingExecutor {
    let mut exec = RecordingExecutor::new();
    exec.respond("ls-remote", "0123abcd\trefs/tags/v1.0.0");
    exec.respond("tag --list", "v1.0.0");
    exec
}

#[test]
fn test_failure_deletes_tag_with_system_git() {
    let (dir, ctx, settings) = setup(true, false);
    let mut exec = tagged_executor();
    exec.fail_on("dune-release distrib", "could not build archive");
    let git = SystemGit::new(&exec, "origin", Some(dir.path().to_path_buf()));

    let err = Pipeline::new(&ctx, &settings, &exec, &git).run().unwrap_err();

    assert!(err.to_string().contains("could not build archive"));
    assert!(exec.ran("git push origin --delete v1.0.0"));
    assert!(exec.ran("git tag -d v1.0.0"));
    assert!(!dir.path().join("CHANGES-v1.0.0.md").exists());
}

#[test]
fn test_git_commands_run_in_workspace() {
    let (dir, ctx, settings) = setup(true, false);
    let exec = tagged_executor();
    let git = SystemGit::new(&exec, "origin", Some(dir.path().to_path_buf()));

    Pipeline::new(&ctx, &settings, &exec, &git).run().unwrap();

    let git_calls: Vec<_> = exec
        .calls()
        .into_iter()
        .filter(|c| c.program == "git")
        .collect();
    assert!(!git_calls.is_empty());
    assert!(git_calls
        .iter()
        .all(|c| c.cwd.as_deref() == Some(dir.path())));
}

#[test]
fn test_token_never_shown() {
    let (dir, ctx, settings) = setup(true, true);
    let exec = tagged_executor();
    let git = SystemGit::new(&exec, "origin", Some(dir.path().to_path_buf()));

    Pipeline::new(&ctx, &settings, &exec, &git).run().unwrap();

    // The token is passed, but never displayed
    assert!(exec.ran("x-access-token:ghp_secret@github.com"));
    for call in exec.calls() {
        assert!(!call.to_string().contains("ghp_secret"), "leaked in {}", call);
    }
}

#[test]
fn test_submit_prepares_fork_first() {
    let (dir, ctx, settings) = setup(false, true);
    let exec = tagged_executor();
    let git = SystemGit::new(&exec, "origin", Some(dir.path().to_path_buf()));

    Pipeline::new(&ctx, &settings, &exec, &git).run().unwrap();

    let commands = exec.commands();
    let position = |pattern: &str| {
        commands
            .iter()
            .position(|c| c.contains(pattern))
            .unwrap_or_else(|| panic!("{} was not run", pattern))
    };
    assert!(position("git clone git@github.com:ocaml/opam-repository") < position("distrib"));
    assert!(position("git remote add upstream") < position("git fetch upstream master"));
    assert!(position("git merge upstream/master --ff-only") < position("opam submit"));
    assert!(!exec.ran("dune-release publish"));

    let release_yml = fs::read_to_string(dir.path().join("dune").join("release.yml")).unwrap();
    assert!(release_yml.contains("octocat"));
    assert!(release_yml.contains("opam-repository"));
}

#[test]
fn test_failed_remote_query_does_not_stop_release() {
    let (dir, ctx, settings) = setup(true, false);
    let mut exec = RecordingExecutor::new();
    exec.fail_on("ls-remote", "could not resolve host");
    let git = SystemGit::new(&exec, "origin", Some(dir.path().to_path_buf()));

    let report = Pipeline::new(&ctx, &settings, &exec, &git).run().unwrap();
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].to_string().contains("could not resolve host"));
}

#[test]
fn test_missing_tools_leave_no_trace() {
    let (dir, ctx, settings) = setup(true, true);
    let mut exec = tagged_executor();
    exec.set_missing("opam");
    let git = SystemGit::new(&exec, "origin", Some(dir.path().to_path_buf()));

    let err = Pipeline::new(&ctx, &settings, &exec, &git).run().unwrap_err();

    assert!(matches!(err, ReleaseError::DependencyMissing { .. }));
    assert!(exec.commands().is_empty());
}

#[test]
fn test_rollback_only_deletes_present_tags() {
    let (_dir, ctx, _settings) = setup(true, true);
    let mut git = MockSourceControl::new();
    git.add_local_tag("v1.0.0");
    let mut run = PipelineRun::new();

    let summary = rollback_tag(&git, &ctx, &mut run);

    assert!(!summary.skipped);
    assert!(!summary.remote_deleted);
    assert!(summary.local_deleted);
    assert!(!git.events().iter().any(|e| e.starts_with("delete-remote")));
    assert!(run.warnings().is_empty());
}

#[test]
fn test_rollback_failures_become_warnings() {
    let (_dir, ctx, _settings) = setup(true, false);
    let mut git = MockSourceControl::new();
    git.add_remote_tag("v1.0.0");
    git.add_local_tag("v1.0.0");
    git.fail("rewrite-url");
    git.fail("delete-remote");
    let mut run = PipelineRun::new();

    let summary = rollback_tag(&git, &ctx, &mut run);

    assert!(!summary.remote_deleted);
    assert!(summary.local_deleted);
    assert_eq!(run.warnings().len(), 2);
}

#[test]
fn test_rollback_skipped_for_validation_run() {
    let (_dir, ctx, _settings) = setup(false, false);
    let mut git = MockSourceControl::new();
    git.add_remote_tag("v1.0.0");
    let mut run = PipelineRun::new();

    let summary = rollback_tag(&git, &ctx, &mut run);

    assert!(summary.skipped);
    assert!(git.events().is_empty());
    assert!(git.has_remote_tag("v1.0.0"));
}

#[test]
fn test_artifact_path_next_to_changelog() {
    let (dir, ctx, _settings) = setup(true, true);
    assert_eq!(
        dune_publish::pipeline::extracted_changelog_path(ctx.changelog(), "v1.0.0"),
        dir.path().join("CHANGES-v1.0.0.md")
    );
}

#[test]
fn test_relative_changelog_reaches_tool_as_workspace_path() {
    let dir = tempfile::tempdir().unwrap();
    let workspace = dir.path().join("ws");
    fs::create_dir(&workspace).unwrap();
    fs::write(workspace.join("CHANGES.md"), CHANGES).unwrap();

    let mut i = inputs(&workspace, true, true);
    i.changelog = "./CHANGES.md".into();
    let ctx = ReleaseContext::new(i).unwrap();
    let settings = settings_in(dir.path());
    let exec = RecordingExecutor::new();
    let git = MockSourceControl::new();

    Pipeline::new(&ctx, &settings, &exec, &git).run().unwrap();

    let flag = format!("--change-log={}", workspace.join("CHANGES-v1.0.0.md").display());
    let submit = exec
        .calls()
        .into_iter()
        .find(|c| c.args.iter().any(|a| a == "submit"))
        .unwrap();
    assert_eq!(submit.cwd.as_deref(), Some(workspace.as_path()));
    assert!(submit.args.contains(&flag));
    assert!(exec.ran(&format!("publish --yes {}", flag)));
    assert!(!Path::new("CHANGES-v1.0.0.md").exists());
}

#[test]
fn test_package_name_does_not_trigger_credential_advice() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("CHANGES.md"), CHANGES).unwrap();
    let mut i = inputs(dir.path(), true, false);
    i.package = "ppx_scope".to_string();
    let ctx = ReleaseContext::new(i).unwrap();
    let settings = settings_in(dir.path());
    let mut exec = RecordingExecutor::new();
    exec.fail_on("opam pkg", "ppx_scope.opam: field 'synopsis' missing");
    let git = tagged_git();

    let err = Pipeline::new(&ctx, &settings, &exec, &git).run().unwrap_err();

    assert!(matches!(err, ReleaseError::CommandFailed { .. }));
    assert!(!err.to_string().contains("OAuth"));
}

struct FailurePoint {
    name: &'static str,
    git_fails: Option<&'static str>,
    command_fails: Option<&'static str>,
    git_ref: &'static str,
}

const FAILURE_POINTS: &[FailurePoint] = &[
    FailurePoint { name: "identity", git_fails: Some("identity"), command_fails: None, git_ref: "refs/tags/v1.0.0" },
    FailurePoint { name: "url rewrite", git_fails: Some("rewrite-url"), command_fails: None, git_ref: "refs/tags/v1.0.0" },
    FailurePoint { name: "version", git_fails: None, command_fails: None, git_ref: "refs/tags/release-1" },
    FailurePoint { name: "lint", git_fails: None, command_fails: Some("dune-release lint"), git_ref: "refs/tags/v1.0.0" },
    FailurePoint { name: "distrib", git_fails: None, command_fails: Some("distrib"), git_ref: "refs/tags/v1.0.0" },
    FailurePoint { name: "opam pkg", git_fails: None, command_fails: Some("opam pkg"), git_ref: "refs/tags/v1.0.0" },
];

#[test]
fn test_every_mandatory_stage_failure_rolls_back() {
    for (publish, submit) in [(true, true), (true, false), (false, true)] {
        for point in FAILURE_POINTS {
            let dir = tempfile::tempdir().unwrap();
            fs::write(dir.path().join("CHANGES.md"), CHANGES).unwrap();
            let mut i = inputs(dir.path(), publish, submit);
            i.git_ref = point.git_ref.to_string();
            let tag = i.git_ref.trim_start_matches("refs/tags/").to_string();
            let ctx = ReleaseContext::new(i).unwrap();
            let settings = settings_in(dir.path());

            let mut exec = RecordingExecutor::new();
            if let Some(pattern) = point.command_fails {
                exec.fail_on(pattern, "stage failed");
            }
            let mut git = MockSourceControl::new();
            git.add_remote_tag(tag.clone());
            git.add_local_tag(tag.clone());
            if let Some(op) = point.git_fails {
                git.fail(op);
            }

            let result = Pipeline::new(&ctx, &settings, &exec, &git).run();

            let case = format!("{} (publish={}, submit={})", point.name, publish, submit);
            assert!(result.is_err(), "{} should fail", case);
            assert!(!git.has_remote_tag(&tag), "{}: remote tag kept", case);
            assert!(!git.has_local_tag(&tag), "{}: local tag kept", case);
            assert!(!dir.path().join("CHANGES-v1.0.0.md").exists(), "{}: notes kept", case);
        }
    }
}

#[test]
fn test_gated_stage_failures_roll_back() {
    // (publish, submit, failing command, failing git operation)
    let cases = [
        (true, false, Some("dune-release publish"), None),
        (false, true, Some("opam submit"), None),
        (true, true, Some("opam submit"), None),
        (false, true, None, Some("clone")),
    ];
    for (publish, submit, command_fails, git_fails) in cases {
        let (_dir, ctx, settings) = setup(publish, submit);
        let mut exec = RecordingExecutor::new();
        if let Some(pattern) = command_fails {
            exec.fail_on(pattern, "stage failed");
        }
        let mut git = tagged_git();
        if let Some(op) = git_fails {
            git.fail(op);
        }

        assert!(Pipeline::new(&ctx, &settings, &exec, &git).run().is_err());
        assert!(!git.has_remote_tag("v1.0.0"));
        assert!(!git.has_local_tag("v1.0.0"));
    }
}

#[test]
fn test_validation_run_failures_keep_tag() {
    for point in FAILURE_POINTS {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("CHANGES.md"), CHANGES).unwrap();
        let mut i = inputs(dir.path(), false, false);
        i.git_ref = point.git_ref.to_string();
        let tag = i.git_ref.trim_start_matches("refs/tags/").to_string();
        let ctx = ReleaseContext::new(i).unwrap();
        let settings = settings_in(dir.path());

        let mut exec = RecordingExecutor::new();
        if let Some(pattern) = point.command_fails {
            exec.fail_on(pattern, "stage failed");
        }
        let mut git = MockSourceControl::new();
        git.add_remote_tag(tag.clone());
        git.add_local_tag(tag.clone());
        if let Some(op) = point.git_fails {
            git.fail(op);
        }

        assert!(Pipeline::new(&ctx, &settings, &exec, &git).run().is_err());
        assert!(git.has_remote_tag(&tag), "{}: remote tag deleted", point.name);
        assert!(git.has_local_tag(&tag), "{}: local tag deleted", point.name);
    }
}
