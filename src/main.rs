use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use dune_publish::cli::{record_outputs, run_release_workflow, ReleaseStatus, WorkflowResult};
use dune_publish::config::{self, ReleaseInputs, DEFAULT_CHANGELOG};
use dune_publish::ui;

#[derive(clap::Parser)]
#[command(
    name = "dune-publish",
    version,
    about = "Release a dune project: validate its changelog, publish to GitHub and submit to opam"
)]
struct Args {
    #[arg(long, env = "INPUT_PACKAGE-NAME", help = "Name of the package to release")]
    package_name: Option<String>,

    #[arg(
        long,
        env = "INPUT_CHANGELOG",
        default_value = DEFAULT_CHANGELOG,
        help = "Path to the changelog"
    )]
    changelog: PathBuf,

    #[arg(
        long,
        env = "INPUT_GITHUB-TOKEN",
        hide_env_values = true,
        help = "Token used for GitHub and opam-repository access"
    )]
    github_token: Option<String>,

    #[arg(
        long,
        env = "INPUT_PUBLISH-TO-GITHUB",
        default_value_t = true,
        action = ArgAction::Set,
        help = "Publish the release to GitHub"
    )]
    publish_to_github: bool,

    #[arg(
        long,
        env = "INPUT_SUBMIT-TO-OPAM",
        default_value_t = true,
        action = ArgAction::Set,
        help = "Submit the package to opam-repository"
    )]
    submit_to_opam: bool,

    #[arg(short, long, env = "INPUT_VERBOSE", help = "Show every command that is run")]
    verbose: bool,

    #[arg(
        long,
        env = "INPUT_OPAM-REPO-LOCAL",
        help = "Where to clone the opam-repository fork"
    )]
    opam_repo_local: Option<PathBuf>,

    #[arg(long = "ref", env = "GITHUB_REF", help = "Reference that triggered the release")]
    git_ref: Option<String>,

    #[arg(long, env = "GITHUB_REPOSITORY", help = "Repository slug (owner/name)")]
    repository: Option<String>,

    #[arg(long, env = "GITHUB_WORKSPACE", help = "Project checkout directory")]
    workspace: Option<PathBuf>,

    #[arg(
        long,
        env = "GITHUB_ACTOR",
        default_value = "github-actions",
        help = "User the release is made as"
    )]
    actor: String,

    #[arg(short, long, help = "Custom settings file path")]
    config: Option<PathBuf>,
}

/// Second spelling for inputs that runners export both ways.
fn fallback_env(value: Option<String>, name: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .or_else(|| std::env::var(name).ok())
        .unwrap_or_default()
}

impl Args {
    fn into_inputs(self) -> Result<ReleaseInputs> {
        let cwd = std::env::current_dir().context("Cannot determine the current directory")?;
        let workspace = match self.workspace {
            Some(dir) => cwd.join(dir),
            None => cwd,
        };
        Ok(ReleaseInputs {
            package: fallback_env(self.package_name, "INPUT_PACKAGE_NAME"),
            changelog: self.changelog,
            git_ref: self.git_ref.unwrap_or_default(),
            repository: self.repository.unwrap_or_default(),
            workspace,
            publish: self.publish_to_github,
            submit: self.submit_to_opam,
            token: fallback_env(self.github_token, "GITHUB_TOKEN"),
            actor: self.actor,
            registry_local: self
                .opam_repo_local
                .unwrap_or_else(config::default_registry_local_path),
        })
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "dune_publish=debug"
        } else {
            "dune_publish=warn"
        })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn release(args: Args) -> Result<WorkflowResult> {
    let settings = config::load_settings(args.config.as_deref())?;
    let inputs = args.into_inputs()?;
    Ok(run_release_workflow(inputs, &settings)?)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let outputs = std::env::var_os("GITHUB_OUTPUT").map(PathBuf::from);

    let (status, tag) = match release(args) {
        Ok(result) => {
            ui::display_success(&format!("Release {} finished", result.tag));
            (ReleaseStatus::Success, Some(result.tag))
        }
        Err(e) => {
            ui::display_error(&format!("{:#}", e));
            (ReleaseStatus::Failed, None)
        }
    };

    if let Some(path) = outputs {
        if let Err(e) = record_outputs(&path, status, tag.as_deref()) {
            ui::display_warning(&format!("Could not write workflow outputs: {}", e));
        }
    }

    if status == ReleaseStatus::Failed {
        std::process::exit(1);
    }
    Ok(())
}
