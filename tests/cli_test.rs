// tests/cli_test.rs
use std::fs;
use std::process::Command;

fn dune_publish() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_dune-publish"));
    // Runner variables from the surrounding CI must not leak into the test
    cmd.env_clear();
    cmd
}

#[test]
fn test_dune_publish_help() {
    let output = dune_publish()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("dune-publish"));
    assert!(stdout.contains("--package-name"));
    assert!(stdout.contains("--submit-to-opam"));
}

#[test]
fn test_dune_publish_version() {
    let output = dune_publish()
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_branch_ref_fails_and_records_status() {
    let dir = tempfile::tempdir().unwrap();
    let outputs = dir.path().join("github_output");

    let status = dune_publish()
        .current_dir(dir.path())
        .env("GITHUB_OUTPUT", &outputs)
        .env("INPUT_PACKAGE-NAME", "mypkg")
        .env("INPUT_GITHUB-TOKEN", "ghp_secret")
        .env("GITHUB_REF", "refs/heads/main")
        .env("GITHUB_REPOSITORY", "owner/mypkg")
        .status()
        .expect("Failed to execute command");

    assert_eq!(status.code(), Some(1));
    assert_eq!(
        fs::read_to_string(&outputs).unwrap(),
        "release-status=failed\n"
    );
}

#[test]
fn test_missing_token_is_reported() {
    let dir = tempfile::tempdir().unwrap();

    let output = dune_publish()
        .current_dir(dir.path())
        .args(["--package-name", "mypkg", "--ref", "refs/tags/v1.0.0"])
        .args(["--repository", "owner/mypkg"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(format!("{}{}", stdout, stderr).contains("github-token"));
}
