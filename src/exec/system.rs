use std::io::Write;
use std::process::{Command, Stdio};

use crate::error::{ReleaseError, Result};
use crate::exec::{CommandExecutor, CommandSpec};

/// Runs commands as real subprocesses.
///
/// Output is always captured. Commands not marked quiet have it echoed once
/// they finish.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl SystemExecutor {
    pub fn new() -> Self {
        SystemExecutor
    }
}

impl CommandExecutor for SystemExecutor {
    fn run(&self, spec: &CommandSpec) -> Result<String> {
        let shown = spec.to_string();
        if spec.quiet {
            tracing::trace!("> {}", shown);
        } else {
            tracing::debug!("> {}", shown);
        }

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args).stdin(Stdio::null());

        if let Some(dir) = &spec.cwd {
            cmd.current_dir(dir);
        }
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }

        let output = cmd.output().map_err(|source| ReleaseError::CommandSpawn {
            command: shown.clone(),
            source,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !spec.quiet {
            // Best-effort echo
            let _ = std::io::stdout().write_all(spec.redact(&stdout).as_bytes());
            let _ = std::io::stderr().write_all(spec.redact(&stderr).as_bytes());
        }

        if !output.status.success() {
            return Err(ReleaseError::CommandFailed {
                command: shown,
                status: output.status.code().unwrap_or(-1),
                stderr: spec.redact(stderr.trim()),
            });
        }

        Ok(stdout.trim().to_string())
    }

    fn is_available(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}
