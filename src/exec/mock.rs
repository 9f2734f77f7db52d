use std::cell::RefCell;

use crate::error::{ReleaseError, Result};
use crate::exec::{CommandExecutor, CommandSpec};

/// Executor for tests: records every command and plays back scripted results
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    calls: RefCell<Vec<CommandSpec>>,
    failures: Vec<(String, String)>,
    responses: Vec<(String, String)>,
    missing: Vec<String>,
}

fn command_line(spec: &CommandSpec) -> String {
    std::iter::once(spec.program.as_str())
        .chain(spec.args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

impl RecordingExecutor {
    /// Create an executor where every command succeeds with empty output
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any command whose command line contains `pattern`
    pub fn fail_on(&mut self, pattern: impl Into<String>, stderr: impl Into<String>) {
        self.failures.push((pattern.into(), stderr.into()));
    }

    /// Answer commands containing `pattern` with `stdout`
    pub fn respond(&mut self, pattern: impl Into<String>, stdout: impl Into<String>) {
        self.responses.push((pattern.into(), stdout.into()));
    }

    /// Pretend `program` is not installed
    pub fn set_missing(&mut self, program: impl Into<String>) {
        self.missing.push(program.into());
    }

    /// All recorded invocations, in order
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.borrow().clone()
    }

    /// Recorded command lines, unredacted
    pub fn commands(&self) -> Vec<String> {
        self.calls.borrow().iter().map(command_line).collect()
    }

    /// Whether any recorded command line contains `pattern`
    pub fn ran(&self, pattern: &str) -> bool {
        self.commands().iter().any(|c| c.contains(pattern))
    }
}

impl CommandExecutor for RecordingExecutor {
    fn run(&self, spec: &CommandSpec) -> Result<String> {
        self.calls.borrow_mut().push(spec.clone());
        let line = command_line(spec);

        if self.missing.contains(&spec.program) {
            return Err(ReleaseError::CommandSpawn {
                command: spec.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not installed"),
            });
        }

        if let Some((_, stderr)) = self.failures.iter().find(|(p, _)| line.contains(p.as_str())) {
            return Err(ReleaseError::CommandFailed {
                command: spec.to_string(),
                status: 1,
                stderr: stderr.clone(),
            });
        }

        Ok(self
            .responses
            .iter()
            .find(|(p, _)| line.contains(p.as_str()))
            .map(|(_, out)| out.clone())
            .unwrap_or_default())
    }

    fn is_available(&self, program: &str) -> bool {
        !self.missing.iter().any(|m| m == program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_calls_in_order() {
        let exec = RecordingExecutor::new();
        exec.run(&CommandSpec::new("git").arg("status")).unwrap();
        exec.run(&CommandSpec::new("opam").arg("--version")).unwrap();
        assert_eq!(exec.commands(), vec!["git status", "opam --version"]);
    }

    #[test]
    fn test_scripted_failure_and_response() {
        let mut exec = RecordingExecutor::new();
        exec.fail_on("push", "denied");
        exec.respond("ls-remote", "abc\trefs/tags/v1.0.0");

        let err = exec.run(&CommandSpec::new("git").arg("push")).unwrap_err();
        assert!(err.to_string().contains("denied"));
        let out = exec
            .run(&CommandSpec::new("git").args(["ls-remote", "--tags"]))
            .unwrap();
        assert_eq!(out, "abc\trefs/tags/v1.0.0");
    }

    #[test]
    fn test_missing_program() {
        let mut exec = RecordingExecutor::new();
        exec.set_missing("opam");
        assert!(!exec.is_available("opam"));
        assert!(exec.is_available("git"));
        assert!(exec.run(&CommandSpec::new("opam")).is_err());
    }
}
