use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the changelog engine.
///
/// Parsing itself never fails; only reading or writing files does, plus the
/// one hard failure of extraction: asking for a version that is not there.
#[derive(Error, Debug)]
pub enum ChangelogError {
    #[error("Failed to parse changelog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No changelog entry found for version {version}")]
    VersionNotFound { version: String },

    #[error("Failed to write version changelog {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Unified error type for release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Missing required tools: {}", missing.join(", "))]
    DependencyMissing { missing: Vec<String> },

    #[error("Changelog validation failed: {}", errors.join("; "))]
    ChangelogInvalid { errors: Vec<String> },

    #[error(transparent)]
    Changelog(#[from] ChangelogError),

    #[error("Command failed: {command} (exit code {status})\n{stderr}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },

    #[error("Failed to start command {command}: {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{source}\n{guidance}")]
    Credential {
        guidance: String,
        #[source]
        source: Box<ReleaseError>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in dune-publish
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Known credential failures and the advice attached to them.
///
/// Needles are matched against a failed command's stderr only.
const CREDENTIAL_PATTERNS: &[(&[&str], &str)] = &[
    (
        &["refusing to allow an OAuth App", "without `workflow` scope"],
        "The access token is missing a required OAuth scope. \
         Grant the token the `repo` and `workflow` scopes.",
    ),
    (
        &[
            "Permission to",
            "The requested URL returned error: 403",
            "Permission denied (publickey)",
        ],
        "The access token is not allowed to push. \
         Check that it has write access to the repository and the registry fork.",
    ),
    (
        &[
            "Authentication failed",
            "could not read Username",
            "Bad credentials",
            "The requested URL returned error: 401",
        ],
        "Authentication failed. Check that the access token is set and has not expired.",
    ),
];

impl ReleaseError {
    /// Create a configuration error with context
    pub fn configuration(msg: impl Into<String>) -> Self {
        ReleaseError::Configuration(msg.into())
    }

    /// Whether this error came from an external command returning non-zero.
    pub fn is_command_failure(&self) -> bool {
        match self {
            ReleaseError::CommandFailed { .. } => true,
            ReleaseError::Credential { source, .. } => source.is_command_failure(),
            _ => false,
        }
    }

    /// Match a failed command's stderr against known credential failures.
    ///
    /// Returns the guidance lines for every pattern group that matched, in
    /// table order. The command line itself is never searched.
    pub fn credential_guidance(&self) -> Vec<&'static str> {
        let text = match self {
            ReleaseError::CommandFailed { stderr, .. } => stderr,
            ReleaseError::Credential { source, .. } => return source.credential_guidance(),
            _ => return Vec::new(),
        };
        CREDENTIAL_PATTERNS
            .iter()
            .filter(|(needles, _)| needles.iter().any(|n| text.contains(n)))
            .map(|(_, guidance)| *guidance)
            .collect()
    }

    /// Layer credential guidance on top of a failed command.
    ///
    /// Errors that are not command failures, or that match no known pattern,
    /// are returned unchanged.
    pub fn with_credential_guidance(self) -> Self {
        if !matches!(self, ReleaseError::CommandFailed { .. }) {
            return self;
        }
        let guidance = self.credential_guidance();
        if guidance.is_empty() {
            return self;
        }
        ReleaseError::Credential {
            guidance: guidance.join("\n"),
            source: Box::new(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(stderr: &str) -> ReleaseError {
        ReleaseError::CommandFailed {
            command: "git push origin v1.0.0".to_string(),
            status: 128,
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn test_error_display() {
        let err = ReleaseError::configuration("package-name is required");
        assert_eq!(
            err.to_string(),
            "Configuration error: package-name is required"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ReleaseError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_dependency_missing_lists_every_tool() {
        let err = ReleaseError::DependencyMissing {
            missing: vec!["opam".to_string(), "dune-release".to_string()],
        };
        assert_eq!(err.to_string(), "Missing required tools: opam, dune-release");
    }

    #[test]
    fn test_changelog_error_is_transparent() {
        let err: ReleaseError = ChangelogError::VersionNotFound {
            version: "v2.0.0".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "No changelog entry found for version v2.0.0");
    }

    #[test]
    fn test_guidance_for_push_permission() {
        let err = failed("remote: Permission to org/repo.git denied to bot.");
        let wrapped = err.with_credential_guidance();
        let msg = wrapped.to_string();
        assert!(matches!(wrapped, ReleaseError::Credential { .. }));
        assert!(msg.contains("Permission to org/repo.git denied"));
        assert!(msg.contains("not allowed to push"));
    }

    #[test]
    fn test_guidance_for_missing_scope() {
        let err = failed(
            "refusing to allow an OAuth App to create or update workflow without `workflow` scope",
        );
        let guidance = err.credential_guidance();
        assert_eq!(guidance.len(), 1);
        assert!(guidance[0].contains("OAuth scope"));
    }

    #[test]
    fn test_guidance_for_authentication() {
        let err = failed("fatal: Authentication failed for 'https://github.com/org/repo.git/'");
        assert!(err.credential_guidance()[0].contains("Authentication failed"));
    }

    #[test]
    fn test_unrelated_failure_is_unchanged() {
        let err = failed("fatal: not a git repository").with_credential_guidance();
        assert!(matches!(err, ReleaseError::CommandFailed { .. }));
        assert!(err.is_command_failure());
    }

    #[test]
    fn test_command_line_is_not_searched() {
        let err = ReleaseError::CommandFailed {
            command: "opam exec -- dune-release opam pkg -p ppx_scope --yes".to_string(),
            status: 1,
            stderr: "ppx_scope.opam: field 'synopsis' missing".to_string(),
        };
        assert!(err.credential_guidance().is_empty());
        assert!(matches!(
            err.with_credential_guidance(),
            ReleaseError::CommandFailed { .. }
        ));
    }

    #[test]
    fn test_bare_status_codes_do_not_match() {
        let err = failed("error: 403 files could not be checked; 401 skipped");
        assert!(err.credential_guidance().is_empty());
    }

    #[test]
    fn test_http_403_from_git() {
        let err = failed(
            "fatal: unable to access 'https://github.com/o/r.git/': The requested URL returned error: 403",
        );
        assert!(err.credential_guidance()[0].contains("not allowed to push"));
    }

    #[test]
    fn test_non_command_errors_are_not_wrapped() {
        let err = ReleaseError::configuration("403").with_credential_guidance();
        assert!(matches!(err, ReleaseError::Configuration(_)));
        assert!(!err.is_command_failure());
    }
}
