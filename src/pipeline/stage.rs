use std::fmt;

/// Release stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    DependencyCheck,
    TagCheck,
    Identity,
    VersionResolution,
    ChangelogValidation,
    ChangelogExtraction,
    Lint,
    RegistryPreparation,
    Distribution,
    Publish,
    Packaging,
    Submission,
    Report,
}

impl Stage {
    pub const ALL: [Stage; 13] = [
        Stage::DependencyCheck,
        Stage::TagCheck,
        Stage::Identity,
        Stage::VersionResolution,
        Stage::ChangelogValidation,
        Stage::ChangelogExtraction,
        Stage::Lint,
        Stage::RegistryPreparation,
        Stage::Distribution,
        Stage::Publish,
        Stage::Packaging,
        Stage::Submission,
        Stage::Report,
    ];

    /// Heading shown when the stage starts.
    pub fn title(&self) -> &'static str {
        match self {
            Stage::DependencyCheck => "Checking required tools",
            Stage::TagCheck => "Checking release tag",
            Stage::Identity => "Configuring Git for release",
            Stage::VersionResolution => "Resolving release version",
            Stage::ChangelogValidation => "Validating changelog",
            Stage::ChangelogExtraction => "Extracting version changelog",
            Stage::Lint => "Linting opam files",
            Stage::RegistryPreparation => "Preparing opam-repository fork",
            Stage::Distribution => "Distributing release archive",
            Stage::Publish => "Publishing to GitHub",
            Stage::Packaging => "Packaging opam release",
            Stage::Submission => "Submitting to opam repository",
            Stage::Report => "Reporting release",
        }
    }

    /// Whether a failure in this stage deletes the release tag.
    ///
    /// The first two stages run before anything is changed; the report stage
    /// never fails.
    pub fn rolls_back(&self) -> bool {
        (Stage::Identity..=Stage::Submission).contains(self)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}
