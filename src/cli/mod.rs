//! Command-line shell around the release pipeline.

pub mod orchestration;

pub use orchestration::{record_outputs, run_release_workflow, ReleaseStatus, WorkflowResult};
