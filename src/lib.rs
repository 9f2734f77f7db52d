pub mod boundary;
pub mod changelog;
pub mod cli;
pub mod config;
pub mod error;
pub mod exec;
pub mod git;
pub mod pipeline;
pub mod tooling;
pub mod ui;
pub mod version;

pub use error::{ChangelogError, ReleaseError, Result};
