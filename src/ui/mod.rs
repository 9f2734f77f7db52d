//! User interface module
//!
//! The release runs unattended, so there are no prompts: this module only
//! formats output. See [formatter] for the individual display functions.

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_banner, display_boundary_warning, display_error, display_group, display_notice,
    display_skip, display_status, display_success, display_warning,
};

use crate::config::ReleaseContext;

/// Print the configuration a run is about to use.
pub fn display_release_banner(ctx: &ReleaseContext, fork: &str) {
    let mode = if ctx.is_real_release() {
        "FULL RELEASE"
    } else {
        "VALIDATION ONLY (publish and submit disabled)"
    };
    display_banner(
        "OCaml Dune Release",
        &[
            ("Package", ctx.package().to_string()),
            ("Changelog", ctx.changelog().display().to_string()),
            ("Tag", ctx.tag().to_string()),
            ("Release user", ctx.actor().to_string()),
            ("Registry fork", fork.to_string()),
            ("Publish to GitHub", ctx.publish().to_string()),
            ("Submit to opam", ctx.submit().to_string()),
            ("Mode", mode.to_string()),
        ],
    );
}
