//! Pure formatting functions for UI output.
//!
//! Everything the user sees goes through here. Routine command tracing is
//! not printed here; it is emitted with `tracing::debug!` and only shows up
//! in verbose mode.

use console::style;

use crate::boundary::BoundaryWarning;

/// Error line, red label.
pub fn format_error(message: &str) -> String {
    format!("{} {}", style("ERROR:").red().bold(), message)
}

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{}", format_error(message));
}

pub fn format_warning(message: &str) -> String {
    format!("{} {}", style("⚠ WARNING:").yellow(), message)
}

/// Format and print a warning in yellow.
///
/// Warnings are always shown, regardless of verbosity.
pub fn display_warning(message: &str) {
    eprintln!("{}", format_warning(message));
}

/// Display a boundary warning to the user.
pub fn display_boundary_warning(warning: &BoundaryWarning) {
    display_warning(&warning.to_string());
}

pub fn format_success(message: &str) -> String {
    format!("{} {}", style("✓").green(), message)
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{}", format_success(message));
}

pub fn format_status(message: &str) -> String {
    format!("{} {}", style("→").yellow(), message)
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{}", format_status(message));
}

pub fn format_notice(message: &str) -> String {
    format!("{} {}", style("ℹ").cyan(), message)
}

/// Format and print a notice in cyan.
pub fn display_notice(message: &str) {
    println!("{}", format_notice(message));
}

/// Print the heading of a pipeline step.
pub fn display_group(title: &str) {
    println!("\n{}", style(title).bold());
}

pub fn format_skip(step: &str, reason: &str) -> String {
    format!("{} {} ({})", style("↷").dim(), step, reason)
}

/// Announce a step that was turned off by configuration.
pub fn display_skip(step: &str, reason: &str) {
    println!("{}", format_skip(step, reason));
}

/// Render the run configuration banner.
///
/// # Arguments
/// * `title` - Banner heading
/// * `rows` - Label/value pairs, printed in order
pub fn format_banner(title: &str, rows: &[(&str, String)]) -> String {
    let mut lines = vec![style(format!("=== {} ===", title)).bold().to_string()];
    for (label, value) in rows {
        lines.push(format!("{}: {}", label, value));
    }
    lines.push(style("=".repeat(title.len() + 8)).bold().to_string());
    lines.join("\n")
}

/// Print the run configuration banner.
pub fn display_banner(title: &str, rows: &[(&str, String)]) {
    println!("{}", format_banner(title, rows));
}
