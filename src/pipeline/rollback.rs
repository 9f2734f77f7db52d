//! Tag rollback after a failed release.
//!
//! Deleting the tag lets the maintainer fix the problem and push the same
//! tag again. Every step is best-effort: a cleanup failure is reported as a
//! warning and never replaces the error that caused the rollback.

use crate::boundary::{BoundaryWarning, TagScope};
use crate::config::ReleaseContext;
use crate::error::Result;
use crate::git::SourceControl;
use crate::pipeline::PipelineRun;
use crate::ui;

/// What rollback did with the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RollbackSummary {
    pub skipped: bool,
    pub remote_deleted: bool,
    pub local_deleted: bool,
}

/// Delete the release tag remotely and locally.
///
/// Skipped entirely for validation runs (publish and submit both disabled).
/// Each side is only deleted when the tag is confirmed to be there.
pub fn rollback_tag<G: SourceControl + ?Sized>(
    git: &G,
    ctx: &ReleaseContext,
    run: &mut PipelineRun,
) -> RollbackSummary {
    let tag = ctx.tag();

    if !ctx.is_real_release() {
        ui::display_notice(&format!(
            "Validation run: publish and submit are disabled, tag {} is left in place",
            tag
        ));
        return RollbackSummary {
            skipped: true,
            ..Default::default()
        };
    }

    ui::display_error(&format!("Release failed, deleting tag {}", tag));

    if let Err(e) = git.rewrite_url("https://github.com/", ctx.token()) {
        run.warn(BoundaryWarning::UrlRewriteFailed {
            reason: e.to_string(),
        });
    }

    let summary = RollbackSummary {
        skipped: false,
        remote_deleted: delete_tag(
            run,
            tag,
            TagScope::Remote,
            git.remote_tag_exists(tag),
            || git.delete_remote_tag(tag),
        ),
        local_deleted: delete_tag(
            run,
            tag,
            TagScope::Local,
            git.local_tag_exists(tag),
            || git.delete_local_tag(tag),
        ),
    };

    if summary.remote_deleted || summary.local_deleted {
        ui::display_error(&format!(
            "Release failed - tag {} has been deleted. Please fix the issues and create a new tag.",
            tag
        ));
    }

    summary
}

fn delete_tag(
    run: &mut PipelineRun,
    tag: &str,
    scope: TagScope,
    present: Result<bool>,
    delete: impl FnOnce() -> Result<()>,
) -> bool {
    let failed = |run: &mut PipelineRun, reason: String| {
        run.warn(BoundaryWarning::TagCleanupFailed {
            tag: tag.to_string(),
            scope,
            reason,
        });
        false
    };

    match present {
        Ok(true) => match delete() {
            Ok(()) => {
                ui::display_status(&format!("{} tag {} deleted", scope, tag));
                true
            }
            Err(e) => failed(run, e.to_string()),
        },
        Ok(false) => {
            tracing::debug!("No {} tag {} to delete", scope, tag);
            false
        }
        Err(e) => failed(run, e.to_string()),
    }
}
