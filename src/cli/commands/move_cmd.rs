//! move command - copy type histories, then delete the originals.

use anyhow::{Context as _, Result};

use crate::cli::commands::copy::{build_request, report_result};
use crate::core::types::BranchName;
use crate::engine::{self, Mode};
use crate::ui::output::Verbosity;

/// Move the named types: copy to the destination, then remove them from
/// the source on `source_branch` (defaulting to the destination branch
/// name), one commit per type.
#[allow(clippy::too_many_arguments)]
pub fn move_types(
    source: &str,
    source_prefix: Option<&str>,
    source_branch: Option<&str>,
    dest: &str,
    dest_prefix: Option<&str>,
    branch: &str,
    types: &[String],
    verbosity: Verbosity,
) -> Result<()> {
    let source_branch = BranchName::new(source_branch.unwrap_or(branch))
        .context("invalid source branch")?;

    let request = build_request(
        source,
        source_prefix,
        dest,
        dest_prefix,
        branch,
        types,
        Mode::Move { source_branch },
    )?;

    let report = engine::migrate(&request, verbosity)?;
    report_result(&report, dest, branch, verbosity);
    Ok(())
}
