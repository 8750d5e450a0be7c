//! copy command - copy type histories to a destination repository.

use anyhow::{Context as _, Result};

use crate::core::types::{BranchName, RepoLocation, TypeName};
use crate::engine::{self, MigrateRequest, Mode};
use crate::ui::output::{self, Verbosity};

/// Copy the named types, with history, to a branch of the destination.
#[allow(clippy::too_many_arguments)]
pub fn copy(
    source: &str,
    source_prefix: Option<&str>,
    dest: &str,
    dest_prefix: Option<&str>,
    branch: &str,
    types: &[String],
    verbosity: Verbosity,
) -> Result<()> {
    let request = build_request(
        source,
        source_prefix,
        dest,
        dest_prefix,
        branch,
        types,
        Mode::Copy,
    )?;

    let report = engine::migrate(&request, verbosity)?;
    report_result(&report, dest, branch, verbosity);
    Ok(())
}

/// Shared request construction for copy and move.
pub(super) fn build_request(
    source: &str,
    source_prefix: Option<&str>,
    dest: &str,
    dest_prefix: Option<&str>,
    branch: &str,
    types: &[String],
    mode: Mode,
) -> Result<MigrateRequest> {
    let dest_branch = BranchName::new(branch).context("invalid destination branch")?;
    let types = types
        .iter()
        .map(|t| TypeName::new(t.clone()))
        .collect::<Result<Vec<_>, _>>()
        .context("invalid type name")?;

    Ok(MigrateRequest {
        source: RepoLocation::parse(source),
        source_prefix: source_prefix.map(String::from),
        dest: RepoLocation::parse(dest),
        dest_prefix: dest_prefix.map(String::from),
        dest_branch,
        types,
        mode,
    })
}

/// Print the standard post-migration summary.
pub(super) fn report_result(
    report: &engine::MigrateReport,
    dest: &str,
    branch: &str,
    verbosity: Verbosity,
) {
    match &report.pushed_tip {
        Some(tip) => {
            output::print(
                format!(
                    "pushed {} commits to {dest} ({branch}), tip {}",
                    report.rewritten,
                    tip.short(12)
                ),
                verbosity,
            );
            output::debug(format!("{} empty commits dropped", report.dropped), verbosity);
        }
        None => output::print("nothing to do", verbosity),
    }
}
