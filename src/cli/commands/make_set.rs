//! make-set command - populate an empty set repository from type globs.

use anyhow::{bail, Context as _, Result};

use crate::cli::commands::copy::{build_request, report_result};
use crate::core::types::{type_root, BranchName, RepoLocation};
use crate::engine::{self, set, Mode};
use crate::git::Git;
use crate::ui::output::{self, Verbosity};

/// The conventional branch name for newly created set repositories.
const SET_BRANCH: &str = "main";

/// Build a set repository: expand the globs against the source's current
/// type listing and migrate every match to the destination's `main`
/// branch. The destination must be empty.
pub fn make_set(
    delete_source: bool,
    source: &str,
    source_prefix: Option<&str>,
    source_branch: Option<&str>,
    dest: &str,
    globs: &[String],
    verbosity: Verbosity,
) -> Result<()> {
    if globs.is_empty() {
        output::print("nothing to do", verbosity);
        return Ok(());
    }

    let mode = if delete_source {
        let Some(branch) = source_branch else {
            bail!("--source-branch is required with --delete-source");
        };
        Mode::Move {
            source_branch: BranchName::new(branch).context("invalid source branch")?,
        }
    } else {
        Mode::Copy
    };

    // Expand globs against the current listing before anything else; the
    // concrete name list is what the core operates on.
    let source_loc = RepoLocation::parse(source);
    let src_path = source_loc
        .local_path()
        .context("source repository must be a local path")?;
    let git = Git::open(src_path).context("cannot open source repository")?;
    let names = set::expand_type_globs(
        git.workdir()?,
        &type_root(source_prefix),
        globs,
    )?;
    output::debug(
        format!(
            "globs expanded to: {}",
            names
                .iter()
                .map(|n| n.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ),
        verbosity,
    );

    engine::ensure_destination_empty(&RepoLocation::parse(dest))?;

    let types: Vec<String> = names.iter().map(|n| n.as_str().to_string()).collect();
    let request = build_request(
        source,
        source_prefix,
        dest,
        None,
        SET_BRANCH,
        &types,
        mode,
    )?;

    let report = engine::migrate(&request, verbosity)?;
    report_result(&report, dest, SET_BRANCH, verbosity);
    Ok(())
}
