//! engine
//!
//! Orchestrates one migration invocation.
//!
//! # Control flow
//!
//! ```text
//! preflight -> compile filter -> workspace (snapshot oldref, temp branch)
//!           -> rewrite -> push -> cleanup -> [move mode: prune] -> report
//! ```
//!
//! Every precondition is checked before any ref is created; from then on
//! the workspace guarantees the source repository is restored on every
//! exit path. Source-side deletion happens strictly after a successful
//! push.

pub mod prune;
pub mod set;
pub mod workspace;

use std::path::PathBuf;

use thiserror::Error;

use crate::core::filter::{FilterError, PathFilter};
use crate::core::types::{type_root, BranchName, Oid, RepoLocation, TypeError, TypeName};
use crate::git::{rewrite_branch, Git, GitError, Relocation, RewriteError};
use crate::ui::output::{self, Verbosity};

use prune::PruneError;
use workspace::{Workspace, WorkspaceError};

/// Errors from the migration engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The source must be a local working copy; the rewrite runs in place.
    #[error("source repository must be a local path, got {spec}")]
    SourceNotLocal {
        /// The offending repository spec
        spec: String,
    },

    /// The source working tree is not pristine.
    #[error("source working tree is not clean ({details}); commit or stash first")]
    DirtyWorktree {
        /// What is dirty
        details: String,
    },

    /// A git operation is already in progress in the source repository.
    #[error("a {operation} is in progress in the source repository")]
    OperationInProgress {
        /// The operation kind
        operation: String,
    },

    /// A requested type directory does not exist in the source.
    #[error("type directory not found: {path}")]
    MissingTypeDir {
        /// The missing directory
        path: PathBuf,
    },

    /// The destination repository is not empty (make-set requirement).
    #[error("destination repository {dest} is not empty")]
    DestinationNotEmpty {
        /// The destination spec
        dest: String,
    },

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error(transparent)]
    Prune(#[from] PruneError),
}

/// Operation mode.
#[derive(Debug, Clone)]
pub enum Mode {
    /// Copy histories; the source is left untouched.
    Copy,
    /// Copy histories, then delete the originals on `source_branch`.
    Move {
        /// Branch receiving the per-type removal commits.
        source_branch: BranchName,
    },
}

/// One migration invocation.
#[derive(Debug, Clone)]
pub struct MigrateRequest {
    /// The source repository (must be a local working copy).
    pub source: RepoLocation,
    /// Optional path prefix of the source type directory.
    pub source_prefix: Option<String>,
    /// The destination repository.
    pub dest: RepoLocation,
    /// Optional path prefix of the destination type directory.
    pub dest_prefix: Option<String>,
    /// The destination branch to create or force-update.
    pub dest_branch: BranchName,
    /// The concrete type names to migrate, in order.
    pub types: Vec<TypeName>,
    /// Copy or move.
    pub mode: Mode,
}

/// What one invocation did.
#[derive(Debug, Default)]
pub struct MigrateReport {
    /// The pushed destination tip; `None` for the empty-type-list no-op.
    pub pushed_tip: Option<Oid>,
    /// Commits recreated with filtered content.
    pub rewritten: usize,
    /// Commits dropped as empty.
    pub dropped: usize,
    /// Source paths removed in move mode.
    pub removed: Vec<String>,
}

/// Run one migration.
///
/// A zero-length type list is a no-op returning immediately with success,
/// without touching either repository.
pub fn migrate(req: &MigrateRequest, verbosity: Verbosity) -> Result<MigrateReport, EngineError> {
    if req.types.is_empty() {
        return Ok(MigrateReport::default());
    }

    // ---- Preflight: nothing below this block may run before every
    // precondition holds; no ref has been created yet. ----
    let src_path = req
        .source
        .local_path()
        .ok_or_else(|| EngineError::SourceNotLocal {
            spec: req.source.to_string(),
        })?;
    let git = Git::open(src_path)?;

    if let Some(operation) = git.operation_in_progress() {
        return Err(EngineError::OperationInProgress {
            operation: operation.to_string(),
        });
    }

    let status = git.worktree_status()?;
    if !status.is_pristine() {
        return Err(EngineError::DirtyWorktree {
            details: status.describe(),
        });
    }

    let src_root = type_root(req.source_prefix.as_deref());
    let workdir = git.workdir()?;
    for name in &req.types {
        let dir = workdir.join(&src_root).join(name.as_str());
        if !dir.is_dir() {
            return Err(EngineError::MissingTypeDir { path: dir });
        }
    }

    let filter = PathFilter::compile(&src_root, &req.types)?;

    // Resolve the destination to absolute form exactly once, before any
    // mutation, so the push never depends on ambient working directory.
    let dest_url = req.dest.resolved()?;
    let dest_root = type_root(req.dest_prefix.as_deref());
    let relocation = (src_root != dest_root).then(|| Relocation {
        from: src_root.clone(),
        to: dest_root,
    });

    // ---- Mutation begins. The workspace restores the repository on
    // every exit path from here on. ----
    let mut ws = Workspace::begin(&git)?;
    output::debug(
        format!("rewriting on {} (was on {})", ws.temp_branch(), ws.original_head()),
        verbosity,
    );

    let attempt = rewrite_and_push(&git, &ws, req, &filter, relocation.as_ref(), &dest_url);
    let cleanup = ws.cleanup();
    let outcome = attempt?;
    cleanup?;

    let mut report = MigrateReport {
        pushed_tip: Some(outcome.new_tip),
        rewritten: outcome.rewritten,
        dropped: outcome.dropped,
        removed: Vec::new(),
    };

    if let Mode::Move { source_branch } = &req.mode {
        report.removed = prune::prune_types(
            &git,
            source_branch,
            ws.base_oid(),
            ws.original_head(),
            &src_root,
            &req.types,
        )?;
        for path in &report.removed {
            output::print(format!("removed {path}"), verbosity);
        }
    }

    Ok(report)
}

fn rewrite_and_push(
    git: &Git,
    ws: &Workspace<'_>,
    req: &MigrateRequest,
    filter: &PathFilter,
    relocation: Option<&Relocation>,
    dest_url: &str,
) -> Result<crate::git::RewriteOutcome, EngineError> {
    let outcome = rewrite_branch(git, ws.temp_branch(), filter, relocation)?;
    git.push_branch(ws.temp_branch(), dest_url, &req.dest_branch)?;
    Ok(outcome)
}

/// Verify that the destination repository has no refs yet.
///
/// `make-set` populates freshly created set repositories and refuses to
/// write into one that already has history.
pub fn ensure_destination_empty(dest: &RepoLocation) -> Result<(), EngineError> {
    let url = dest.resolved()?;
    if Git::remote_is_empty(&url)? {
        Ok(())
    } else {
        Err(EngineError::DestinationNotEmpty {
            dest: dest.to_string(),
        })
    }
}
