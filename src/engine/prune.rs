//! engine::prune
//!
//! Source-side deletion for move mode.
//!
//! Runs only after the destination push has succeeded. On the designated
//! source branch, each migrated type directory is deleted and committed
//! individually with a deterministic message, keeping the removals
//! auditable and revertable per type. The working copy is returned to the
//! original head afterwards.
//!
//! # Batch policy
//!
//! Deletion is deliberately best-effort per type, not transactional
//! across types: if a later type's removal fails, the earlier removal
//! commits remain on the source branch. Nothing is lost in that case -
//! the destination already holds the full history - and each partial
//! commit is individually revertable.

use thiserror::Error;

use crate::core::types::{BranchName, Oid, TypeName};
use crate::engine::workspace::OriginalHead;
use crate::git::{Git, GitError};

/// Errors from source pruning.
#[derive(Debug, Error)]
pub enum PruneError {
    /// A type directory failed to delete or commit; earlier removal
    /// commits remain on the branch.
    #[error("failed to remove {path} (earlier removals are committed): {source}")]
    RemovalFailed {
        /// The type directory path that failed
        path: String,
        /// The underlying failure
        source: GitError,
    },

    /// Underlying git failure outside the per-type loop.
    #[error(transparent)]
    Git(#[from] GitError),
}

/// Delete the migrated type directories from the source repository.
///
/// Checks out `branch` (at its current tip when it already exists,
/// otherwise created at `base`), commits one removal per type in the
/// order given with the message `Remove <path> (migrated)`, then returns
/// the checkout to `original`. Returns the removed paths.
pub fn prune_types(
    git: &Git,
    branch: &BranchName,
    base: &Oid,
    original: &OriginalHead,
    type_root: &str,
    names: &[TypeName],
) -> Result<Vec<String>, PruneError> {
    if !git.branch_exists(branch) {
        git.create_branch(branch, base)?;
    }
    git.checkout_branch(branch)?;

    let result = remove_each(git, type_root, names);

    // Return to the original head even when a removal failed.
    let restore = match original {
        OriginalHead::Branch(b) => git.checkout_branch(b),
        OriginalHead::Detached(oid) => git.checkout_detached(oid),
    };

    let removed = result?;
    restore?;
    Ok(removed)
}

fn remove_each(
    git: &Git,
    type_root: &str,
    names: &[TypeName],
) -> Result<Vec<String>, PruneError> {
    let mut removed = Vec::with_capacity(names.len());
    for name in names {
        let path = format!("{type_root}/{name}");
        let commit = git
            .remove_dir(&path)
            .and_then(|()| git.commit_index(&removal_message(&path)));
        match commit {
            Ok(_) => removed.push(path),
            Err(source) => return Err(PruneError::RemovalFailed { path, source }),
        }
    }
    Ok(removed)
}

/// The deterministic removal commit message for a type directory path.
pub fn removal_message(path: &str) -> String {
    format!("Remove {path} (migrated)")
}
