//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to Git. All repository reads and
//! writes flow through this interface, including the history rewrite.
//! No other module imports `git2`; the rewrite engine is driven through
//! structured library calls, never through interpolated command strings.
//!
//! # Responsibilities
//!
//! - Repository discovery and opening
//! - Working-tree cleanliness and in-progress-operation checks
//! - Branch and ref operations (create, checkout, delete, enumerate)
//! - The history rewrite ([`rewrite_branch`])
//! - Publishing a branch to a destination repository
//!
//! # Invariants
//!
//! - No other module calls git2 directly
//! - All operations return strong types (Oid, BranchName)
//! - Destination repositories are only ever touched by push

mod interface;
mod rewrite;

pub use interface::{Git, GitError, WorktreeStatus};
pub use rewrite::{rewrite_branch, Relocation, RewriteError, RewriteOutcome, BACKUP_REF_NAMESPACE};
