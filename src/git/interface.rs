//! git::interface
//!
//! Git interface implementation using git2.
//!
//! The [`Git`] struct is the only way to interact with a Git repository.
//! It normalizes git2 errors into typed failure categories so higher
//! layers can distinguish precondition failures (dirty worktree, missing
//! refs) from external-tool failures (push rejection).
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::NotARepo`]: Not inside a Git repository
//! - [`GitError::RefNotFound`]: Requested ref does not exist
//! - [`GitError::DirtyWorktree`]: Working tree has uncommitted changes
//! - [`GitError::PushRejected`]: The destination refused the push

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::types::{BranchName, Oid, TypeError};

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported as a source")]
    BareRepo,

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// A git operation (rebase, merge, ...) is in progress.
    #[error("{operation} in progress; finish or abort it first")]
    OperationInProgress {
        /// The kind of operation in progress
        operation: String,
    },

    /// Working tree has uncommitted changes.
    #[error("working tree is not clean: {details}")]
    DirtyWorktree {
        /// Description of what's dirty
        details: String,
    },

    /// The destination rejected the push.
    #[error("push to {dest} rejected: {message}")]
    PushRejected {
        /// The destination URL
        dest: String,
        /// The underlying transport or ref-update error
        message: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// Commit signature could not be built (missing user.name/user.email).
    #[error("cannot determine committer identity: {message}")]
    MissingIdentity {
        /// The underlying configuration error
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound if context.starts_with("refs/") => GitError::RefNotFound {
                refname: context.to_string(),
            },
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: context.to_string(),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        GitError::Internal {
            message: err.to_string(),
        }
    }
}

/// Summary of working tree status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorktreeStatus {
    /// Number of staged changes
    pub staged: usize,
    /// Number of unstaged changes to tracked files
    pub unstaged: usize,
    /// Number of untracked files
    pub untracked: usize,
    /// Whether there are unresolved conflicts
    pub has_conflicts: bool,
}

impl WorktreeStatus {
    /// Check if the worktree is completely pristine.
    ///
    /// Unlike a plain `git status` cleanliness check this also counts
    /// untracked files: the rewrite checks out other commits in place, so
    /// anything not committed would be clobbered or dragged along.
    pub fn is_pristine(&self) -> bool {
        self.staged == 0 && self.unstaged == 0 && self.untracked == 0 && !self.has_conflicts
    }

    /// Human-readable summary of what is dirty.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if self.staged > 0 {
            parts.push(format!("{} staged", self.staged));
        }
        if self.unstaged > 0 {
            parts.push(format!("{} unstaged", self.unstaged));
        }
        if self.untracked > 0 {
            parts.push(format!("{} untracked", self.untracked));
        }
        if self.has_conflicts {
            parts.push("unresolved conflicts".to_string());
        }
        if parts.is_empty() {
            "clean".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// The Git interface.
///
/// This is the **single point of interaction** with Git. All repository
/// reads and writes flow through this interface. No other module should
/// import `git2` directly.
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Repository Opening and Info
    // =========================================================================

    /// Open a repository at the given path.
    ///
    /// Uses `git2::Repository::discover` to find the repository root, so
    /// `path` can be any directory within the repository.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }

        Ok(Self { repo })
    }

    /// Path to the working directory.
    pub fn workdir(&self) -> Result<&Path, GitError> {
        self.repo.workdir().ok_or(GitError::BareRepo)
    }

    /// Access to the underlying git2 repository for the rewrite engine.
    ///
    /// Restricted to the git module so the single-doorway rule holds.
    pub(super) fn raw(&self) -> &git2::Repository {
        &self.repo
    }

    // =========================================================================
    // State and Working Tree Status
    // =========================================================================

    /// The in-progress operation (rebase, merge, ...), if any.
    pub fn operation_in_progress(&self) -> Option<&'static str> {
        match self.repo.state() {
            git2::RepositoryState::Clean => None,
            git2::RepositoryState::Rebase
            | git2::RepositoryState::RebaseInteractive
            | git2::RepositoryState::RebaseMerge => Some("rebase"),
            git2::RepositoryState::Merge => Some("merge"),
            git2::RepositoryState::CherryPick | git2::RepositoryState::CherryPickSequence => {
                Some("cherry-pick")
            }
            git2::RepositoryState::Revert | git2::RepositoryState::RevertSequence => Some("revert"),
            git2::RepositoryState::Bisect => Some("bisect"),
            git2::RepositoryState::ApplyMailbox | git2::RepositoryState::ApplyMailboxOrRebase => {
                Some("apply-mailbox")
            }
        }
    }

    /// Get working tree status summary, including untracked files.
    pub fn worktree_status(&self) -> Result<WorktreeStatus, GitError> {
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = self
            .repo
            .statuses(Some(&mut opts))
            .map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })?;

        let mut result = WorktreeStatus::default();

        for entry in statuses.iter() {
            let status = entry.status();

            if status.is_conflicted() {
                result.has_conflicts = true;
            }
            if status.is_index_new()
                || status.is_index_modified()
                || status.is_index_deleted()
                || status.is_index_renamed()
                || status.is_index_typechange()
            {
                result.staged += 1;
            }
            if status.is_wt_modified()
                || status.is_wt_deleted()
                || status.is_wt_renamed()
                || status.is_wt_typechange()
            {
                result.unstaged += 1;
            }
            if status.is_wt_new() {
                result.untracked += 1;
            }
        }

        Ok(result)
    }

    // =========================================================================
    // Ref Resolution
    // =========================================================================

    /// Get HEAD commit OID.
    ///
    /// # Errors
    ///
    /// - [`GitError::RefNotFound`] if HEAD is unborn (new repository)
    pub fn head_oid(&self) -> Result<Oid, GitError> {
        let head = self
            .repo
            .head()
            .map_err(|e| GitError::from_git2(e, "refs/HEAD"))?;

        let oid = head
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, "HEAD"))?
            .id();

        Oid::new(oid.to_string()).map_err(|e| e.into())
    }

    /// Get the current branch name, if on a branch.
    ///
    /// Returns `None` if HEAD is detached or unborn.
    pub fn current_branch(&self) -> Result<Option<BranchName>, GitError> {
        let head = match self.repo.head() {
            Ok(h) => h,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if head.is_branch() {
            if let Ok(name) = head.shorthand() {
                return Ok(Some(BranchName::new(name)?));
            }
        }

        Ok(None) // Detached HEAD
    }

    /// Check if a ref exists.
    pub fn ref_exists(&self, refname: &str) -> bool {
        self.repo.find_reference(refname).is_ok()
    }

    /// Check if a local branch exists.
    pub fn branch_exists(&self, branch: &BranchName) -> bool {
        self.ref_exists(&branch.refname())
    }

    /// Resolve a branch to its tip OID.
    pub fn branch_tip(&self, branch: &BranchName) -> Result<Oid, GitError> {
        let refname = branch.refname();
        let reference = self
            .repo
            .find_reference(&refname)
            .map_err(|e| GitError::from_git2(e, &refname))?;
        let oid = reference
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, &refname))?
            .id();
        Oid::new(oid.to_string()).map_err(|e| e.into())
    }

    /// List full names of all refs under a prefix.
    pub fn list_refs_by_prefix(&self, prefix: &str) -> Result<Vec<String>, GitError> {
        let pattern = format!("{prefix}*");
        let refs = self
            .repo
            .references_glob(&pattern)
            .map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })?;

        let mut names = Vec::new();
        for reference in refs {
            let reference = reference.map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })?;
            if let Ok(name) = reference.name() {
                names.push(name.to_string());
            }
        }

        Ok(names)
    }

    /// Delete a ref by full name. Deleting a missing ref is not an error.
    pub fn delete_ref(&self, refname: &str) -> Result<(), GitError> {
        match self.repo.find_reference(refname) {
            Ok(mut reference) => reference
                .delete()
                .map_err(|e| GitError::from_git2(e, refname)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(()),
            Err(e) => Err(GitError::from_git2(e, refname)),
        }
    }

    /// Delete every ref under a prefix. Idempotent.
    pub fn delete_refs_by_prefix(&self, prefix: &str) -> Result<(), GitError> {
        for refname in self.list_refs_by_prefix(prefix)? {
            self.delete_ref(&refname)?;
        }
        Ok(())
    }

    // =========================================================================
    // Branch Operations
    // =========================================================================

    /// Create a local branch pointing at the given commit.
    pub fn create_branch(&self, branch: &BranchName, target: &Oid) -> Result<(), GitError> {
        let oid = git2::Oid::from_str(target.as_str())
            .map_err(|e| GitError::from_git2(e, target.as_str()))?;
        let commit = self
            .repo
            .find_commit(oid)
            .map_err(|e| GitError::from_git2(e, target.as_str()))?;

        self.repo
            .branch(branch.as_str(), &commit, false)
            .map_err(|e| GitError::from_git2(e, branch.as_str()))?;

        Ok(())
    }

    /// Check out a local branch, forcibly resetting index and worktree.
    ///
    /// The force is deliberate: during cleanup the worktree may still hold
    /// the rewritten tree of the temporary branch.
    pub fn checkout_branch(&self, branch: &BranchName) -> Result<(), GitError> {
        let refname = branch.refname();
        let mut opts = git2::build::CheckoutBuilder::new();
        opts.force();

        let object = self
            .repo
            .revparse_single(&refname)
            .map_err(|e| GitError::from_git2(e, &refname))?;
        self.repo
            .checkout_tree(&object, Some(&mut opts))
            .map_err(|e| GitError::from_git2(e, &refname))?;
        self.repo
            .set_head(&refname)
            .map_err(|e| GitError::from_git2(e, &refname))?;

        Ok(())
    }

    /// Check out a commit directly, leaving HEAD detached.
    pub fn checkout_detached(&self, target: &Oid) -> Result<(), GitError> {
        let oid = git2::Oid::from_str(target.as_str())
            .map_err(|e| GitError::from_git2(e, target.as_str()))?;
        let commit = self
            .repo
            .find_commit(oid)
            .map_err(|e| GitError::from_git2(e, target.as_str()))?;

        let mut opts = git2::build::CheckoutBuilder::new();
        opts.force();
        self.repo
            .checkout_tree(commit.as_object(), Some(&mut opts))
            .map_err(|e| GitError::from_git2(e, target.as_str()))?;
        self.repo
            .set_head_detached(oid)
            .map_err(|e| GitError::from_git2(e, target.as_str()))?;

        Ok(())
    }

    /// Delete a local branch. Deleting a missing branch is not an error.
    pub fn delete_branch(&self, branch: &BranchName) -> Result<(), GitError> {
        match self.repo.find_branch(branch.as_str(), git2::BranchType::Local) {
            Ok(mut b) => b.delete().map_err(|e| GitError::from_git2(e, branch.as_str())),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(()),
            Err(e) => Err(GitError::from_git2(e, branch.as_str())),
        }
    }

    // =========================================================================
    // Worktree Mutation (source pruning)
    // =========================================================================

    /// Remove a directory from both the index and the working tree.
    ///
    /// `relpath` is relative to the repository root. Missing paths are an
    /// error: the caller has already verified the directory exists.
    pub fn remove_dir(&self, relpath: &str) -> Result<(), GitError> {
        let workdir = self.workdir()?;
        let full = workdir.join(relpath);
        if !full.is_dir() {
            return Err(GitError::Internal {
                message: format!("{relpath} is not a directory in the working tree"),
            });
        }

        let mut index = self.repo.index().map_err(|e| GitError::Internal {
            message: e.message().to_string(),
        })?;
        index
            .remove_dir(Path::new(relpath), 0)
            .map_err(|e| GitError::from_git2(e, relpath))?;
        index.write().map_err(|e| GitError::Internal {
            message: e.message().to_string(),
        })?;

        std::fs::remove_dir_all(&full).map_err(|e| GitError::Internal {
            message: format!("cannot remove {}: {e}", full.display()),
        })?;

        Ok(())
    }

    /// Commit the current index on top of HEAD with the given message.
    ///
    /// Uses the repository's configured identity for both author and
    /// committer. Returns the new commit OID.
    pub fn commit_index(&self, message: &str) -> Result<Oid, GitError> {
        let sig = self.repo.signature().map_err(|e| GitError::MissingIdentity {
            message: e.message().to_string(),
        })?;

        let mut index = self.repo.index().map_err(|e| GitError::Internal {
            message: e.message().to_string(),
        })?;
        let tree_oid = index.write_tree().map_err(|e| GitError::Internal {
            message: e.message().to_string(),
        })?;
        let tree = self.repo.find_tree(tree_oid).map_err(|e| GitError::Internal {
            message: e.message().to_string(),
        })?;

        let parent = self
            .repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;

        let oid = self
            .repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &[&parent])
            .map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })?;

        Oid::new(oid.to_string()).map_err(|e| e.into())
    }

    // =========================================================================
    // Remote Operations
    // =========================================================================

    /// Push a local branch to a destination repository, force-updating the
    /// destination branch.
    ///
    /// `dest_url` must already be in resolved, absolute form (see
    /// [`crate::core::types::RepoLocation::resolved`]); this method never
    /// consults the ambient working directory.
    ///
    /// # Errors
    ///
    /// - [`GitError::PushRejected`] on transport, auth, or ref-update
    ///   failure. The destination is never locally mutated by this process,
    ///   so no destination cleanup is attempted.
    pub fn push_branch(
        &self,
        local: &BranchName,
        dest_url: &str,
        dest_branch: &BranchName,
    ) -> Result<(), GitError> {
        let mut remote =
            self.repo
                .remote_anonymous(dest_url)
                .map_err(|e| GitError::PushRejected {
                    dest: dest_url.to_string(),
                    message: e.message().to_string(),
                })?;

        let refspec = format!("+{}:{}", local.refname(), dest_branch.refname());
        remote
            .push(&[refspec.as_str()], None)
            .map_err(|e| GitError::PushRejected {
                dest: dest_url.to_string(),
                message: e.message().to_string(),
            })?;

        Ok(())
    }

    /// Check whether the repository at `url` has no refs at all.
    ///
    /// Used by `make-set`, which requires a freshly initialized destination.
    pub fn remote_is_empty(url: &str) -> Result<bool, GitError> {
        let mut remote = git2::Remote::create_detached(url).map_err(|e| GitError::Internal {
            message: format!("{url}: {}", e.message()),
        })?;
        remote
            .connect(git2::Direction::Fetch)
            .map_err(|e| GitError::Internal {
                message: format!("cannot reach {url}: {}", e.message()),
            })?;
        let heads = remote.list().map_err(|e| GitError::Internal {
            message: format!("cannot list refs of {url}: {}", e.message()),
        })?;
        Ok(heads.is_empty())
    }
}
