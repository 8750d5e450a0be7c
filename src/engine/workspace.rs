//! engine::workspace
//!
//! The temporary branch manager.
//!
//! A [`Workspace`] is the sandbox for the destructive rewrite: it records
//! where the repository was (`oldref`), creates a uniquely named temporary
//! branch at the current tip, and checks it out. Its `cleanup` restores
//! everything - backup refs, checkout, temporary branch - and runs on
//! every exit path: called explicitly on the success and error paths,
//! backstopped by the `Drop` impl for panics and early `?` returns, and
//! by a SIGINT/SIGTERM handler for external interruption. Cleanup is
//! idempotent.
//!
//! Only SIGKILL can leave residue behind. That residue is recoverable:
//! the next `begin()` sweeps stale backup refs, and the leftover temp
//! checkout is an ordinary branch switch away.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use thiserror::Error;
use uuid::Uuid;

use crate::core::types::{BranchName, Oid};
use crate::git::{Git, GitError, BACKUP_REF_NAMESPACE};

/// Errors from workspace lifecycle operations.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// HEAD could not be read (unborn repository).
    #[error("repository has no commits yet")]
    UnbornHead,

    /// A unique temporary branch name could not be allocated.
    #[error("could not allocate a unique temporary branch name")]
    NameExhausted,

    /// Underlying git failure.
    #[error(transparent)]
    Git(#[from] GitError),
}

/// Where the repository was before the workspace took over.
#[derive(Debug, Clone)]
pub enum OriginalHead {
    /// HEAD was on a branch.
    Branch(BranchName),
    /// HEAD was detached at a commit.
    Detached(Oid),
}

impl std::fmt::Display for OriginalHead {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Branch(b) => write!(f, "{b}"),
            Self::Detached(oid) => write!(f, "{}", oid.short(12)),
        }
    }
}

/// An active rewrite sandbox: one temporary branch plus any backup refs
/// the rewrite engine creates under the reserved namespace.
pub struct Workspace<'a> {
    git: &'a Git,
    temp: BranchName,
    original: OriginalHead,
    base: Oid,
    cleaned: bool,
}

impl<'a> Workspace<'a> {
    /// Begin a workspace: snapshot the original head, clear stale backup
    /// refs from any previously interrupted run, create the temporary
    /// branch at the current tip, check it out, and arm the interrupt
    /// handler.
    pub fn begin(git: &'a Git) -> Result<Self, WorkspaceError> {
        // Stale backup refs would make a fresh rewrite refuse to overwrite
        // its safety net; clear them up front.
        git.delete_refs_by_prefix(BACKUP_REF_NAMESPACE)?;

        let base = git.head_oid().map_err(|e| match e {
            GitError::RefNotFound { .. } => WorkspaceError::UnbornHead,
            other => WorkspaceError::Git(other),
        })?;
        let original = match git.current_branch()? {
            Some(branch) => OriginalHead::Branch(branch),
            None => OriginalHead::Detached(base.clone()),
        };

        let temp = allocate_branch_name(git)?;
        git.create_branch(&temp, &base)?;
        git.checkout_branch(&temp)?;

        install_interrupt_handler();
        arm_interrupt_guard(GuardState {
            repo_path: git.workdir()?.to_path_buf(),
            temp: temp.clone(),
            original: original.clone(),
        });

        Ok(Self {
            git,
            temp,
            original,
            base,
            cleaned: false,
        })
    }

    /// The temporary branch this workspace owns.
    pub fn temp_branch(&self) -> &BranchName {
        &self.temp
    }

    /// The head the repository was on before `begin`.
    pub fn original_head(&self) -> &OriginalHead {
        &self.original
    }

    /// The commit the original head pointed at when the workspace began.
    pub fn base_oid(&self) -> &Oid {
        &self.base
    }

    /// Restore the repository: delete backup refs, return the checkout to
    /// the original head, and delete the temporary branch.
    ///
    /// Idempotent: safe to call again, or when nothing needs cleaning.
    pub fn cleanup(&mut self) -> Result<(), WorkspaceError> {
        if self.cleaned {
            return Ok(());
        }

        disarm_interrupt_guard();
        restore(self.git, &self.temp, &self.original)?;
        self.cleaned = true;
        Ok(())
    }
}

impl Drop for Workspace<'_> {
    fn drop(&mut self) {
        // Backstop for panics and early error returns; cleanup failures
        // here cannot be surfaced, explicit cleanup reports them instead.
        let _ = self.cleanup();
    }
}

/// Restore a repository from an active rewrite: delete backup refs,
/// return the checkout to `original` if it is still on `temp`, and delete
/// the temporary branch. Shared by `cleanup` and the interrupt handler,
/// which runs it on a freshly opened handle.
fn restore(git: &Git, temp: &BranchName, original: &OriginalHead) -> Result<(), WorkspaceError> {
    git.delete_refs_by_prefix(BACKUP_REF_NAMESPACE)?;

    let on_temp = matches!(
        git.current_branch()?,
        Some(ref current) if current == temp
    );
    if on_temp {
        match original {
            OriginalHead::Branch(branch) => git.checkout_branch(branch)?,
            OriginalHead::Detached(oid) => git.checkout_detached(oid)?,
        }
    }

    git.delete_branch(temp)?;
    Ok(())
}

/// Cleanup state for the interrupt handler, which cannot borrow the live
/// workspace and instead reopens the repository by path.
struct GuardState {
    repo_path: PathBuf,
    temp: BranchName,
    original: OriginalHead,
}

static INTERRUPT_GUARD: Mutex<Option<GuardState>> = Mutex::new(None);

fn arm_interrupt_guard(state: GuardState) {
    if let Ok(mut guard) = INTERRUPT_GUARD.lock() {
        *guard = Some(state);
    }
}

fn disarm_interrupt_guard() {
    if let Ok(mut guard) = INTERRUPT_GUARD.lock() {
        *guard = None;
    }
}

/// Install the SIGINT/SIGTERM handler once per process.
///
/// The handler restores whatever workspace is armed at signal time, then
/// exits through the standard failure path.
fn install_interrupt_handler() {
    static INSTALLED: OnceLock<()> = OnceLock::new();
    INSTALLED.get_or_init(|| {
        let _ = ctrlc::set_handler(|| {
            let state = INTERRUPT_GUARD.lock().ok().and_then(|mut guard| guard.take());
            if let Some(state) = state {
                if let Ok(git) = Git::open(&state.repo_path) {
                    let _ = restore(&git, &state.temp, &state.original);
                }
            }
            eprintln!("error: interrupted");
            std::process::exit(1);
        });
    });
}

/// Allocate a temporary branch name guaranteed not to collide with any
/// existing ref.
fn allocate_branch_name(git: &Git) -> Result<BranchName, WorkspaceError> {
    for _ in 0..16 {
        let suffix = Uuid::new_v4().simple().to_string();
        let name = format!("typegraft/tmp-{}", &suffix[..8]);
        let candidate =
            BranchName::new(name).map_err(|e| WorkspaceError::Git(GitError::from(e)))?;
        if !git.branch_exists(&candidate) {
            return Ok(candidate);
        }
    }
    Err(WorkspaceError::NameExhausted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::process::Command;
    use tempfile::TempDir;

    fn run_git(dir: &Path, args: &[&str]) {
        let output = Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .expect("git command failed");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    fn repo() -> TempDir {
        let dir = TempDir::new().unwrap();
        run_git(dir.path(), &["init", "-b", "main"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["config", "user.name", "Test User"]);
        std::fs::write(dir.path().join("a.txt"), "a\n").unwrap();
        run_git(dir.path(), &["add", "a.txt"]);
        run_git(dir.path(), &["commit", "-m", "init"]);
        dir
    }

    #[test]
    fn restore_works_on_a_reopened_handle() {
        // The interrupt handler reopens the repository by path and
        // restores it out-of-band; a later cleanup must stay a no-op.
        let dir = repo();
        let git = Git::open(dir.path()).unwrap();
        let mut ws = Workspace::begin(&git).unwrap();
        let temp = ws.temp_branch().clone();
        let original = ws.original_head().clone();

        let reopened = Git::open(dir.path()).unwrap();
        restore(&reopened, &temp, &original).unwrap();

        let current = reopened.current_branch().unwrap().unwrap();
        assert_eq!(current.as_str(), "main");
        assert!(!reopened.branch_exists(&temp));

        ws.cleanup().unwrap();
    }

    #[test]
    fn cleanup_is_idempotent() {
        let dir = repo();
        let git = Git::open(dir.path()).unwrap();
        let mut ws = Workspace::begin(&git).unwrap();
        ws.cleanup().unwrap();
        ws.cleanup().unwrap();
        assert_eq!(git.current_branch().unwrap().unwrap().as_str(), "main");
        assert!(git.list_refs_by_prefix(BACKUP_REF_NAMESPACE).unwrap().is_empty());
    }
}
