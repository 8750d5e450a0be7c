//! git::rewrite
//!
//! The history rewrite engine.
//!
//! Rewrites every commit reachable from a branch, keeping only blobs
//! matching a path filter, optionally relocating the surviving subtree to
//! a new root, dropping commits left empty, and recomputing parent edges
//! so that lineages which collapse to identical content stay independent
//! instead of producing artificial merges.
//!
//! The rewrite is a pure object-database construction: new commits are
//! created bottom-up (oldest surviving ancestor first) and the branch ref
//! is only moved once the full replacement history exists. Before the ref
//! moves, the pre-rewrite tip is recorded under the reserved
//! `refs/typegraft/` namespace as a safety net; that ref is written with
//! force so residue from a previously interrupted run is never fatal.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use crate::core::filter::PathFilter;
use crate::core::types::{BranchName, Oid};
use crate::git::interface::{Git, GitError};

/// Reserved ref namespace for rewrite safety nets.
///
/// Everything under this prefix belongs to one invocation and is removed
/// by workspace cleanup.
pub const BACKUP_REF_NAMESPACE: &str = "refs/typegraft/";

/// The ref preserving the pre-rewrite tip of the temporary branch.
const BACKUP_REF: &str = "refs/typegraft/backup";

/// Errors from the history rewrite.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// No commit in the branch history touches a matching path.
    #[error("no commits touch the selected type directories")]
    NothingMatched,

    /// Underlying git failure.
    #[error(transparent)]
    Git(#[from] GitError),

    /// Internal git2 failure.
    #[error("rewrite failed: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl From<git2::Error> for RewriteError {
    fn from(err: git2::Error) -> Self {
        RewriteError::Internal {
            message: err.message().to_string(),
        }
    }
}

/// Subtree relocation applied to every surviving path.
///
/// Paths matched by the filter always start with `from` followed by a
/// separator; relocation replaces that leading root with `to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    /// The source type root (e.g. `conf/type`)
    pub from: String,
    /// The destination type root (e.g. `type`)
    pub to: String,
}

impl Relocation {
    /// Re-root a single path. Paths outside `from` pass through unchanged.
    fn apply(&self, path: &str) -> String {
        match path.strip_prefix(&self.from) {
            Some(rest) if rest.starts_with('/') => format!("{}{}", self.to, rest),
            _ => path.to_string(),
        }
    }
}

/// Result of a branch rewrite.
#[derive(Debug)]
pub struct RewriteOutcome {
    /// The rewritten branch tip.
    pub new_tip: Oid,
    /// Number of commits recreated with filtered content.
    pub rewritten: usize,
    /// Number of commits dropped as empty.
    pub dropped: usize,
}

/// Rewrite the history of `branch` in place, keeping only paths accepted
/// by `filter`, optionally relocated.
///
/// The branch is expected to be checked out; after the ref moves, the
/// index and working tree are force-reset to the rewritten tip.
///
/// # Errors
///
/// [`RewriteError::NothingMatched`] if the entire history filters away.
/// Any git failure aborts the rewrite with the branch ref untouched; the
/// partially built replacement objects are unreferenced and garbage.
pub fn rewrite_branch(
    git: &Git,
    branch: &BranchName,
    filter: &PathFilter,
    relocation: Option<&Relocation>,
) -> Result<RewriteOutcome, RewriteError> {
    let repo = git.raw();

    let refname = branch.refname();
    let tip = repo
        .find_reference(&refname)?
        .peel_to_commit()
        .map_err(|e| RewriteError::Internal {
            message: format!("{refname}: {}", e.message()),
        })?
        .id();

    let empty_tree = repo.treebuilder(None)?.write()?;

    let mut walk = repo.revwalk()?;
    walk.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::REVERSE)?;
    walk.push(tip)?;

    // Maps each original commit to its surviving replacement(s): one new
    // commit for kept commits, the (rewritten) parents for dropped ones.
    let mut replacements: HashMap<git2::Oid, Vec<git2::Oid>> = HashMap::new();
    let mut rewritten = 0usize;
    let mut dropped = 0usize;

    for oid in walk {
        let oid = oid?;
        let commit = repo.find_commit(oid)?;

        let new_tree = filter_tree(repo, &commit.tree()?, filter, relocation)?;

        // Parent-edge recomputation: map each original parent through the
        // replacement table, then keep only the topologically independent
        // subset so collapsed lineages never manufacture merges.
        let mut parents: Vec<git2::Oid> = Vec::new();
        for parent_id in commit.parent_ids() {
            if let Some(mapped) = replacements.get(&parent_id) {
                for p in mapped {
                    if !parents.contains(p) {
                        parents.push(*p);
                    }
                }
            }
        }
        let parents = independent_subset(repo, parents)?;

        // Emptiness pruning.
        if parents.is_empty() {
            if new_tree == empty_tree {
                replacements.insert(oid, Vec::new());
                dropped += 1;
                continue;
            }
        } else if parents.len() == 1 {
            let parent_tree = repo.find_commit(parents[0])?.tree_id();
            if parent_tree == new_tree {
                replacements.insert(oid, parents);
                dropped += 1;
                continue;
            }
        }

        let tree = repo.find_tree(new_tree)?;
        let parent_commits = parents
            .iter()
            .map(|p| repo.find_commit(*p))
            .collect::<Result<Vec<_>, _>>()?;
        let parent_refs: Vec<&git2::Commit<'_>> = parent_commits.iter().collect();

        // Lossy rather than empty for non-UTF-8 messages in old histories.
        let message = String::from_utf8_lossy(commit.message_bytes());
        let new_oid = repo.commit(
            None,
            &commit.author(),
            &commit.committer(),
            &message,
            &tree,
            &parent_refs,
        )?;

        replacements.insert(oid, vec![new_oid]);
        rewritten += 1;
    }

    let new_tip = match replacements.get(&tip).map(Vec::as_slice) {
        Some([single]) => *single,
        Some([]) | None => return Err(RewriteError::NothingMatched),
        Some(_) => {
            // A tip can only map to multiple commits if it was dropped as a
            // merge, which pruning never does.
            return Err(RewriteError::Internal {
                message: "branch tip rewrote to multiple commits".to_string(),
            });
        }
    };

    // Safety net first, then move the branch.
    repo.reference(BACKUP_REF, tip, true, "typegraft: pre-rewrite tip")?;
    repo.reference(&refname, new_tip, true, "typegraft: rewrite")?;

    // The branch is checked out; realign index and working tree.
    let mut opts = git2::build::CheckoutBuilder::new();
    opts.force();
    repo.checkout_head(Some(&mut opts))?;

    Ok(RewriteOutcome {
        new_tip: Oid::new(new_tip.to_string()).map_err(GitError::from)?,
        rewritten,
        dropped,
    })
}

/// Keep only parents that are not ancestors of another parent.
fn independent_subset(
    repo: &git2::Repository,
    parents: Vec<git2::Oid>,
) -> Result<Vec<git2::Oid>, RewriteError> {
    if parents.len() < 2 {
        return Ok(parents);
    }

    let mut kept = Vec::with_capacity(parents.len());
    'outer: for (i, candidate) in parents.iter().enumerate() {
        for (j, other) in parents.iter().enumerate() {
            if i == j || candidate == other {
                continue;
            }
            if repo.graph_descendant_of(*other, *candidate)? {
                continue 'outer;
            }
        }
        kept.push(*candidate);
    }
    Ok(kept)
}

/// Filter a commit tree down to matching blobs, relocated, and write the
/// resulting tree to the object database.
fn filter_tree(
    repo: &git2::Repository,
    tree: &git2::Tree<'_>,
    filter: &PathFilter,
    relocation: Option<&Relocation>,
) -> Result<git2::Oid, RewriteError> {
    let mut matched: Vec<(String, git2::Oid, i32)> = Vec::new();

    tree.walk(git2::TreeWalkMode::PreOrder, |root, entry| {
        if entry.kind() == Some(git2::ObjectType::Blob) {
            let name = String::from_utf8_lossy(entry.name_bytes());
            let path = format!("{root}{name}");
            if filter.matches(&path) {
                let path = match relocation {
                    Some(r) => r.apply(&path),
                    None => path,
                };
                matched.push((path, entry.id(), entry.filemode()));
            }
        }
        git2::TreeWalkResult::Ok
    })?;

    let mut builder = TreeNode::default();
    for (path, oid, mode) in matched {
        builder.insert(&path, oid, mode);
    }
    Ok(builder.write(repo)?)
}

/// In-memory tree under construction, written bottom-up via TreeBuilder.
#[derive(Default)]
struct TreeNode {
    blobs: BTreeMap<String, (git2::Oid, i32)>,
    dirs: BTreeMap<String, TreeNode>,
}

impl TreeNode {
    fn insert(&mut self, path: &str, oid: git2::Oid, mode: i32) {
        match path.split_once('/') {
            Some((dir, rest)) => self
                .dirs
                .entry(dir.to_string())
                .or_default()
                .insert(rest, oid, mode),
            None => {
                self.blobs.insert(path.to_string(), (oid, mode));
            }
        }
    }

    fn write(&self, repo: &git2::Repository) -> Result<git2::Oid, git2::Error> {
        let mut builder = repo.treebuilder(None)?;
        for (name, (oid, mode)) in &self.blobs {
            builder.insert(name, *oid, *mode)?;
        }
        for (name, node) in &self.dirs {
            let sub = node.write(repo)?;
            builder.insert(name, sub, 0o040000)?;
        }
        builder.write()
    }
}
