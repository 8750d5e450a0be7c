//! Integration tests for the migration engine.
//!
//! These tests use real git repositories created via tempfile to verify
//! the full rewrite-push-cleanup flow, including rollback behavior.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

use typegraft::core::types::{BranchName, RepoLocation, TypeName};
use typegraft::engine::{migrate, EngineError, MigrateRequest, Mode};
use typegraft::ui::output::Verbosity;

// =============================================================================
// Test Fixtures
// =============================================================================

/// Test fixture that creates a real git repository.
struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// Create a new test repository with an initial commit on main.
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");

        run_git(dir.path(), &["init", "-b", "main"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["config", "user.name", "Test User"]);

        std::fs::write(dir.path().join("README.md"), "# Test Repo\n").unwrap();
        run_git(dir.path(), &["add", "README.md"]);
        run_git(dir.path(), &["commit", "-m", "Initial commit"]);

        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file, creating parent directories.
    fn write(&self, relpath: &str, content: &str) {
        let full = self.path().join(relpath);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, content).unwrap();
    }

    /// Stage everything and commit.
    fn commit_all(&self, message: &str) {
        run_git(self.path(), &["add", "-A"]);
        run_git(self.path(), &["commit", "-m", message]);
    }

    /// Run a git query and return trimmed stdout.
    fn query(&self, args: &[&str]) -> String {
        git_stdout(self.path(), args)
    }
}

/// Create an empty bare repository to push into.
fn bare_dest() -> TempDir {
    let dir = TempDir::new().expect("failed to create temp dir");
    run_git(dir.path(), &["init", "--bare", "-b", "main"]);
    dir
}

/// Run a git command, panicking on failure.
fn run_git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git command failed");

    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

/// Run a git command and return trimmed stdout, panicking on failure.
fn git_stdout(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git command failed");

    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

/// Build a source repo with two types under conf/type plus unrelated files.
///
/// History (oldest first):
/// 1. Initial commit (README)
/// 2. "Add __a"           - conf/type/__a/manifest
/// 3. "Docs only"         - README change
/// 4. "Add __b"           - conf/type/__b/manifest
/// 5. "Update __a and init" - __a change + conf/manifest/init
fn source_with_types() -> TestRepo {
    let repo = TestRepo::new();
    repo.write("conf/type/__a/manifest", "a v1\n");
    repo.commit_all("Add __a");
    repo.write("README.md", "# Test Repo\n\nmore docs\n");
    repo.commit_all("Docs only");
    repo.write("conf/type/__b/manifest", "b v1\n");
    repo.commit_all("Add __b");
    repo.write("conf/type/__a/manifest", "a v2\n");
    repo.write("conf/manifest/init", "init\n");
    repo.commit_all("Update __a and init");
    repo
}

fn request(src: &TestRepo, dest: &Path, types: &[&str], mode: Mode) -> MigrateRequest {
    MigrateRequest {
        source: RepoLocation::parse(src.path().to_str().unwrap()),
        source_prefix: Some("conf".to_string()),
        dest: RepoLocation::parse(dest.to_str().unwrap()),
        dest_prefix: Some("conf".to_string()),
        dest_branch: BranchName::new("main").unwrap(),
        types: types.iter().map(|t| TypeName::new(*t).unwrap()).collect(),
        mode,
    }
}

/// Assert the source repository carries no typegraft residue.
fn assert_source_restored(repo: &TestRepo) {
    assert_eq!(repo.query(&["symbolic-ref", "--short", "HEAD"]), "main");
    assert_eq!(repo.query(&["for-each-ref", "refs/typegraft"]), "");
    let branches = repo.query(&["branch", "--list", "typegraft/*"]);
    assert_eq!(branches, "", "temporary branch left behind: {branches}");
    assert_eq!(repo.query(&["status", "--porcelain"]), "");
}

// =============================================================================
// Copy Mode
// =============================================================================

#[test]
fn copy_keeps_only_matching_paths() {
    let src = source_with_types();
    let dest = bare_dest();

    let report = migrate(
        &request(&src, dest.path(), &["__a"], Mode::Copy),
        Verbosity::Quiet,
    )
    .unwrap();
    assert!(report.pushed_tip.is_some());

    let files = git_stdout(dest.path(), &["ls-tree", "-r", "--name-only", "main"]);
    assert_eq!(files, "conf/type/__a/manifest");

    let content = git_stdout(dest.path(), &["show", "main:conf/type/__a/manifest"]);
    assert_eq!(content, "a v2");

    assert_source_restored(&src);
}

#[test]
fn commits_not_touching_types_are_pruned() {
    let src = source_with_types();
    let dest = bare_dest();

    migrate(
        &request(&src, dest.path(), &["__a"], Mode::Copy),
        Verbosity::Quiet,
    )
    .unwrap();

    let log = git_stdout(dest.path(), &["log", "--reverse", "--format=%s", "main"]);
    let messages: Vec<&str> = log.lines().collect();
    assert_eq!(messages, vec!["Add __a", "Update __a and init"]);
}

#[test]
fn mixed_commit_survives_with_only_matching_paths() {
    let src = source_with_types();
    let dest = bare_dest();

    migrate(
        &request(&src, dest.path(), &["__a"], Mode::Copy),
        Verbosity::Quiet,
    )
    .unwrap();

    // "Update __a and init" touched conf/manifest/init too; only the __a
    // path may remain in its rewritten tree.
    let files = git_stdout(dest.path(), &["ls-tree", "-r", "--name-only", "main"]);
    assert!(!files.contains("conf/manifest/init"));
    assert!(files.contains("conf/type/__a/manifest"));
}

#[test]
fn copy_preserves_author_timestamps_and_messages() {
    let src = source_with_types();
    let dest = bare_dest();

    migrate(
        &request(&src, dest.path(), &["__a"], Mode::Copy),
        Verbosity::Quiet,
    )
    .unwrap();

    let source_log = src.query(&["log", "--reverse", "--format=%at %s", "main", "--", "conf/type/__a"]);
    let dest_log = git_stdout(dest.path(), &["log", "--reverse", "--format=%at %s", "main"]);
    assert_eq!(source_log, dest_log);
}

#[test]
fn copy_multiple_types() {
    let src = source_with_types();
    let dest = bare_dest();

    migrate(
        &request(&src, dest.path(), &["__a", "__b"], Mode::Copy),
        Verbosity::Quiet,
    )
    .unwrap();

    let files = git_stdout(dest.path(), &["ls-tree", "-r", "--name-only", "main"]);
    assert!(files.contains("conf/type/__a/manifest"));
    assert!(files.contains("conf/type/__b/manifest"));

    let log = git_stdout(dest.path(), &["log", "--reverse", "--format=%s", "main"]);
    let messages: Vec<&str> = log.lines().collect();
    assert_eq!(messages, vec!["Add __a", "Add __b", "Update __a and init"]);
}

#[test]
fn copy_relocates_to_destination_prefix() {
    let src = source_with_types();
    let dest = bare_dest();

    let mut req = request(&src, dest.path(), &["__a"], Mode::Copy);
    req.dest_prefix = None; // types at the destination repository root

    migrate(&req, Verbosity::Quiet).unwrap();

    let files = git_stdout(dest.path(), &["ls-tree", "-r", "--name-only", "main"]);
    assert_eq!(files, "type/__a/manifest");
}

#[test]
fn copy_from_detached_head_restores_the_detached_checkout() {
    let src = source_with_types();
    let head = src.query(&["rev-parse", "HEAD"]);
    run_git(src.path(), &["checkout", "--detach"]);

    let dest = bare_dest();
    migrate(
        &request(&src, dest.path(), &["__a"], Mode::Copy),
        Verbosity::Quiet,
    )
    .unwrap();

    assert_eq!(src.query(&["rev-parse", "HEAD"]), head);
    assert_eq!(src.query(&["branch", "--show-current"]), "", "HEAD must stay detached");
    assert_eq!(src.query(&["for-each-ref", "refs/typegraft"]), "");
    assert_eq!(src.query(&["branch", "--list", "typegraft/*"]), "");
}

#[test]
fn stale_backup_ref_from_an_interrupted_run_is_cleared() {
    let src = source_with_types();
    let dest = bare_dest();
    // Residue a killed process would leave behind.
    run_git(src.path(), &["update-ref", "refs/typegraft/backup", "HEAD"]);

    migrate(
        &request(&src, dest.path(), &["__a"], Mode::Copy),
        Verbosity::Quiet,
    )
    .unwrap();

    let files = git_stdout(dest.path(), &["ls-tree", "-r", "--name-only", "main"]);
    assert_eq!(files, "conf/type/__a/manifest");
    assert_source_restored(&src);
}

#[test]
fn non_utf8_commit_message_survives_the_rewrite() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let repo = TestRepo::new();
    repo.write("conf/type/__a/manifest", "a\n");
    run_git(repo.path(), &["add", "-A"]);
    let output = Command::new("git")
        .arg("commit")
        .arg("-m")
        .arg(OsStr::from_bytes(b"Add __a \xe9 legacy"))
        .current_dir(repo.path())
        .output()
        .expect("git command failed");
    assert!(output.status.success());

    let dest = bare_dest();
    migrate(
        &request(&repo, dest.path(), &["__a"], Mode::Copy),
        Verbosity::Quiet,
    )
    .unwrap();

    // The invalid byte is replaced, the rest of the message is kept.
    let log = git_stdout(dest.path(), &["log", "--format=%s", "main"]);
    assert!(log.contains("Add __a"), "got: {log}");
    assert!(log.contains("legacy"), "got: {log}");
}

#[test]
fn copy_twice_is_idempotent_in_tree_content() {
    let src = source_with_types();
    let dest = bare_dest();

    migrate(
        &request(&src, dest.path(), &["__a"], Mode::Copy),
        Verbosity::Quiet,
    )
    .unwrap();
    let first_tree = git_stdout(dest.path(), &["ls-tree", "-r", "main"]);
    let first_log = git_stdout(dest.path(), &["log", "--format=%at %s", "main"]);

    migrate(
        &request(&src, dest.path(), &["__a"], Mode::Copy),
        Verbosity::Quiet,
    )
    .unwrap();
    let second_tree = git_stdout(dest.path(), &["ls-tree", "-r", "main"]);
    let second_log = git_stdout(dest.path(), &["log", "--format=%at %s", "main"]);

    assert_eq!(first_tree, second_tree);
    assert_eq!(first_log, second_log);
    assert_source_restored(&src);
}

// =============================================================================
// Merge Handling
// =============================================================================

#[test]
fn one_sided_merge_collapses_to_single_lineage() {
    let repo = TestRepo::new();

    run_git(repo.path(), &["checkout", "-b", "feat"]);
    repo.write("conf/type/__a/manifest", "a\n");
    repo.commit_all("Add __a in feat");

    run_git(repo.path(), &["checkout", "main"]);
    repo.write("unrelated.txt", "x\n");
    repo.commit_all("Unrelated on main");

    run_git(repo.path(), &["merge", "--no-ff", "feat", "-m", "Merge feat"]);

    let dest = bare_dest();
    migrate(
        &request(&repo, dest.path(), &["__a"], Mode::Copy),
        Verbosity::Quiet,
    )
    .unwrap();

    // The main-side lineage rewrites to nothing and the merge prunes away,
    // leaving a single root commit.
    let log = git_stdout(dest.path(), &["log", "--format=%s", "main"]);
    assert_eq!(log, "Add __a in feat");
    let parents = git_stdout(dest.path(), &["rev-list", "--parents", "-n", "1", "main"]);
    assert_eq!(parents.split_whitespace().count(), 1, "expected a root commit");
}

#[test]
fn merge_of_two_contributing_lineages_is_retained() {
    let repo = TestRepo::new();
    let root = repo.query(&["rev-parse", "HEAD"]);

    run_git(repo.path(), &["checkout", "-b", "feat1"]);
    repo.write("conf/type/__a/x", "x\n");
    repo.commit_all("Add __a/x");

    run_git(repo.path(), &["checkout", "-b", "feat2", &root]);
    repo.write("conf/type/__a/y", "y\n");
    repo.commit_all("Add __a/y");

    run_git(repo.path(), &["checkout", "main"]);
    run_git(repo.path(), &["merge", "feat1"]);
    run_git(repo.path(), &["merge", "feat2"]);

    let dest = bare_dest();
    migrate(
        &request(&repo, dest.path(), &["__a"], Mode::Copy),
        Verbosity::Quiet,
    )
    .unwrap();

    let files = git_stdout(dest.path(), &["ls-tree", "-r", "--name-only", "main"]);
    assert!(files.contains("conf/type/__a/x"));
    assert!(files.contains("conf/type/__a/y"));

    // Both sides contributed content, so exactly one merge survives.
    let merges = git_stdout(dest.path(), &["rev-list", "--merges", "--count", "main"]);
    assert_eq!(merges, "1");
}

// =============================================================================
// Rollback and Preconditions
// =============================================================================

#[test]
fn push_failure_rolls_back_source_completely() {
    let src = source_with_types();
    let not_a_repo = TempDir::new().unwrap();

    let err = migrate(
        &request(&src, not_a_repo.path(), &["__a"], Mode::Copy),
        Verbosity::Quiet,
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::Git(_)), "got: {err}");

    assert_source_restored(&src);
}

#[test]
fn dirty_worktree_aborts_before_any_ref_is_created() {
    let src = source_with_types();
    let dest = bare_dest();
    src.write("scratch.txt", "uncommitted\n");

    let head_before = src.query(&["rev-parse", "HEAD"]);
    let err = migrate(
        &request(&src, dest.path(), &["__a"], Mode::Copy),
        Verbosity::Quiet,
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::DirtyWorktree { .. }), "got: {err}");

    assert_eq!(src.query(&["rev-parse", "HEAD"]), head_before);
    assert_eq!(src.query(&["for-each-ref", "refs/typegraft"]), "");
    assert_eq!(
        git_stdout(dest.path(), &["for-each-ref", "refs/heads"]),
        "",
        "destination must stay untouched"
    );
}

#[test]
fn missing_type_directory_aborts_before_any_ref_is_created() {
    let src = source_with_types();
    let dest = bare_dest();

    let err = migrate(
        &request(&src, dest.path(), &["__nope"], Mode::Copy),
        Verbosity::Quiet,
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::MissingTypeDir { .. }), "got: {err}");
    assert_source_restored(&src);
}

#[test]
fn empty_type_list_is_a_noop_success() {
    let src = source_with_types();
    let dest = bare_dest();

    let report = migrate(
        &request(&src, dest.path(), &[], Mode::Copy),
        Verbosity::Quiet,
    )
    .unwrap();
    assert!(report.pushed_tip.is_none());
    assert_eq!(git_stdout(dest.path(), &["for-each-ref", "refs/heads"]), "");
}

// =============================================================================
// Move Mode
// =============================================================================

#[test]
fn move_deletes_originals_one_commit_per_type() {
    let src = source_with_types();
    let dest = bare_dest();
    let main_tip_before = src.query(&["rev-parse", "main"]);

    let report = migrate(
        &request(
            &src,
            dest.path(),
            &["__a", "__b"],
            Mode::Move {
                source_branch: BranchName::new("cleanup").unwrap(),
            },
        ),
        Verbosity::Quiet,
    )
    .unwrap();
    assert_eq!(
        report.removed,
        vec!["conf/type/__a".to_string(), "conf/type/__b".to_string()]
    );

    // Destination got both types' history.
    let files = git_stdout(dest.path(), &["ls-tree", "-r", "--name-only", "main"]);
    assert!(files.contains("conf/type/__a/manifest"));
    assert!(files.contains("conf/type/__b/manifest"));

    // Source branch carries exactly two removal commits on top of main.
    let log = src.query(&["log", "--reverse", "--format=%s", "main..cleanup"]);
    let messages: Vec<&str> = log.lines().collect();
    assert_eq!(
        messages,
        vec![
            "Remove conf/type/__a (migrated)",
            "Remove conf/type/__b (migrated)"
        ]
    );

    // No trace of the type directories on the cleanup branch.
    let cleanup_files = src.query(&["ls-tree", "-r", "--name-only", "cleanup"]);
    assert!(!cleanup_files.contains("conf/type/__a"));
    assert!(!cleanup_files.contains("conf/type/__b"));

    // main is untouched and checked out again.
    assert_eq!(src.query(&["rev-parse", "main"]), main_tip_before);
    assert_source_restored(&src);
    assert!(src.path().join("conf/type/__a/manifest").is_file());
}

#[test]
fn move_onto_existing_source_branch_appends() {
    let src = source_with_types();
    let dest = bare_dest();
    run_git(src.path(), &["branch", "cleanup"]);

    migrate(
        &request(
            &src,
            dest.path(),
            &["__a"],
            Mode::Move {
                source_branch: BranchName::new("cleanup").unwrap(),
            },
        ),
        Verbosity::Quiet,
    )
    .unwrap();

    let log = src.query(&["log", "--reverse", "--format=%s", "main..cleanup"]);
    assert_eq!(log, "Remove conf/type/__a (migrated)");
    assert_source_restored(&src);
}
