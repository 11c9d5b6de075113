//! Integration tests for GitRepository
//!
//! These tests drive the real `git` binary against repositories created in
//! temporary directories, with a bare repository standing in for `origin`.
//! Each test returns early when git is not installed.

use std::path::{Path, PathBuf};
use std::process::Command;

use mdnote_core::domain::{RepoError, SyncState, SyncStatus};
use mdnote_core::ports::{IRepository, PullOutcome};
use mdnote_git::{GitRepository, Identity};
use tempfile::TempDir;

// ============================================================================
// Test helpers
// ============================================================================

fn have_git() -> bool {
    Command::new("git")
        .arg("--version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn identity() -> Identity {
    Identity::new("mdnote test", "test@example.com")
}

fn repo_at(path: &Path) -> GitRepository {
    GitRepository::at(path).with_identity(identity())
}

/// Creates an empty bare repository to act as `origin`
fn bare_origin(tmp: &TempDir) -> PathBuf {
    let origin = tmp.path().join("origin.git");
    let ok = Command::new("git")
        .args(["init", "--bare", "-q"])
        .arg(&origin)
        .status()
        .expect("run git init --bare")
        .success();
    assert!(ok, "git init --bare failed");
    origin
}

/// Initialized working copy at `tmp/<name>` with `origin` configured
async fn working_copy(tmp: &TempDir, name: &str, origin: &Path) -> GitRepository {
    let repo = repo_at(&tmp.path().join(name));
    repo.ensure_initialized().await.expect("ensure_initialized");
    repo.set_remote(&origin.to_string_lossy(), None)
        .await
        .expect("set_remote");
    repo
}

fn write(repo: &GitRepository, rel: &str, content: &str) -> PathBuf {
    let path = repo.working_dir().unwrap().join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

// ============================================================================
// Initialization
// ============================================================================

#[tokio::test]
async fn test_ensure_initialized_creates_repository_with_branch() {
    if !have_git() {
        eprintln!("skipping: git not found in PATH");
        return;
    }
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("notes").join("vault");
    let repo = repo_at(&root);

    repo.ensure_initialized().await.unwrap();
    assert!(root.join(".git").exists());

    // Bootstrap commit exists, so HEAD resolves
    let head = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(&root)
        .status()
        .unwrap();
    assert!(head.success());

    // Idempotent
    repo.ensure_initialized().await.unwrap();

    let status = repo.status().await.unwrap();
    assert_eq!(status.state, SyncState::Idle);
    assert_eq!(status.modified_count, 0);
    assert!(status.last_checked_at.is_some());
}

#[tokio::test]
async fn test_init_at_writes_readme_and_commits() {
    if !have_git() {
        eprintln!("skipping: git not found in PATH");
        return;
    }
    let tmp = TempDir::new().unwrap();
    let notebook = tmp.path().join("new-notebook");
    let repo = repo_at(tmp.path());

    repo.init_at(&notebook).await.unwrap();

    let readme = std::fs::read_to_string(notebook.join("README.md")).unwrap();
    assert!(readme.starts_with("# Notebook"));
    let clean = repo_at(&notebook).status().await.unwrap();
    assert_eq!(clean.modified_count, 0);
}

// ============================================================================
// Status
// ============================================================================

#[tokio::test]
async fn test_status_counts_modified_and_untracked() {
    if !have_git() {
        eprintln!("skipping: git not found in PATH");
        return;
    }
    let tmp = TempDir::new().unwrap();
    let repo = repo_at(&tmp.path().join("vault"));
    repo.ensure_initialized().await.unwrap();

    write(&repo, "a.md", "a");
    write(&repo, "daily/b.md", "b");
    write(&repo, "c.md", "c");

    let status = repo.status().await.unwrap();
    assert_eq!(status.modified_count, 3);
    assert!(status.file_statuses["a.md"].is_untracked());
    assert!(status.file_statuses.contains_key("daily/b.md"));
    assert!(!status.file_statuses.contains_key("daily/"));
    assert!(status.conflicted_paths.is_empty());
}

#[tokio::test]
async fn test_status_is_idle_outside_a_repository() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("loose.md"), "x").unwrap();

    for root in [tmp.path().to_path_buf(), tmp.path().join("missing")] {
        let status = repo_at(&root).status().await.unwrap();
        assert_eq!(status, SyncStatus::idle());
    }
}

// ============================================================================
// Staging and diff
// ============================================================================

#[tokio::test]
async fn test_stage_absolute_path_and_diff() {
    if !have_git() {
        eprintln!("skipping: git not found in PATH");
        return;
    }
    let tmp = TempDir::new().unwrap();
    let repo = repo_at(&tmp.path().join("vault"));
    repo.ensure_initialized().await.unwrap();

    let note = write(&repo, "note.md", "first line\n");
    repo.stage(&note).await.unwrap();
    let status = repo.status().await.unwrap();
    assert_eq!(status.file_statuses["note.md"].index, 'A');

    std::fs::write(&note, "first line\nsecond line\n").unwrap();
    let diff = repo.diff(&note).await.unwrap();
    assert!(diff.contains("+second line"), "unexpected diff: {diff}");
}

// ============================================================================
// Clone
// ============================================================================

#[tokio::test]
async fn test_clone_repository_non_empty_destination_fails() {
    if !have_git() {
        eprintln!("skipping: git not found in PATH");
        return;
    }
    let tmp = TempDir::new().unwrap();
    let origin = bare_origin(&tmp);
    let parent = tmp.path().join("parent");
    let existing = parent.join("origin");
    std::fs::create_dir_all(&existing).unwrap();
    std::fs::write(existing.join("keep.md"), "precious").unwrap();

    let repo = repo_at(tmp.path());
    let err = repo
        .clone_repository(&origin.to_string_lossy(), &parent)
        .await
        .unwrap_err();

    match err {
        RepoError::DestinationNotEmpty(path) => assert_eq!(path, existing),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        std::fs::read_to_string(existing.join("keep.md")).unwrap(),
        "precious"
    );
    assert!(!existing.join(".git").exists());
}

#[tokio::test]
async fn test_clone_returns_derived_path() {
    if !have_git() {
        eprintln!("skipping: git not found in PATH");
        return;
    }
    let tmp = TempDir::new().unwrap();
    let origin = bare_origin(&tmp);
    let a = working_copy(&tmp, "a", &origin).await;
    write(&a, "shared.md", "hello");
    a.commit("seed").await.unwrap();
    a.push().await.unwrap();

    let parent = tmp.path().join("clones");
    let cloned = repo_at(tmp.path())
        .clone_repository(&origin.to_string_lossy(), &parent)
        .await
        .unwrap();

    assert_eq!(cloned, parent.join("origin"));
    assert_eq!(
        std::fs::read_to_string(cloned.join("shared.md")).unwrap(),
        "hello"
    );
}

// ============================================================================
// Pull / push
// ============================================================================

#[tokio::test]
async fn test_pull_without_remote_branch_is_not_fatal() {
    if !have_git() {
        eprintln!("skipping: git not found in PATH");
        return;
    }
    let tmp = TempDir::new().unwrap();
    let origin = bare_origin(&tmp);
    let repo = working_copy(&tmp, "vault", &origin).await;

    // Repeated pulls against a never-pushed remote stay harmless
    for _ in 0..2 {
        assert_eq!(repo.pull().await.unwrap(), PullOutcome::NoRemoteBranch);
    }

    repo.push().await.unwrap();
    assert_eq!(repo.pull().await.unwrap(), PullOutcome::Pulled);
}

#[tokio::test]
async fn test_commit_push_and_ahead_count() {
    if !have_git() {
        eprintln!("skipping: git not found in PATH");
        return;
    }
    let tmp = TempDir::new().unwrap();
    let origin = bare_origin(&tmp);
    let repo = working_copy(&tmp, "vault", &origin).await;
    repo.push().await.unwrap();

    write(&repo, "one.md", "1");
    write(&repo, "two.md", "2");
    repo.commit("Manual sync: test").await.unwrap();

    let status = repo.status().await.unwrap();
    assert_eq!(status.modified_count, 0);
    assert_eq!(status.ahead, 1);

    repo.push().await.unwrap();
    let status = repo.status().await.unwrap();
    assert_eq!(status.ahead, 0);
    assert_eq!(status.behind, 0);
}

#[tokio::test]
async fn test_pull_integrates_remote_commits() {
    if !have_git() {
        eprintln!("skipping: git not found in PATH");
        return;
    }
    let tmp = TempDir::new().unwrap();
    let origin = bare_origin(&tmp);
    let a = working_copy(&tmp, "a", &origin).await;
    a.push().await.unwrap();

    let b_path = repo_at(tmp.path())
        .clone_repository(&origin.to_string_lossy(), &tmp.path().join("b"))
        .await
        .unwrap();
    let b = repo_at(&b_path);

    write(&a, "from-a.md", "a");
    a.commit("from a").await.unwrap();
    a.push().await.unwrap();

    assert_eq!(b.pull().await.unwrap(), PullOutcome::Pulled);
    assert!(b_path.join("from-a.md").exists());
}

#[tokio::test]
async fn test_push_to_unreachable_remote_is_transport_failure() {
    if !have_git() {
        eprintln!("skipping: git not found in PATH");
        return;
    }
    let tmp = TempDir::new().unwrap();
    let repo = working_copy(&tmp, "vault", &tmp.path().join("no-such-origin.git")).await;

    let err = repo.push().await.unwrap_err();
    assert!(err.is_transport(), "unexpected error: {err:?}");
    assert!(err.details().is_some());

    let err = repo.pull().await.unwrap_err();
    assert!(err.is_transport(), "unexpected error: {err:?}");
}

#[tokio::test]
async fn test_conflicting_pull_reports_conflict_and_resolves() {
    if !have_git() {
        eprintln!("skipping: git not found in PATH");
        return;
    }
    let tmp = TempDir::new().unwrap();
    let origin = bare_origin(&tmp);
    let a = working_copy(&tmp, "a", &origin).await;
    a.push().await.unwrap();

    let b_path = repo_at(tmp.path())
        .clone_repository(&origin.to_string_lossy(), &tmp.path().join("b"))
        .await
        .unwrap();
    let b = repo_at(&b_path);

    write(&a, "note.md", "from a\n");
    a.commit("a edits").await.unwrap();
    a.push().await.unwrap();

    let note = write(&b, "note.md", "from b\n");
    b.commit("b edits").await.unwrap();

    let err = b.pull().await.unwrap_err();
    assert!(err.is_transport(), "unexpected error: {err:?}");

    let status = b.status().await.unwrap();
    assert_eq!(status.state, SyncState::Conflict);
    assert!(status.conflicted_paths.contains("note.md"));

    std::fs::write(&note, "merged\n").unwrap();
    b.mark_resolved(&note).await.unwrap();
    let status = b.status().await.unwrap();
    assert!(!status.has_conflicts());
}

// ============================================================================
// Remote
// ============================================================================

#[tokio::test]
async fn test_set_remote_replaces_origin() {
    if !have_git() {
        eprintln!("skipping: git not found in PATH");
        return;
    }
    let tmp = TempDir::new().unwrap();
    let repo = working_copy(&tmp, "vault", Path::new("/first/origin.git")).await;
    repo.set_remote("/second/origin.git", None).await.unwrap();

    let out = Command::new("git")
        .args(["remote", "get-url", "origin"])
        .current_dir(repo.working_dir().unwrap())
        .output()
        .unwrap();
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "/second/origin.git");
}
