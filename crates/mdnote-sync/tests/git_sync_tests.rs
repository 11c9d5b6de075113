//! SyncEngine over the real git adapter
//!
//! A bare repository in a temp dir stands in for `origin`. Each test returns
//! early when git is not installed.

mod common;

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use common::RecordingSink;
use mdnote_core::config::{AppConfig, ConfigStore};
use mdnote_core::domain::{SyncOutcome, SyncStep};
use mdnote_git::{GitRepository, Identity};
use mdnote_sync::SyncEngine;
use tempfile::TempDir;

fn have_git() -> bool {
    Command::new("git")
        .arg("--version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

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

/// Engine with an opened working copy at `tmp/vault` pointing at `origin`
async fn engine_with_origin(
    tmp: &TempDir,
    origin: &Path,
) -> (SyncEngine, PathBuf, Arc<RecordingSink>) {
    let config = Arc::new(ConfigStore::ephemeral(AppConfig::default()));
    let repo = GitRepository::from_config(Arc::clone(&config))
        .with_identity(Identity::new("mdnote test", "test@example.com"));
    let sink = Arc::new(RecordingSink::default());
    let engine = SyncEngine::new(config, Arc::new(repo), sink.clone());

    let vault = tmp.path().join("vault");
    engine.open_project(&vault).await.unwrap();
    engine
        .set_remote(&origin.to_string_lossy())
        .await
        .unwrap();
    (engine, vault, sink)
}

#[tokio::test]
async fn test_repeated_sync_against_empty_origin_never_fails() {
    if !have_git() {
        eprintln!("skipping: git not found in PATH");
        return;
    }
    let tmp = TempDir::new().unwrap();
    let origin = bare_origin(&tmp);
    let (engine, _vault, sink) = engine_with_origin(&tmp, &origin).await;

    for round in 0..3 {
        let outcome = engine.sync(false).await;
        assert!(
            matches!(outcome, SyncOutcome::Completed { .. }),
            "sync {round} returned {outcome:?}"
        );
    }

    assert!(sink.errors().is_empty(), "errors: {:?}", sink.errors());
    assert_eq!(*engine.subscribe_step().borrow(), SyncStep::Idle);
    let status = engine.refresh_status().await;
    assert_eq!(status.ahead, 0);
}

#[tokio::test]
async fn test_sync_commits_new_files_in_subdirectory() {
    if !have_git() {
        eprintln!("skipping: git not found in PATH");
        return;
    }
    let tmp = TempDir::new().unwrap();
    let origin = bare_origin(&tmp);
    let (engine, vault, sink) = engine_with_origin(&tmp, &origin).await;

    let daily = vault.join("daily");
    std::fs::create_dir_all(&daily).unwrap();
    for name in ["mon.md", "tue.md", "wed.md"] {
        std::fs::write(daily.join(name), format!("# {name}\n")).unwrap();
    }

    let before = engine.refresh_status().await;
    assert_eq!(before.modified_count, 3);
    assert!(before.file_statuses.contains_key("daily/tue.md"));

    let outcome = engine.sync(false).await;
    assert!(
        matches!(outcome, SyncOutcome::Completed { committed: true, .. }),
        "unexpected outcome {outcome:?}"
    );

    let after = engine.refresh_status().await;
    assert_eq!(after.modified_count, 0);
    assert_eq!(after.ahead, 0);
    assert!(after.file_statuses.is_empty());
    assert_eq!(sink.successes().len(), 1);
}
