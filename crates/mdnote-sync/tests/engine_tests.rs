//! SyncEngine boundary operations against an in-memory repository and config

mod common;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use common::{MockRepo, RecordingSink};
use mdnote_core::config::{AppConfig, ConfigStore};
use mdnote_core::domain::{AutoSyncConfig, SyncIndicator, SyncOutcome, SyncState, SyncStatus};
use mdnote_sync::{SyncEngine, SyncError};
use tempfile::TempDir;

fn engine(repo: MockRepo) -> (SyncEngine, Arc<MockRepo>, Arc<ConfigStore>, Arc<RecordingSink>) {
    let repo = Arc::new(repo);
    let config = Arc::new(ConfigStore::ephemeral(AppConfig::default()));
    let sink = Arc::new(RecordingSink::default());
    let engine = SyncEngine::new(config.clone(), repo.clone(), sink.clone());
    (engine, repo, config, sink)
}

#[tokio::test]
async fn test_status_starts_idle_and_indicator_follows() {
    let (engine, repo, _config, _sink) = engine(MockRepo::new());
    assert_eq!(engine.get_status(), SyncStatus::idle());
    assert_eq!(engine.indicator(), SyncIndicator::UpToDate);

    repo.set_modified(3);
    let status = engine.refresh_status().await;
    assert_eq!(status.modified_count, 3);
    assert_eq!(engine.get_status().modified_count, 3);
    assert_eq!(engine.indicator(), SyncIndicator::Modified(3));
}

#[tokio::test]
async fn test_sync_delegates_to_orchestrator() {
    let (engine, repo, _config, sink) = engine(MockRepo::new().with_modified(1));

    let outcome = engine.sync(false).await;
    assert_eq!(
        outcome,
        SyncOutcome::Completed {
            committed: true,
            pulled: true
        }
    );
    assert_eq!(repo.calls(), vec!["commit", "pull", "push"]);
    assert_eq!(sink.successes().len(), 1);
}

#[tokio::test]
async fn test_add_file_stages_and_refreshes() {
    let (engine, repo, _config, _sink) = engine(MockRepo::new());
    repo.set_modified(1);

    engine.add_file(Path::new("/notes/a.md")).await.unwrap();

    assert_eq!(repo.calls(), vec!["stage /notes/a.md"]);
    assert_eq!(engine.get_status().modified_count, 1);
}

#[tokio::test]
async fn test_get_diff_passes_through() {
    let (engine, _repo, _config, _sink) = engine(MockRepo::new());
    let diff = engine.get_diff(Path::new("a.md")).await.unwrap();
    assert!(diff.starts_with("diff --git a/a.md"));
}

#[tokio::test]
async fn test_resolve_conflict_clears_conflict_state() {
    let conflicted = SyncStatus {
        state: SyncState::Conflict,
        conflicted_paths: BTreeSet::from(["a.md".to_string()]),
        ..SyncStatus::idle()
    };
    let (engine, repo, _config, _sink) = engine(MockRepo::new().with_status(conflicted));
    assert!(engine.refresh_status().await.has_conflicts());

    engine.resolve_conflict(Path::new("/notes/a.md")).await.unwrap();

    assert_eq!(repo.calls(), vec!["resolve /notes/a.md"]);
    assert!(!engine.get_status().has_conflicts());
}

#[tokio::test]
async fn test_open_project_records_path_and_initializes() {
    let (engine, repo, config, _sink) = engine(MockRepo::new());
    let first = PathBuf::from("/notes/work");
    let second = PathBuf::from("/notes/home");

    engine.open_project(&first).await.unwrap();
    engine.open_project(&second).await.unwrap();
    engine.open_project(&first).await.unwrap();

    let cfg = config.get();
    assert_eq!(cfg.repo_path, Some(first.clone()));
    assert_eq!(cfg.recent_projects, vec![first, second]);
    assert_eq!(
        repo.calls(),
        vec!["ensure_initialized", "ensure_initialized", "ensure_initialized"]
    );
}

#[tokio::test]
async fn test_open_project_failure_keeps_previous_project() {
    let (engine, _repo, config, _sink) = engine(MockRepo::new());
    let good = PathBuf::from("/notes/work");
    engine.open_project(&good).await.unwrap();

    let repo = Arc::new(MockRepo::new().failing_init("Permission denied"));
    let engine = SyncEngine::new(
        config.clone(),
        repo.clone(),
        Arc::new(RecordingSink::default()),
    );

    let result = engine.open_project(Path::new("/readonly/notes")).await;

    assert!(result.is_err());
    assert_eq!(repo.calls(), vec!["ensure_initialized"]);
    let cfg = config.get();
    assert_eq!(cfg.repo_path, Some(good.clone()));
    assert_eq!(cfg.recent_projects, vec![good]);
}

#[tokio::test]
async fn test_recent_projects_are_capped() {
    let (engine, _repo, config, _sink) = engine(MockRepo::new());
    for i in 0..15 {
        engine
            .open_project(&PathBuf::from(format!("/notes/{i}")))
            .await
            .unwrap();
    }
    let recent = config.get().recent_projects;
    assert_eq!(recent.len(), 10);
    assert_eq!(recent[0], PathBuf::from("/notes/14"));
}

#[tokio::test]
async fn test_clone_opens_the_clone() {
    let (engine, repo, config, _sink) = engine(MockRepo::new());

    let path = engine
        .clone_repository("https://example.com/me/notes.git", Path::new("/work"))
        .await
        .unwrap();

    assert_eq!(path, PathBuf::from("/work/cloned"));
    assert_eq!(config.get().repo_path, Some(path));
    assert_eq!(
        repo.calls(),
        vec!["clone https://example.com/me/notes.git", "ensure_initialized"]
    );
}

#[tokio::test]
async fn test_init_repo_and_set_remote_pass_through() {
    let (engine, repo, config, _sink) = engine(MockRepo::new());

    engine.init_repo(Path::new("/notes/new")).await.unwrap();
    engine.set_remote("git@example.com:me/notes.git").await.unwrap();

    assert_eq!(
        repo.calls(),
        vec!["init_at /notes/new", "set_remote git@example.com:me/notes.git"]
    );
    // init does not switch projects
    assert_eq!(config.get().repo_path, None);
}

#[tokio::test]
async fn test_set_auto_sync_persists_and_publishes() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.json");
    let config = Arc::new(ConfigStore::open(&path).unwrap());
    let engine = SyncEngine::new(
        config.clone(),
        Arc::new(MockRepo::new()),
        Arc::new(RecordingSink::default()),
    );
    let mut rx = config.subscribe_auto_sync();
    assert_eq!(engine.auto_sync_config(), AutoSyncConfig::default());

    let saved = engine.set_auto_sync(true, 15).unwrap();
    assert_eq!(saved, AutoSyncConfig::new(true, 15));
    assert!(rx.has_changed().unwrap());
    assert_eq!(*rx.borrow_and_update(), saved);

    let on_disk = AppConfig::load(&path).unwrap();
    assert!(on_disk.git.auto_sync);
    assert_eq!(on_disk.git.auto_sync_interval, 15);
}

#[tokio::test]
async fn test_zero_interval_is_rejected() {
    let (engine, _repo, config, _sink) = engine(MockRepo::new());
    let err = engine.set_auto_sync(true, 0).unwrap_err();
    assert!(matches!(err, SyncError::InvalidSetting(_)));
    assert_eq!(config.auto_sync(), AutoSyncConfig::default());
}
