//! Timer behavior of AutoSyncScheduler under a paused tokio clock

mod common;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use common::{MockRepo, RecordingSink};
use mdnote_core::domain::AutoSyncConfig;
use mdnote_sync::monitor::{StatusHandle, StatusMonitor};
use mdnote_sync::orchestrator::SyncOrchestrator;
use mdnote_sync::scheduler::AutoSyncScheduler;
use mdnote_sync::watcher::ChangeEvent;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

fn orchestrator(repo: MockRepo) -> (Arc<SyncOrchestrator>, Arc<MockRepo>) {
    let repo = Arc::new(repo);
    let monitor = Arc::new(StatusMonitor::new(repo.clone(), StatusHandle::new()));
    let orch = Arc::new(SyncOrchestrator::new(
        repo.clone(),
        monitor,
        Arc::new(RecordingSink::default()),
    ));
    (orch, repo)
}

async fn minutes(n: u64) {
    tokio::time::sleep(Duration::from_secs(n * 60)).await;
}

#[tokio::test(start_paused = true)]
async fn test_disabled_scheduler_never_fires() {
    let (orch, repo) = orchestrator(MockRepo::new().with_modified(1));
    let (_tx, rx) = watch::channel(AutoSyncConfig::new(false, 1));
    let shutdown = CancellationToken::new();

    let task = tokio::spawn(AutoSyncScheduler::new(orch, rx).run(shutdown.clone()));
    minutes(120).await;

    assert!(repo.calls().is_empty());
    shutdown.cancel();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_enabled_timer_fires_after_each_interval() {
    let (orch, repo) = orchestrator(MockRepo::new().with_modified(1));
    let (_tx, rx) = watch::channel(AutoSyncConfig::new(true, 5));
    let shutdown = CancellationToken::new();

    let task = tokio::spawn(AutoSyncScheduler::new(orch, rx).run(shutdown.clone()));

    // Nothing before the first full period
    minutes(4).await;
    assert!(repo.calls().is_empty());

    minutes(2).await;
    assert_eq!(repo.calls(), vec!["commit", "pull", "push"]);

    // Second tick finds a clean, up-to-date tree
    minutes(5).await;
    assert_eq!(repo.calls().len(), 3);

    repo.set_modified(2);
    minutes(5).await;
    assert_eq!(repo.calls().len(), 6);

    shutdown.cancel();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_config_changes_start_restart_and_stop_timer() {
    let (orch, repo) = orchestrator(MockRepo::new().with_modified(1));
    let (tx, rx) = watch::channel(AutoSyncConfig::new(false, 30));
    let shutdown = CancellationToken::new();

    let task = tokio::spawn(AutoSyncScheduler::new(orch, rx).run(shutdown.clone()));
    minutes(10).await;

    tx.send(AutoSyncConfig::new(true, 10)).unwrap();
    minutes(9).await;
    assert!(repo.calls().is_empty());
    minutes(2).await;
    assert_eq!(repo.calls(), vec!["commit", "pull", "push"]);

    // New interval restarts the period from now
    repo.set_modified(1);
    tx.send(AutoSyncConfig::new(true, 20)).unwrap();
    minutes(15).await;
    assert_eq!(repo.calls().len(), 3);
    minutes(6).await;
    assert_eq!(repo.calls().len(), 6);

    // Disabling stops the timer
    repo.set_modified(1);
    tx.send(AutoSyncConfig::new(false, 20)).unwrap();
    minutes(60).await;
    assert_eq!(repo.calls().len(), 6);

    shutdown.cancel();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_closed_config_channel_keeps_timer() {
    let (orch, repo) = orchestrator(MockRepo::new().with_modified(1));
    let (tx, rx) = watch::channel(AutoSyncConfig::new(true, 1));
    let shutdown = CancellationToken::new();

    let task = tokio::spawn(AutoSyncScheduler::new(orch, rx).run(shutdown.clone()));
    drop(tx);

    minutes(1).await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(repo.calls(), vec!["commit", "pull", "push"]);

    shutdown.cancel();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_waits_for_running_tick() {
    let repo = MockRepo::new().with_modified(1);
    let gate = repo.gate_pull();
    let (orch, repo) = orchestrator(repo);
    let entered = Arc::clone(&repo.pull_entered);
    let (_tx, rx) = watch::channel(AutoSyncConfig::new(true, 1));
    let shutdown = CancellationToken::new();

    let mut task = tokio::spawn(AutoSyncScheduler::new(Arc::clone(&orch), rx).run(shutdown.clone()));
    entered.notified().await;
    assert!(orch.is_syncing());

    shutdown.cancel();
    let early = tokio::time::timeout(Duration::from_secs(10), &mut task).await;
    assert!(early.is_err(), "scheduler returned while a tick was running");

    gate.notify_one();
    task.await.unwrap();
    assert_eq!(repo.calls(), vec!["commit", "pull", "push"]);
    assert!(!orch.is_syncing());
}

#[tokio::test(start_paused = true)]
async fn test_settled_changes_refresh_status_without_syncing() {
    let (orch, repo) = orchestrator(MockRepo::new());
    let status = orch.status().clone();
    let (_tx, rx) = watch::channel(AutoSyncConfig::new(false, 30));
    let (change_tx, change_rx) = mpsc::channel(16);
    let shutdown = CancellationToken::new();

    let scheduler = AutoSyncScheduler::new(orch, rx).with_changes(change_rx, Duration::from_secs(2));
    let task = tokio::spawn(scheduler.run(shutdown.clone()));

    repo.set_modified(1);
    change_tx
        .send(ChangeEvent::Modified(PathBuf::from("/notes/a.md")))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(status.current().modified_count, 0);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(status.current().modified_count, 1);
    assert!(repo.calls().is_empty());

    shutdown.cancel();
    task.await.unwrap();
}
