//! mdnote Daemon - Background synchronization service
//!
//! This binary runs as a user service and handles:
//! - The D-Bus interface used by editors and the CLI
//! - Periodic status polling of the working directory
//! - Auto-sync on the configured interval
//! - Optional file watching that refreshes status after edits settle
//! - Graceful shutdown on SIGTERM/SIGINT
//!
//! # Architecture
//!
//! The daemon owns one [`SyncEngine`]. The D-Bus service, the Status Monitor,
//! the Auto-Sync Scheduler and the watch follower are independent tasks that
//! all observe the same `CancellationToken`, which the signal handler cancels.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use mdnote_core::config::{AppConfig, ConfigStore};
use mdnote_core::domain::SyncStatus;
use mdnote_git::{GitRepository, Identity};
use mdnote_ipc::notifier::DesktopNotificationSink;
use mdnote_ipc::service::DbusService;
use mdnote_ipc::DBUS_NAME;
use mdnote_sync::monitor::DEFAULT_POLL_INTERVAL;
use mdnote_sync::watcher::FileWatcher;
use mdnote_sync::SyncEngine;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

// ============================================================================
// DaemonService
// ============================================================================

/// Wires the engine to its background tasks
struct DaemonService {
    config: Arc<ConfigStore>,
    engine: Arc<SyncEngine>,
    shutdown: CancellationToken,
}

impl DaemonService {
    /// Opens the configuration and builds the engine
    async fn new(config: Arc<ConfigStore>, shutdown: CancellationToken) -> Result<Self> {
        let snapshot = config.get();
        let mut repo = GitRepository::from_config(Arc::clone(&config));
        if let Some((name, email)) = snapshot.identity() {
            repo = repo.with_identity(Identity::new(name, email));
        }

        let notifier = DesktopNotificationSink::connect().await;
        if !notifier.is_connected() {
            warn!("Desktop notifications unavailable; sync results go to the log only");
        }

        let engine = SyncEngine::new(Arc::clone(&config), Arc::new(repo), Arc::new(notifier));

        Ok(Self {
            config,
            engine: Arc::new(engine),
            shutdown,
        })
    }

    /// Runs until the shutdown token is cancelled
    ///
    /// 1. Acquires the D-Bus name (single instance lock)
    /// 2. Starts signal forwarding, status polling and the scheduler
    /// 3. Waits for shutdown, then for every task to finish
    async fn run(&self) -> Result<()> {
        info!("Checking for existing daemon instance...");

        let dbus_service = DbusService::new(Arc::clone(&self.engine));
        let connection = match dbus_service.start().await {
            Ok(conn) => {
                info!("D-Bus service started, acquired name {}", DBUS_NAME);
                conn
            }
            Err(e) => {
                let err_str = format!("{e:#}");
                if err_str.contains("already taken")
                    || err_str.contains("already owned")
                    || err_str.contains("NameTaken")
                    || err_str.contains("name already")
                {
                    error!(
                        "Another instance of mdnoted is already running (D-Bus name {} is taken)",
                        DBUS_NAME
                    );
                    anyhow::bail!(
                        "Another instance of mdnoted is already running. \
                         Use 'mdnote daemon stop' to stop it first."
                    );
                }
                return Err(e).context("Failed to start D-Bus service");
            }
        };

        match self.config.working_dir() {
            Some(dir) => info!(working_dir = %dir.display(), "Serving working directory"),
            None => warn!("No working directory configured. Run 'mdnote open <path>' to set one."),
        }

        let mut tasks: Vec<JoinHandle<()>> = Vec::new();
        tasks.push(dbus_service.spawn_signal_forwarder(connection.clone(), self.shutdown.clone()));
        tasks.push(
            self.engine
                .spawn_monitor(DEFAULT_POLL_INTERVAL, self.shutdown.clone()),
        );

        let mut scheduler = self.engine.scheduler();
        let git = self.config.get().git;
        if git.watch_changes {
            match FileWatcher::new() {
                Ok((watcher, changes)) => {
                    let debounce = Duration::from_secs(git.debounce_seconds);
                    scheduler = scheduler.with_changes(changes, debounce);
                    tasks.push(tokio::spawn(follow_working_dir(
                        watcher,
                        Arc::clone(&self.config),
                        self.engine.status_handle().subscribe(),
                        self.shutdown.clone(),
                    )));
                }
                Err(e) => warn!(error = %e, "File watching disabled"),
            }
        }
        tasks.push(tokio::spawn(scheduler.run(self.shutdown.clone())));

        let auto = self.engine.auto_sync_config();
        info!(
            auto_sync = auto.enabled,
            interval_minutes = auto.interval_minutes,
            watch_changes = git.watch_changes,
            "Daemon running"
        );

        self.shutdown.cancelled().await;
        info!("Shutdown signal received, stopping tasks");

        for task in tasks {
            if let Err(e) = task.await {
                error!(error = %e, "Background task ended abnormally");
            }
        }

        // Keep the bus name until every task that may emit signals is gone.
        drop(connection);
        Ok(())
    }
}

/// Points the file watcher at the configured working directory
///
/// Re-checks whenever the status changes, which covers project switches made
/// over D-Bus since opening a project refreshes the status.
async fn follow_working_dir(
    mut watcher: FileWatcher,
    config: Arc<ConfigStore>,
    mut status_rx: watch::Receiver<SyncStatus>,
    shutdown: CancellationToken,
) {
    retarget(&mut watcher, config.working_dir());

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                status_rx.borrow_and_update();
                let wanted = config.working_dir();
                if watcher.watched() != wanted.as_deref() {
                    retarget(&mut watcher, wanted);
                }
            }
        }
    }

    if let Err(e) = watcher.unwatch() {
        debug!(error = %e, "Failed to release file watch");
    }
}

fn retarget(watcher: &mut FileWatcher, dir: Option<PathBuf>) {
    let result = match dir.as_deref() {
        Some(dir) if dir.is_dir() => watcher.watch(dir),
        Some(dir) => {
            debug!(path = %dir.display(), "Working directory missing, not watching");
            watcher.unwatch()
        }
        None => watcher.unwatch(),
    };
    match result {
        Ok(()) => debug!(watched = ?watcher.watched(), "File watch updated"),
        Err(e) => warn!(error = %e, "Failed to update file watch"),
    }
}

// ============================================================================
// Logging
// ============================================================================

/// Builds the filter: `RUST_LOG` wins over `logging.level`
fn env_filter(config: &AppConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"))
    })
}

fn init_tracing(config: &AppConfig) {
    let filter = env_filter(config);
    if config.logging.format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

// ============================================================================
// Graceful shutdown signal handler
// ============================================================================

/// Waits for SIGTERM or SIGINT and triggers the cancellation token
///
/// If a handler cannot be installed, that signal source is ignored and the
/// other one still works.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

// ============================================================================
// Main entry point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = AppConfig::default_path();
    let config = ConfigStore::open(&config_path)
        .with_context(|| format!("Failed to open configuration at {}", config_path.display()))?;
    init_tracing(&config.get());

    info!(config_path = %config_path.display(), "mdnote daemon starting (mdnoted)");

    let shutdown_token = CancellationToken::new();

    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let service = DaemonService::new(Arc::new(config), shutdown_token.clone()).await?;

    let result = service.run().await;

    match &result {
        Ok(()) => info!("mdnote daemon shut down gracefully"),
        Err(e) => error!(error = %e, "mdnote daemon exiting with error"),
    }

    result
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_token_child_propagation() {
        let parent = CancellationToken::new();
        let child1 = parent.child_token();
        let child2 = parent.child_token();

        assert!(!child1.is_cancelled());
        assert!(!child2.is_cancelled());

        parent.cancel();

        assert!(child1.is_cancelled());
        assert!(child2.is_cancelled());
    }

    #[test]
    fn test_env_filter_accepts_configured_level() {
        let mut config = AppConfig::default();
        config.logging.level = "debug".to_string();
        // RUST_LOG may be set in the test environment; only check it builds
        let _ = env_filter(&config);

        config.logging.level = "not a [valid filter".to_string();
        let _ = env_filter(&config);
    }

    #[test]
    fn test_default_config_path_is_not_empty() {
        assert!(!AppConfig::default_path().as_os_str().is_empty());
    }

    #[tokio::test]
    async fn test_follower_stops_on_shutdown() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = Arc::new(ConfigStore::ephemeral(AppConfig {
            repo_path: Some(tmp.path().to_path_buf()),
            ..AppConfig::default()
        }));
        let (watcher, _changes) = FileWatcher::new().unwrap();
        let (_status_tx, status_rx) = watch::channel(SyncStatus::idle());
        let shutdown = CancellationToken::new();

        let task = tokio::spawn(follow_working_dir(
            watcher,
            config,
            status_rx,
            shutdown.clone(),
        ));
        shutdown.cancel();
        task.await.unwrap();
    }
}
