//! Sync engine facade
//!
//! The [`SyncEngine`] is the in-process boundary that front ends talk to. It
//! bundles the configuration store, the repository port, the Status Monitor
//! and the Sync Orchestrator, and adds the management pass-throughs (stage,
//! diff, remote, clone, init, project switching).
//!
//! ## Boundary
//!
//! | operation            | behavior                                             |
//! |----------------------|------------------------------------------------------|
//! | `get_status`         | held snapshot, never fails                           |
//! | `sync`               | orchestrator sequence, errors go to the sink         |
//! | `add_file` etc.      | adapter call, then a status refresh                  |
//! | `set_auto_sync`      | persisted through the store, scheduler reacts        |

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use mdnote_core::config::ConfigStore;
use mdnote_core::domain::{AutoSyncConfig, SyncIndicator, SyncOutcome, SyncStatus, SyncStep};
use mdnote_core::ports::{INotificationSink, IRepository};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::dirty::DirtyTracker;
use crate::monitor::{StatusHandle, StatusMonitor};
use crate::orchestrator::SyncOrchestrator;
use crate::scheduler::AutoSyncScheduler;
use crate::SyncError;

/// In-process implementation of the sync boundary
pub struct SyncEngine {
    config: Arc<ConfigStore>,
    repo: Arc<dyn IRepository>,
    orchestrator: Arc<SyncOrchestrator>,
}

impl SyncEngine {
    pub fn new(
        config: Arc<ConfigStore>,
        repo: Arc<dyn IRepository>,
        notifier: Arc<dyn INotificationSink>,
    ) -> Self {
        let monitor = Arc::new(StatusMonitor::new(Arc::clone(&repo), StatusHandle::new()));
        let orchestrator = Arc::new(SyncOrchestrator::new(Arc::clone(&repo), monitor, notifier));
        Self {
            config,
            repo,
            orchestrator,
        }
    }

    pub fn config(&self) -> &Arc<ConfigStore> {
        &self.config
    }

    pub fn orchestrator(&self) -> &Arc<SyncOrchestrator> {
        &self.orchestrator
    }

    // ------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------

    /// Last published snapshot
    pub fn get_status(&self) -> SyncStatus {
        self.orchestrator.status().current()
    }

    /// Reads the repository now and publishes the result
    pub async fn refresh_status(&self) -> SyncStatus {
        self.orchestrator.monitor().refresh().await
    }

    /// One-line summary of the held snapshot and current phase
    pub fn indicator(&self) -> SyncIndicator {
        SyncIndicator::derive(&self.get_status(), self.orchestrator.step())
    }

    pub fn status_handle(&self) -> &StatusHandle {
        self.orchestrator.status()
    }

    pub fn subscribe_step(&self) -> watch::Receiver<SyncStep> {
        self.orchestrator.subscribe_step()
    }

    // ------------------------------------------------------------------
    // Sync
    // ------------------------------------------------------------------

    pub async fn sync(&self, silent: bool) -> SyncOutcome {
        self.orchestrator.sync(silent).await
    }

    // ------------------------------------------------------------------
    // Management pass-throughs
    // ------------------------------------------------------------------

    pub async fn add_file(&self, path: &Path) -> Result<(), SyncError> {
        self.repo.stage(path).await?;
        self.refresh_status().await;
        Ok(())
    }

    pub async fn get_diff(&self, path: &Path) -> Result<String, SyncError> {
        Ok(self.repo.diff(path).await?)
    }

    /// Records a manual conflict resolution for `path`
    pub async fn resolve_conflict(&self, path: &Path) -> Result<(), SyncError> {
        self.repo.mark_resolved(path).await?;
        self.refresh_status().await;
        Ok(())
    }

    /// Points `origin` at `url` in the current working directory
    pub async fn set_remote(&self, url: &str) -> Result<(), SyncError> {
        self.repo.set_remote(url, None).await?;
        info!(url, "Remote updated");
        Ok(())
    }

    /// Clones `url` under `parent` and makes the clone the current project
    pub async fn clone_repository(&self, url: &str, parent: &Path) -> Result<PathBuf, SyncError> {
        let path = self.repo.clone_repository(url, parent).await?;
        info!(url, path = %path.display(), "Repository cloned");
        self.open_project(&path).await?;
        Ok(path)
    }

    /// Initializes `path` as a new notebook without switching to it
    pub async fn init_repo(&self, path: &Path) -> Result<(), SyncError> {
        self.repo.init_at(path).await?;
        info!(path = %path.display(), "Notebook initialized");
        Ok(())
    }

    /// Makes `path` the working directory
    ///
    /// Saves it as `repoPath`, moves it to the front of the recent projects,
    /// initializes it if needed and refreshes status. When initialization
    /// fails the previous `repoPath` and recent projects are restored.
    pub async fn open_project(&self, path: &Path) -> Result<SyncStatus, SyncError> {
        let previous = self.config.get();
        self.config.update(|cfg| {
            cfg.repo_path = Some(path.to_path_buf());
            cfg.remember_project(path);
        })?;

        if let Err(e) = self.repo.ensure_initialized().await {
            warn!(
                path = %path.display(),
                error = %e,
                "Could not initialize project, keeping previous one"
            );
            if let Err(restore) = self.config.update(|cfg| {
                cfg.repo_path = previous.repo_path;
                cfg.recent_projects = previous.recent_projects;
            }) {
                warn!(error = %restore, "Failed to restore previous project");
            }
            return Err(e.into());
        }

        info!(path = %path.display(), "Project opened");
        Ok(self.refresh_status().await)
    }

    // ------------------------------------------------------------------
    // Auto-sync settings
    // ------------------------------------------------------------------

    pub fn auto_sync_config(&self) -> AutoSyncConfig {
        self.config.auto_sync()
    }

    /// Persists new auto-sync settings; a running scheduler picks them up
    pub fn set_auto_sync(
        &self,
        enabled: bool,
        interval_minutes: u32,
    ) -> Result<AutoSyncConfig, SyncError> {
        if interval_minutes == 0 {
            return Err(SyncError::InvalidSetting(
                "auto-sync interval must be at least 1 minute".to_string(),
            ));
        }
        let auto = AutoSyncConfig::new(enabled, interval_minutes);
        let saved = self.config.update(|cfg| cfg.set_auto_sync(auto))?;
        info!(enabled, interval_minutes, "Auto-sync settings saved");
        Ok(saved.auto_sync())
    }

    // ------------------------------------------------------------------
    // Background wiring
    // ------------------------------------------------------------------

    /// Starts the status polling loop
    pub fn spawn_monitor(&self, interval: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        let monitor = Arc::clone(self.orchestrator.monitor());
        tokio::spawn(monitor.run(interval, shutdown))
    }

    /// Auto-sync scheduler bound to this engine's settings
    pub fn scheduler(&self) -> AutoSyncScheduler {
        AutoSyncScheduler::new(
            Arc::clone(&self.orchestrator),
            self.config.subscribe_auto_sync(),
        )
    }

    /// Dirty tracker that stages saved documents through this engine's repository
    pub fn dirty_tracker(&self) -> DirtyTracker {
        DirtyTracker::with_repository(Arc::clone(&self.repo))
    }
}
