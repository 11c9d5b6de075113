//! Chooses between a running daemon and an in-process engine
//!
//! When `mdnoted` owns its bus name every operation goes over D-Bus, so the
//! daemon's re-entrancy guard and configuration stay authoritative. Otherwise
//! the CLI builds its own [`SyncEngine`] over the same configuration file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use mdnote_core::config::ConfigStore;
use mdnote_core::domain::{AutoSyncConfig, SyncOutcome, SyncStatus};
use mdnote_core::ports::INotificationSink;
use mdnote_git::{GitRepository, Identity};
use mdnote_ipc::client::SyncClient;
use mdnote_sync::sinks::LogNotificationSink;
use mdnote_sync::SyncEngine;
use tracing::debug;

use crate::output::{ConsoleNotificationSink, OutputFormat};

pub enum Backend {
    Daemon(SyncClient),
    Local(SyncEngine),
}

impl Backend {
    /// Connects to the daemon, falling back to an in-process engine
    pub async fn connect(config_path: &Path, format: OutputFormat) -> Result<Self> {
        match SyncClient::connect().await {
            Ok(Some(client)) => {
                debug!("Using running daemon");
                return Ok(Backend::Daemon(client));
            }
            Ok(None) => {}
            Err(e) => debug!(error = %e, "Session bus unavailable"),
        }
        Ok(Backend::Local(local_engine(config_path, format)?))
    }

    pub fn is_daemon(&self) -> bool {
        matches!(self, Backend::Daemon(_))
    }

    /// Current status; a local engine reads the repository first
    pub async fn status(&self) -> Result<SyncStatus> {
        match self {
            Backend::Daemon(client) => client.status().await,
            Backend::Local(engine) => Ok(engine.refresh_status().await),
        }
    }

    pub async fn indicator(&self) -> Result<String> {
        match self {
            Backend::Daemon(client) => client.indicator().await,
            Backend::Local(engine) => Ok(engine.indicator().to_string()),
        }
    }

    pub async fn sync(&self, silent: bool) -> Result<SyncOutcome> {
        match self {
            Backend::Daemon(client) => client.sync(silent).await,
            Backend::Local(engine) => Ok(engine.sync(silent).await),
        }
    }

    pub async fn add_file(&self, path: &Path) -> Result<()> {
        match self {
            Backend::Daemon(client) => Ok(client.proxy().add_file(&display(path)).await?),
            Backend::Local(engine) => Ok(engine.add_file(path).await?),
        }
    }

    pub async fn get_diff(&self, path: &Path) -> Result<String> {
        match self {
            Backend::Daemon(client) => Ok(client.proxy().get_diff(&display(path)).await?),
            Backend::Local(engine) => Ok(engine.get_diff(path).await?),
        }
    }

    pub async fn resolve_conflict(&self, path: &Path) -> Result<()> {
        match self {
            Backend::Daemon(client) => Ok(client.proxy().resolve_conflict(&display(path)).await?),
            Backend::Local(engine) => Ok(engine.resolve_conflict(path).await?),
        }
    }

    pub async fn set_remote(&self, url: &str) -> Result<()> {
        match self {
            Backend::Daemon(client) => Ok(client.proxy().set_remote(url).await?),
            Backend::Local(engine) => Ok(engine.set_remote(url).await?),
        }
    }

    pub async fn clone_repository(&self, url: &str, parent: &Path) -> Result<PathBuf> {
        match self {
            Backend::Daemon(client) => {
                let path = client
                    .proxy()
                    .clone_repository(url, &display(parent))
                    .await?;
                Ok(PathBuf::from(path))
            }
            Backend::Local(engine) => Ok(engine.clone_repository(url, parent).await?),
        }
    }

    pub async fn init_repo(&self, path: &Path) -> Result<()> {
        match self {
            Backend::Daemon(client) => Ok(client.proxy().init_repo(&display(path)).await?),
            Backend::Local(engine) => Ok(engine.init_repo(path).await?),
        }
    }

    pub async fn open_project(&self, path: &Path) -> Result<SyncStatus> {
        match self {
            Backend::Daemon(client) => {
                let json = client.proxy().open_project(&display(path)).await?;
                serde_json::from_str(&json).context("Daemon returned malformed status")
            }
            Backend::Local(engine) => Ok(engine.open_project(path).await?),
        }
    }

    pub async fn auto_sync(&self) -> Result<AutoSyncConfig> {
        match self {
            Backend::Daemon(client) => client.auto_sync().await,
            Backend::Local(engine) => Ok(engine.auto_sync_config()),
        }
    }

    pub async fn set_auto_sync(&self, enabled: bool, interval_minutes: u32) -> Result<AutoSyncConfig> {
        match self {
            Backend::Daemon(client) => {
                client
                    .proxy()
                    .set_auto_sync(enabled, interval_minutes)
                    .await?;
                client.auto_sync().await
            }
            Backend::Local(engine) => Ok(engine.set_auto_sync(enabled, interval_minutes)?),
        }
    }
}

/// Engine over the configuration at `config_path`
///
/// JSON output keeps stdout machine-readable, so notifications then only go
/// to the log.
pub fn local_engine(config_path: &Path, format: OutputFormat) -> Result<SyncEngine> {
    let config = Arc::new(
        ConfigStore::open(config_path)
            .with_context(|| format!("Failed to open configuration at {}", config_path.display()))?,
    );

    let mut repo = GitRepository::from_config(Arc::clone(&config));
    if let Some((name, email)) = config.get().identity() {
        repo = repo.with_identity(Identity::new(name, email));
    }

    let notifier: Arc<dyn INotificationSink> = if format.is_json() {
        Arc::new(LogNotificationSink)
    } else {
        Arc::new(ConsoleNotificationSink)
    };

    Ok(SyncEngine::new(config, Arc::new(repo), notifier))
}

/// Resolves `path` against the current directory
///
/// The daemon runs elsewhere, so relative paths must not cross the bus.
pub fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    Ok(cwd.join(path))
}

fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
