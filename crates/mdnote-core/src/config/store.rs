//! Shared, persisted configuration handle
//!
//! Every component reads the configuration through a [`ConfigStore`] so that
//! a change made by one (a new working directory, an auto-sync toggle) is
//! seen by all of them on their next read. Auto-sync changes are also
//! published on a watch channel for the scheduler.

use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::watch;
use tracing::{debug, info};

use super::{AppConfig, ConfigError};
use crate::domain::AutoSyncConfig;

/// Thread-safe configuration document with optional file backing
#[derive(Debug)]
pub struct ConfigStore {
    path: Option<PathBuf>,
    config: RwLock<AppConfig>,
    auto_sync_tx: watch::Sender<AutoSyncConfig>,
}

impl ConfigStore {
    /// Opens the store backed by `path`
    ///
    /// A missing file is created with defaults, which is how the auto-sync
    /// settings come into existence disabled on first run. A file that exists
    /// but cannot be parsed is an error; it is never overwritten.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = if path.exists() {
            AppConfig::load(&path)?
        } else {
            let config = AppConfig::default();
            write_atomic(&path, &config)?;
            info!(path = %path.display(), "Created default configuration");
            config
        };
        Ok(Self::build(Some(path), config))
    }

    /// Creates a store that never touches the filesystem
    pub fn ephemeral(config: AppConfig) -> Self {
        Self::build(None, config)
    }

    fn build(path: Option<PathBuf>, config: AppConfig) -> Self {
        let (auto_sync_tx, _) = watch::channel(config.auto_sync());
        Self {
            path,
            config: RwLock::new(config),
            auto_sync_tx,
        }
    }

    /// Backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Snapshot of the current document
    pub fn get(&self) -> AppConfig {
        self.read().clone()
    }

    /// Current working directory, read fresh on every call
    pub fn working_dir(&self) -> Option<PathBuf> {
        self.read().working_dir()
    }

    pub fn auto_sync(&self) -> AutoSyncConfig {
        self.read().auto_sync()
    }

    /// Receiver that observes every auto-sync settings change
    pub fn subscribe_auto_sync(&self) -> watch::Receiver<AutoSyncConfig> {
        self.auto_sync_tx.subscribe()
    }

    /// Applies `mutate` to a copy of the document and persists it
    ///
    /// The in-memory document only changes once the file write succeeded,
    /// and subscribers are notified after that.
    pub fn update<F>(&self, mutate: F) -> Result<AppConfig, ConfigError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut guard = self.write();
        let mut next = guard.clone();
        mutate(&mut next);

        if next == *guard {
            return Ok(next);
        }

        if let Some(path) = &self.path {
            write_atomic(path, &next)?;
            debug!(path = %path.display(), "Configuration saved");
        }
        *guard = next.clone();
        drop(guard);

        self.publish(next.auto_sync());
        Ok(next)
    }

    /// Re-reads the backing file, picking up edits made by other processes
    pub fn reload(&self) -> Result<AppConfig, ConfigError> {
        let Some(path) = &self.path else {
            return Ok(self.get());
        };
        let fresh = AppConfig::load(path)?;
        *self.write() = fresh.clone();
        self.publish(fresh.auto_sync());
        Ok(fresh)
    }

    fn publish(&self, auto: AutoSyncConfig) {
        self.auto_sync_tx.send_if_modified(|current| {
            if *current == auto {
                false
            } else {
                *current = auto;
                true
            }
        });
    }

    fn read(&self) -> RwLockReadGuard<'_, AppConfig> {
        self.config.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, AppConfig> {
        self.config.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// Writes the document to a sibling temp file, then renames it into place
fn write_atomic(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
    }

    let mut json = serde_json::to_string_pretty(config)?;
    json.push('\n');

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}
