//! Client side of `org.mdnote.Sync`
//!
//! [`SyncClient`] wraps the generated proxy and decodes the JSON payloads
//! back into domain types.

use anyhow::{Context, Result};
use mdnote_core::domain::{AutoSyncConfig, SyncOutcome, SyncStatus};
use tracing::debug;

use crate::DBUS_NAME;

#[zbus::proxy(
    interface = "org.mdnote.Sync",
    default_service = "org.mdnote.Sync",
    default_path = "/org/mdnote/Sync"
)]
pub trait SyncService {
    fn get_status(&self) -> zbus::Result<String>;
    fn get_indicator(&self) -> zbus::Result<String>;
    fn sync(&self, silent: bool) -> zbus::Result<String>;
    fn add_file(&self, path: &str) -> zbus::Result<()>;
    fn get_diff(&self, path: &str) -> zbus::Result<String>;
    fn resolve_conflict(&self, path: &str) -> zbus::Result<()>;
    fn set_remote(&self, url: &str) -> zbus::Result<()>;
    fn clone_repository(&self, url: &str, parent: &str) -> zbus::Result<String>;
    fn init_repo(&self, path: &str) -> zbus::Result<()>;
    fn open_project(&self, path: &str) -> zbus::Result<String>;
    fn get_auto_sync(&self) -> zbus::Result<(bool, u32)>;
    fn set_auto_sync(&self, enabled: bool, interval_minutes: u32) -> zbus::Result<()>;

    #[zbus(signal)]
    fn status_changed(&self, status: &str) -> zbus::Result<()>;

    #[zbus(signal)]
    fn step_changed(&self, step: &str) -> zbus::Result<()>;
}

/// Returns true when some process owns the daemon's bus name
pub async fn daemon_running(connection: &zbus::Connection) -> Result<bool> {
    let dbus = zbus::fdo::DBusProxy::new(connection).await?;
    let name = zbus::names::BusName::try_from(DBUS_NAME)?;
    Ok(dbus.name_has_owner(name).await?)
}

/// Typed client for a running daemon
pub struct SyncClient {
    proxy: SyncServiceProxy<'static>,
}

impl SyncClient {
    /// Connects to the daemon, or returns `None` when it is not running
    pub async fn connect() -> Result<Option<Self>> {
        let connection = zbus::Connection::session()
            .await
            .context("Failed to connect to the session bus")?;
        if !daemon_running(&connection).await? {
            debug!(name = DBUS_NAME, "Daemon not running");
            return Ok(None);
        }
        let proxy = SyncServiceProxy::new(&connection).await?;
        Ok(Some(Self { proxy }))
    }

    pub fn proxy(&self) -> &SyncServiceProxy<'static> {
        &self.proxy
    }

    pub async fn status(&self) -> Result<SyncStatus> {
        let json = self.proxy.get_status().await?;
        serde_json::from_str(&json).context("Daemon returned malformed status")
    }

    pub async fn indicator(&self) -> Result<String> {
        Ok(self.proxy.get_indicator().await?)
    }

    pub async fn sync(&self, silent: bool) -> Result<SyncOutcome> {
        let json = self.proxy.sync(silent).await?;
        serde_json::from_str(&json).context("Daemon returned malformed sync outcome")
    }

    pub async fn auto_sync(&self) -> Result<AutoSyncConfig> {
        let (enabled, interval) = self.proxy.get_auto_sync().await?;
        Ok(AutoSyncConfig::new(enabled, interval))
    }
}
