//! D-Bus service for the mdnote daemon
//!
//! Exposes the [`SyncEngine`] boundary as `org.mdnote.Sync`. Structured
//! values (status, outcome) travel as JSON strings so that clients in any
//! language can read them without a custom D-Bus signature.
//!
//! Management failures come back as `org.freedesktop.DBus.Error.Failed`
//! carrying the adapter's message. Status changes and sync phases are
//! emitted as the `StatusChanged` and `StepChanged` signals.

use std::path::PathBuf;
use std::sync::Arc;

use mdnote_core::domain::{SyncStatus, SyncStep};
use mdnote_sync::{SyncEngine, SyncError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use zbus::fdo;

use crate::{DBUS_NAME, DBUS_PATH};

fn to_fdo(err: SyncError) -> fdo::Error {
    fdo::Error::Failed(err.to_string())
}

fn status_json(status: &SyncStatus) -> String {
    serde_json::to_string(status).unwrap_or_else(|_| "{}".to_string())
}

// ============================================================================
// SyncInterface
// ============================================================================

/// `org.mdnote.Sync` object backed by a [`SyncEngine`]
pub struct SyncInterface {
    engine: Arc<SyncEngine>,
}

impl SyncInterface {
    pub fn new(engine: Arc<SyncEngine>) -> Self {
        Self { engine }
    }
}

#[zbus::interface(name = "org.mdnote.Sync")]
impl SyncInterface {
    /// Held status snapshot as JSON
    async fn get_status(&self) -> String {
        status_json(&self.engine.get_status())
    }

    /// One-line human summary
    async fn get_indicator(&self) -> String {
        self.engine.indicator().to_string()
    }

    /// Runs a sync and returns the outcome as JSON
    ///
    /// Returns `{"outcome":"skipped"}` immediately when one is already running.
    async fn sync(&self, silent: bool) -> String {
        info!(silent, "Sync requested over D-Bus");
        let outcome = self.engine.sync(silent).await;
        serde_json::to_string(&outcome).unwrap_or_else(|_| "{}".to_string())
    }

    async fn add_file(&self, path: String) -> fdo::Result<()> {
        self.engine
            .add_file(&PathBuf::from(path))
            .await
            .map_err(to_fdo)
    }

    async fn get_diff(&self, path: String) -> fdo::Result<String> {
        self.engine
            .get_diff(&PathBuf::from(path))
            .await
            .map_err(to_fdo)
    }

    async fn resolve_conflict(&self, path: String) -> fdo::Result<()> {
        self.engine
            .resolve_conflict(&PathBuf::from(path))
            .await
            .map_err(to_fdo)
    }

    async fn set_remote(&self, url: String) -> fdo::Result<()> {
        self.engine.set_remote(&url).await.map_err(to_fdo)
    }

    /// Clones and opens the repository; returns the clone's path
    async fn clone_repository(&self, url: String, parent: String) -> fdo::Result<String> {
        let path = self
            .engine
            .clone_repository(&url, &PathBuf::from(parent))
            .await
            .map_err(to_fdo)?;
        Ok(path.to_string_lossy().into_owned())
    }

    async fn init_repo(&self, path: String) -> fdo::Result<()> {
        self.engine
            .init_repo(&PathBuf::from(path))
            .await
            .map_err(to_fdo)
    }

    /// Switches the working directory; returns the refreshed status as JSON
    async fn open_project(&self, path: String) -> fdo::Result<String> {
        let status = self
            .engine
            .open_project(&PathBuf::from(path))
            .await
            .map_err(to_fdo)?;
        Ok(status_json(&status))
    }

    /// `(enabled, interval_minutes)`
    async fn get_auto_sync(&self) -> (bool, u32) {
        let auto = self.engine.auto_sync_config();
        (auto.enabled, auto.interval_minutes)
    }

    async fn set_auto_sync(&self, enabled: bool, interval_minutes: u32) -> fdo::Result<()> {
        self.engine
            .set_auto_sync(enabled, interval_minutes)
            .map(|_| ())
            .map_err(to_fdo)
    }

    /// Emitted whenever the held status is replaced
    #[zbus(signal)]
    async fn status_changed(signal_ctxt: &zbus::SignalContext<'_>, status: &str) -> zbus::Result<()>;

    /// Emitted when a sync enters a new phase, and with `idle` when it ends
    #[zbus(signal)]
    async fn step_changed(signal_ctxt: &zbus::SignalContext<'_>, step: &str) -> zbus::Result<()>;
}

// ============================================================================
// DbusService
// ============================================================================

/// Owns the session-bus connection that serves the engine
pub struct DbusService {
    engine: Arc<SyncEngine>,
}

impl DbusService {
    pub fn new(engine: Arc<SyncEngine>) -> Self {
        Self { engine }
    }

    /// Registers the interface and requests the well-known name
    ///
    /// Fails when the name is already owned, which makes the name a
    /// single-instance lock for the daemon. The returned connection must be
    /// kept alive for the service to stay on the bus.
    pub async fn start(&self) -> anyhow::Result<zbus::Connection> {
        info!("Starting D-Bus service on session bus");

        let connection = zbus::connection::Builder::session()?
            .name(DBUS_NAME)?
            .serve_at(DBUS_PATH, SyncInterface::new(Arc::clone(&self.engine)))?
            .build()
            .await?;

        info!(name = DBUS_NAME, path = DBUS_PATH, "D-Bus service started");
        Ok(connection)
    }

    /// Forwards status and step changes as D-Bus signals until `shutdown`
    pub fn spawn_signal_forwarder(
        &self,
        connection: zbus::Connection,
        shutdown: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let status_rx = self.engine.status_handle().subscribe();
        let step_rx = self.engine.subscribe_step();
        tokio::spawn(forward_signals(connection, status_rx, step_rx, shutdown))
    }
}

async fn forward_signals(
    connection: zbus::Connection,
    mut status_rx: watch::Receiver<SyncStatus>,
    mut step_rx: watch::Receiver<SyncStep>,
    shutdown: CancellationToken,
) {
    let ctxt = match zbus::SignalContext::new(&connection, DBUS_PATH) {
        Ok(ctxt) => ctxt,
        Err(e) => {
            warn!(error = %e, "Cannot create signal context, signals disabled");
            return;
        }
    };

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,

            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let json = status_json(&status_rx.borrow_and_update());
                if let Err(e) = SyncInterface::status_changed(&ctxt, &json).await {
                    warn!(error = %e, "Failed to emit StatusChanged");
                }
            }

            changed = step_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let step = step_rx.borrow_and_update().to_string();
                debug!(step = %step, "Emitting StepChanged");
                if let Err(e) = SyncInterface::step_changed(&ctxt, &step).await {
                    warn!(error = %e, "Failed to emit StepChanged");
                }
            }
        }
    }

    debug!("Signal forwarder stopped");
}

// ============================================================================
// Tests
// ============================================================================
