//! Status monitor - polls the repository and holds the last snapshot
//!
//! The held [`SyncStatus`] lives in a `watch` channel behind a
//! [`StatusHandle`]. Every read replaces it wholesale, and every replacement
//! wakes subscribers, which is how the daemon turns status changes into
//! D-Bus signals.

use std::sync::Arc;
use std::time::Duration;

use mdnote_core::domain::SyncStatus;
use mdnote_core::ports::IRepository;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Default period between status reads
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

// ============================================================================
// StatusHandle
// ============================================================================

/// Shared, read-mostly holder of the current [`SyncStatus`]
#[derive(Debug, Clone)]
pub struct StatusHandle {
    tx: Arc<watch::Sender<SyncStatus>>,
}

impl Default for StatusHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusHandle {
    /// Creates a handle holding the idle snapshot
    pub fn new() -> Self {
        let (tx, _) = watch::channel(SyncStatus::idle());
        Self { tx: Arc::new(tx) }
    }

    /// Clone of the held snapshot
    pub fn current(&self) -> SyncStatus {
        self.tx.borrow().clone()
    }

    /// Receiver notified on every replacement
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.tx.subscribe()
    }

    /// Replaces the held snapshot and wakes subscribers
    pub fn replace(&self, status: SyncStatus) {
        self.tx.send_replace(status);
    }
}

// ============================================================================
// StatusMonitor
// ============================================================================

/// Reads repository status into a [`StatusHandle`]
pub struct StatusMonitor {
    repo: Arc<dyn IRepository>,
    status: StatusHandle,
}

impl StatusMonitor {
    pub fn new(repo: Arc<dyn IRepository>, status: StatusHandle) -> Self {
        Self { repo, status }
    }

    pub fn handle(&self) -> &StatusHandle {
        &self.status
    }

    /// Performs one status read and publishes the result
    ///
    /// A failed read publishes an error snapshot carrying the failure message
    /// and the previous `last_checked_at`. Never returns an error.
    pub async fn refresh(&self) -> SyncStatus {
        let next = match self.repo.status().await {
            Ok(status) => {
                debug!(
                    state = ?status.state,
                    modified = status.modified_count,
                    ahead = status.ahead,
                    behind = status.behind,
                    "Status refreshed"
                );
                status
            }
            Err(e) => {
                warn!(error = %e, "Status read failed");
                let previous = self.status.current().last_checked_at;
                SyncStatus::failed(e.to_string(), previous)
            }
        };

        self.status.replace(next.clone());
        next
    }

    /// Polls until `shutdown` is cancelled
    ///
    /// The first read happens immediately. Each read runs in its own task, so
    /// a panicking read is logged and the loop carries on.
    pub async fn run(self: Arc<Self>, interval: Duration, shutdown: CancellationToken) {
        info!(interval_secs = interval.as_secs(), "Status monitor starting");

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let monitor = Arc::clone(&self);
                    let poll = tokio::spawn(async move {
                        monitor.refresh().await;
                    });
                    if let Err(e) = poll.await {
                        error!(error = %e, "Status poll task failed");
                    }
                }
            }
        }

        info!("Status monitor stopped");
    }
}
