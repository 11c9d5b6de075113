//! Auto-sync scheduler
//!
//! Owns the auto-sync timer. The timer exists only while the published
//! [`AutoSyncConfig`] is enabled; every change to the config stops the old
//! timer and, if still enabled, starts a new one with the new period. The
//! first tick fires one full period after (re)start.
//!
//! Optionally consumes [`ChangeEvent`]s from a [`FileWatcher`](crate::watcher::FileWatcher).
//! Settled changes only refresh the Status Monitor; they never start a sync.
//!
//! ```text
//! ConfigStore ──watch──▶ ┐
//! FileWatcher ──mpsc───▶ ├─▶ AutoSyncScheduler ──tick──▶ SyncOrchestrator::auto_sync
//! CancellationToken ───▶ ┘            └──settled──▶ StatusMonitor::refresh
//! ```

use std::sync::Arc;
use std::time::Duration;

use mdnote_core::domain::AutoSyncConfig;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::orchestrator::SyncOrchestrator;
use crate::watcher::{ChangeEvent, DebouncedChangeQueue};

/// How often the debounce queue is checked for settled changes
const SETTLE_CHECK_INTERVAL: Duration = Duration::from_millis(250);

struct ChangeFeed {
    rx: mpsc::Receiver<ChangeEvent>,
    queue: DebouncedChangeQueue,
}

/// Fires [`SyncOrchestrator::auto_sync`] on the configured interval
pub struct AutoSyncScheduler {
    orchestrator: Arc<SyncOrchestrator>,
    config_rx: watch::Receiver<AutoSyncConfig>,
    changes: Option<ChangeFeed>,
}

impl AutoSyncScheduler {
    pub fn new(
        orchestrator: Arc<SyncOrchestrator>,
        config_rx: watch::Receiver<AutoSyncConfig>,
    ) -> Self {
        Self {
            orchestrator,
            config_rx,
            changes: None,
        }
    }

    /// Refreshes status once edits have been quiet for `debounce`
    pub fn with_changes(mut self, rx: mpsc::Receiver<ChangeEvent>, debounce: Duration) -> Self {
        self.changes = Some(ChangeFeed {
            rx,
            queue: DebouncedChangeQueue::new(debounce),
        });
        self
    }

    /// Runs until `shutdown` is cancelled
    ///
    /// A tick that is still running at shutdown is awaited, never cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        let Self {
            orchestrator,
            mut config_rx,
            mut changes,
        } = self;

        let mut config = *config_rx.borrow_and_update();
        let mut timer = start_timer(&config);
        let mut config_open = true;
        let mut settle = tokio::time::interval(SETTLE_CHECK_INTERVAL);
        settle.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut in_flight: Option<JoinHandle<()>> = None;

        info!(
            enabled = config.enabled,
            interval_minutes = config.interval_minutes,
            watching = changes.is_some(),
            "Auto-sync scheduler starting"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,

                changed = config_rx.changed(), if config_open => match changed {
                    Ok(()) => {
                        let next = *config_rx.borrow_and_update();
                        if next != config {
                            info!(
                                enabled = next.enabled,
                                interval_minutes = next.interval_minutes,
                                "Auto-sync settings changed, restarting timer"
                            );
                            config = next;
                            timer = start_timer(&config);
                        }
                    }
                    Err(_) => {
                        debug!("Auto-sync settings channel closed, keeping current timer");
                        config_open = false;
                    }
                },

                _ = next_tick(&mut timer) => {
                    in_flight = spawn_tick(&orchestrator, in_flight).await;
                }

                event = next_change(&mut changes) => match event {
                    Some(change) => {
                        if let Some(feed) = changes.as_mut() {
                            feed.queue.push(change);
                        }
                    }
                    None => {
                        debug!("Change feed closed");
                        changes = None;
                    }
                },

                _ = settle.tick(), if changes.is_some() => {
                    let settled = changes
                        .as_mut()
                        .map(|feed| feed.queue.poll())
                        .unwrap_or_default();
                    if !settled.is_empty() {
                        debug!(count = settled.len(), "Edits settled, refreshing status");
                        let monitor = Arc::clone(orchestrator.monitor());
                        tokio::spawn(async move {
                            monitor.refresh().await;
                        });
                    }
                }
            }
        }

        if let Some(handle) = in_flight {
            if !handle.is_finished() {
                info!("Waiting for running auto-sync to finish");
            }
            if let Err(e) = handle.await {
                error!(error = %e, "Auto-sync tick task failed");
            }
        }
        info!("Auto-sync scheduler stopped");
    }
}

fn start_timer(config: &AutoSyncConfig) -> Option<Interval> {
    if !config.enabled {
        return None;
    }
    let period = config.interval();
    let mut timer = tokio::time::interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    Some(timer)
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn next_change(changes: &mut Option<ChangeFeed>) -> Option<ChangeEvent> {
    match changes {
        Some(feed) => feed.rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Starts one isolated tick and returns its handle
///
/// The tick runs in its own task so a panic inside it is logged instead of
/// ending the scheduler. The previous handle is reaped first.
async fn spawn_tick(
    orchestrator: &Arc<SyncOrchestrator>,
    previous: Option<JoinHandle<()>>,
) -> Option<JoinHandle<()>> {
    if let Some(handle) = previous {
        if !handle.is_finished() {
            debug!("Previous auto-sync still running, skipping tick");
            return Some(handle);
        }
        if let Err(e) = handle.await {
            error!(error = %e, "Auto-sync tick task failed");
        }
    }

    let orchestrator = Arc::clone(orchestrator);
    Some(tokio::spawn(async move {
        let outcome = orchestrator.auto_sync().await;
        debug!(?outcome, "Auto-sync tick finished");
    }))
}
