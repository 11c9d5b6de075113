//! Sync orchestrator - the commit → pull → push state machine
//!
//! At most one sequence runs at a time. A trigger that arrives while one is in
//! flight returns [`SyncOutcome::Skipped`] without touching the repository or
//! the held status. The phase is published on a `watch` channel so front ends
//! can show "Committing..." / "Syncing...".
//!
//! ## Sequence
//!
//! ```text
//! Idle ──trigger──▶ [committing] ──▶ pulling ──▶ pushing ──▶ Idle
//!                        │              │           │
//!                        └──────────────┴───────────┴──failure──▶ Idle (status = error)
//! ```
//!
//! There are no retries within a sequence; the next trigger is the recovery.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Local;
use mdnote_core::domain::{RepoError, SyncOutcome, SyncStatus, SyncStep, SyncTrigger};
use mdnote_core::ports::{INotificationSink, IRepository, PullOutcome};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::monitor::{StatusHandle, StatusMonitor};

/// Headline of the success notification
pub const SUCCESS_MESSAGE: &str = "Sync completed successfully";

// ============================================================================
// SyncGuard
// ============================================================================

/// Held for the lifetime of one sequence
///
/// Dropping it publishes `SyncStep::Idle` and releases the flag, on every
/// exit path.
struct SyncGuard<'a> {
    syncing: &'a AtomicBool,
    step: &'a watch::Sender<SyncStep>,
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.step.send_replace(SyncStep::Idle);
        self.syncing.store(false, Ordering::Release);
    }
}

/// How loudly a sequence reports its result
#[derive(Debug, Clone, Copy)]
struct Reporting {
    success: bool,
    failure: bool,
}

// ============================================================================
// SyncOrchestrator
// ============================================================================

/// Drives sync sequences against an [`IRepository`]
pub struct SyncOrchestrator {
    repo: Arc<dyn IRepository>,
    monitor: Arc<StatusMonitor>,
    notifier: Arc<dyn INotificationSink>,
    syncing: AtomicBool,
    step: watch::Sender<SyncStep>,
}

impl SyncOrchestrator {
    pub fn new(
        repo: Arc<dyn IRepository>,
        monitor: Arc<StatusMonitor>,
        notifier: Arc<dyn INotificationSink>,
    ) -> Self {
        let (step, _) = watch::channel(SyncStep::Idle);
        Self {
            repo,
            monitor,
            notifier,
            syncing: AtomicBool::new(false),
            step,
        }
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Acquire)
    }

    /// Current phase; `Idle` whenever no sequence runs
    pub fn step(&self) -> SyncStep {
        *self.step.borrow()
    }

    pub fn subscribe_step(&self) -> watch::Receiver<SyncStep> {
        self.step.subscribe()
    }

    pub fn status(&self) -> &StatusHandle {
        self.monitor.handle()
    }

    pub fn monitor(&self) -> &Arc<StatusMonitor> {
        &self.monitor
    }

    fn try_acquire(&self) -> Option<SyncGuard<'_>> {
        self.syncing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SyncGuard {
                syncing: &self.syncing,
                step: &self.step,
            })
    }

    /// Manual sync
    ///
    /// Commits when the refreshed status shows modified files, then pulls and
    /// pushes. `silent` suppresses the success notification only; a failed
    /// manual sync is always reported.
    #[tracing::instrument(skip(self))]
    pub async fn sync(&self, silent: bool) -> SyncOutcome {
        let Some(_guard) = self.try_acquire() else {
            debug!("Sync already in progress, ignoring trigger");
            return SyncOutcome::Skipped;
        };
        if self.repo.working_dir().is_none() {
            info!("No working directory configured, nothing to sync");
            return SyncOutcome::NotConfigured;
        }

        let status = self.monitor.refresh().await;
        let reporting = Reporting {
            success: !silent,
            failure: true,
        };
        self.run_sequence(SyncTrigger::Manual, status.modified_count > 0, reporting)
            .await
    }

    /// Auto-sync timer tick
    ///
    /// Refreshes status first: modified files get the full sequence, a
    /// diverged branch gets pull → push only, anything else does nothing.
    /// Never notifies; failures are logged and recorded in the status.
    #[tracing::instrument(skip(self))]
    pub async fn auto_sync(&self) -> SyncOutcome {
        let Some(_guard) = self.try_acquire() else {
            debug!("Sync already in progress, skipping auto-sync tick");
            return SyncOutcome::Skipped;
        };
        if self.repo.working_dir().is_none() {
            debug!("No working directory configured, skipping auto-sync tick");
            return SyncOutcome::NotConfigured;
        }

        let status = self.monitor.refresh().await;
        let reporting = Reporting {
            success: false,
            failure: false,
        };

        if status.modified_count > 0 {
            self.run_sequence(SyncTrigger::Auto, true, reporting).await
        } else if status.is_diverged() {
            self.run_sequence(SyncTrigger::Auto, false, reporting).await
        } else {
            debug!("Nothing to sync");
            SyncOutcome::UpToDate
        }
    }

    async fn run_sequence(
        &self,
        trigger: SyncTrigger,
        commit: bool,
        reporting: Reporting,
    ) -> SyncOutcome {
        info!(?trigger, commit, "Starting sync");

        match self.run_steps(trigger, commit).await {
            Ok(pulled) => {
                info!(committed = commit, pulled, "Sync completed");
                if reporting.success {
                    if let Err(e) = self.notifier.report_success(SUCCESS_MESSAGE).await {
                        warn!(error = %e, "Failed to deliver success notification");
                    }
                }
                SyncOutcome::Completed {
                    committed: commit,
                    pulled,
                }
            }
            Err((step, err)) => {
                let message = err.to_string();
                error!(step = %step, error = %message, "Sync failed");

                let failed: SyncStatus = self.status().current().with_error(message.clone());
                self.status().replace(failed);

                if reporting.failure {
                    let headline = format!("Sync failed: {}", message);
                    if let Err(e) = self.notifier.report_error(&headline, err.details()).await {
                        warn!(error = %e, "Failed to deliver error notification");
                    }
                }
                SyncOutcome::Failed { step, message }
            }
        }
    }

    /// Returns whether the pull integrated anything
    async fn run_steps(&self, trigger: SyncTrigger, commit: bool) -> Result<bool, (SyncStep, RepoError)> {
        if commit {
            self.enter(SyncStep::Committing).await;
            let message = trigger.commit_message(Local::now());
            self.repo
                .commit(&message)
                .await
                .map_err(|e| (SyncStep::Committing, e))?;
            self.monitor.refresh().await;
        }

        self.enter(SyncStep::Pulling).await;
        let pulled = match self.repo.pull().await {
            Ok(PullOutcome::Pulled) => true,
            Ok(PullOutcome::NoRemoteBranch) => false,
            Err(e) => return Err((SyncStep::Pulling, e)),
        };
        self.monitor.refresh().await;

        self.enter(SyncStep::Pushing).await;
        self.repo.push().await.map_err(|e| (SyncStep::Pushing, e))?;
        self.monitor.refresh().await;

        Ok(pulled)
    }

    async fn enter(&self, step: SyncStep) {
        debug!(step = %step, "Sync step");
        self.step.send_replace(step);
        if let Err(e) = self.notifier.report_progress(step).await {
            warn!(error = %e, "Failed to deliver progress notification");
        }
    }
}
