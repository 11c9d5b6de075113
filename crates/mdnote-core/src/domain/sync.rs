//! Orchestration phase, outcome and auto-sync schedule types

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Phase of an in-flight sync sequence
///
/// `Idle` whenever no sequence runs; the other variants exist only while the
/// orchestrator holds its re-entrancy guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStep {
    #[default]
    Idle,
    Committing,
    Pulling,
    Pushing,
}

impl fmt::Display for SyncStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncStep::Idle => "idle",
            SyncStep::Committing => "committing",
            SyncStep::Pulling => "pulling",
            SyncStep::Pushing => "pushing",
        };
        write!(f, "{}", s)
    }
}

/// What started a sync sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    Manual,
    Auto,
}

impl SyncTrigger {
    /// Commit message for a sync started by this trigger
    ///
    /// The text is cosmetic; it only has to be non-empty and must never need
    /// user input.
    pub fn commit_message(&self, at: DateTime<Local>) -> String {
        let label = match self {
            SyncTrigger::Manual => "Manual sync",
            SyncTrigger::Auto => "Auto sync",
        };
        format!("{}: {}", label, at.format("%Y-%m-%d %H:%M:%S"))
    }
}

/// Result of one call into the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Another sync was already in flight; nothing happened
    Skipped,
    /// No working directory is configured; nothing happened
    NotConfigured,
    /// Auto-sync tick found nothing to commit, pull or push
    UpToDate,
    /// The sequence ran to completion
    ///
    /// `pulled` is false when the remote had no branch to pull from yet.
    Completed { committed: bool, pulled: bool },
    /// The sequence aborted at `step`
    Failed { step: SyncStep, message: String },
}

impl SyncOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, SyncOutcome::Failed { .. })
    }
}

// ============================================================================
// AutoSyncConfig
// ============================================================================

/// Default auto-sync interval in minutes
pub const DEFAULT_AUTO_SYNC_INTERVAL_MINUTES: u32 = 30;

/// Timer settings for automatic synchronization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoSyncConfig {
    pub enabled: bool,
    pub interval_minutes: u32,
}

impl Default for AutoSyncConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_minutes: DEFAULT_AUTO_SYNC_INTERVAL_MINUTES,
        }
    }
}

impl AutoSyncConfig {
    pub fn new(enabled: bool, interval_minutes: u32) -> Self {
        Self {
            enabled,
            interval_minutes,
        }
    }

    /// Timer period; an interval of zero is treated as one minute
    pub fn interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.interval_minutes.max(1)) * 60)
    }
}
