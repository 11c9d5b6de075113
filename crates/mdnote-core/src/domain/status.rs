//! Repository status snapshot
//!
//! A [`SyncStatus`] describes the working directory relative to its remote at
//! one point in time. Snapshots are never mutated incrementally by consumers:
//! every read produces a complete new value.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::sync::SyncStep;

// ============================================================================
// SyncState
// ============================================================================

/// Coarse repository state shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    #[default]
    Idle,
    Conflict,
    Error,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncState::Idle => "idle",
            SyncState::Conflict => "conflict",
            SyncState::Error => "error",
        };
        write!(f, "{}", s)
    }
}

// ============================================================================
// FileStatus
// ============================================================================

/// Two-column status of one changed path, using git's single-character codes
///
/// `index` is the staged state, `working_tree` the unstaged state. A space
/// means "unchanged" in that column; `?` marks untracked files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStatus {
    pub index: char,
    pub working_tree: char,
}

/// Porcelain code pairs that denote an unmerged (conflicted) path
const UNMERGED_CODES: &[(char, char)] = &[
    ('D', 'D'),
    ('A', 'U'),
    ('U', 'D'),
    ('U', 'A'),
    ('D', 'U'),
    ('A', 'A'),
    ('U', 'U'),
];

impl FileStatus {
    pub fn new(index: char, working_tree: char) -> Self {
        Self {
            index,
            working_tree,
        }
    }

    /// Returns true if this code pair describes a merge conflict
    pub fn is_conflicted(&self) -> bool {
        UNMERGED_CODES.contains(&(self.index, self.working_tree))
    }

    pub fn is_untracked(&self) -> bool {
        self.index == '?' && self.working_tree == '?'
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.index, self.working_tree)
    }
}

// ============================================================================
// SyncStatus
// ============================================================================

/// Snapshot of repository state relative to its remote
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub state: SyncState,
    /// Local commits not yet pushed
    pub ahead: u32,
    /// Remote commits not yet integrated
    pub behind: u32,
    /// Changed-but-uncommitted paths, untracked files included
    pub modified_count: u32,
    pub conflicted_paths: BTreeSet<String>,
    pub file_statuses: BTreeMap<String, FileStatus>,
    /// Time of the most recent successful status read (not the last sync)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checked_at: Option<DateTime<Utc>>,
    /// Set only while `state == Error`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl SyncStatus {
    /// The status reported for an unconfigured, missing or non-repository
    /// working directory
    pub fn idle() -> Self {
        Self::default()
    }

    /// Builds a snapshot from per-path status codes
    ///
    /// Paths whose code pair is unmerged are added to `conflicted_paths`,
    /// together with any explicitly supplied conflicted paths. A non-empty
    /// conflict set forces `state = Conflict`.
    pub fn from_entries(
        ahead: u32,
        behind: u32,
        file_statuses: BTreeMap<String, FileStatus>,
        checked_at: DateTime<Utc>,
    ) -> Self {
        let conflicted_paths: BTreeSet<String> = file_statuses
            .iter()
            .filter(|(_, status)| status.is_conflicted())
            .map(|(path, _)| path.clone())
            .collect();

        let state = if conflicted_paths.is_empty() {
            SyncState::Idle
        } else {
            SyncState::Conflict
        };

        Self {
            state,
            ahead,
            behind,
            modified_count: file_statuses.len() as u32,
            conflicted_paths,
            file_statuses,
            last_checked_at: Some(checked_at),
            error_message: None,
        }
    }

    /// Error snapshot for a failed status read
    ///
    /// Counts are zeroed rather than kept stale; `last_checked_at` is carried
    /// forward because it records the last *successful* read.
    pub fn failed(message: impl Into<String>, last_checked_at: Option<DateTime<Utc>>) -> Self {
        Self {
            state: SyncState::Error,
            last_checked_at,
            error_message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Returns this snapshot flagged with an error message
    ///
    /// Conflicts take precedence: a snapshot with conflicted paths stays in
    /// `Conflict` and carries no error message.
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        if self.conflicted_paths.is_empty() {
            self.state = SyncState::Error;
            self.error_message = Some(message.into());
        }
        self
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicted_paths.is_empty()
    }

    /// Returns true when local and remote have diverged in either direction
    pub fn is_diverged(&self) -> bool {
        self.ahead > 0 || self.behind > 0
    }

    pub fn is_error(&self) -> bool {
        self.state == SyncState::Error
    }
}

// ============================================================================
// SyncIndicator
// ============================================================================

/// One-line summary of the engine state for toolbars and terminals
///
/// Derived in precedence order: an in-flight sync, an error, conflicts,
/// uncommitted changes, unpushed commits, unpulled commits, up to date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SyncIndicator {
    Syncing(SyncStep),
    Error(String),
    Conflict(u32),
    Modified(u32),
    Ahead(u32),
    Behind(u32),
    UpToDate,
}

impl SyncIndicator {
    /// Derives the indicator from the held snapshot and the current step
    ///
    /// `step` is `SyncStep::Idle` whenever no sync is in flight.
    pub fn derive(status: &SyncStatus, step: SyncStep) -> Self {
        if step != SyncStep::Idle {
            return SyncIndicator::Syncing(step);
        }
        if status.state == SyncState::Error {
            return SyncIndicator::Error(
                status
                    .error_message
                    .clone()
                    .unwrap_or_else(|| "Unknown error".to_string()),
            );
        }
        if status.has_conflicts() {
            return SyncIndicator::Conflict(status.conflicted_paths.len() as u32);
        }
        if status.modified_count > 0 {
            return SyncIndicator::Modified(status.modified_count);
        }
        if status.ahead > 0 {
            return SyncIndicator::Ahead(status.ahead);
        }
        if status.behind > 0 {
            return SyncIndicator::Behind(status.behind);
        }
        SyncIndicator::UpToDate
    }
}

impl fmt::Display for SyncIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncIndicator::Syncing(SyncStep::Committing) => write!(f, "Committing..."),
            SyncIndicator::Syncing(_) => write!(f, "Syncing..."),
            SyncIndicator::Error(msg) => write!(f, "Sync error: {}", msg),
            SyncIndicator::Conflict(n) => write!(f, "{} conflicted file(s)", n),
            SyncIndicator::Modified(n) => write!(f, "{} modified", n),
            SyncIndicator::Ahead(n) => write!(f, "{} to push", n),
            SyncIndicator::Behind(n) => write!(f, "{} to pull", n),
            SyncIndicator::UpToDate => write!(f, "Up to date"),
        }
    }
}
