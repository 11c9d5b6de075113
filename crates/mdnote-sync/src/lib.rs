//! mdnote Sync - Git synchronization engine
//!
//! Provides:
//! - A polling status monitor holding the last-known repository snapshot
//! - The commit → pull → push orchestrator with a re-entrancy guard
//! - A timer-driven auto-sync scheduler with debounced change refreshes
//! - A dirty-document tracker for editing surfaces
//!
//! ## Modules
//!
//! - [`monitor`] - [`StatusMonitor`](monitor::StatusMonitor) and the shared [`StatusHandle`](monitor::StatusHandle)
//! - [`orchestrator`] - [`SyncOrchestrator`](orchestrator::SyncOrchestrator) state machine
//! - [`scheduler`] - [`AutoSyncScheduler`](scheduler::AutoSyncScheduler)
//! - [`watcher`] - Working-directory watcher and debounced change queue
//! - [`dirty`] - [`DirtyTracker`](dirty::DirtyTracker)
//! - [`engine`] - [`SyncEngine`](engine::SyncEngine) facade over all of the above
//! - [`sinks`] - Log-only notification sink

pub mod dirty;
pub mod engine;
pub mod monitor;
pub mod orchestrator;
pub mod scheduler;
pub mod sinks;
pub mod watcher;

use std::path::PathBuf;

use mdnote_core::config::ConfigError;
use mdnote_core::domain::RepoError;
use thiserror::Error;

pub use engine::SyncEngine;

/// Errors that can occur in the sync engine's management operations
#[derive(Debug, Error)]
pub enum SyncError {
    /// The repository adapter failed
    #[error(transparent)]
    Repository(#[from] RepoError),

    /// Reading or persisting the configuration failed
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The working-directory watcher could not be set up
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// An I/O error occurred while saving a document
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The document was never opened in the dirty tracker
    #[error("Document not open: {0}")]
    NotOpen(PathBuf),

    /// A setting was rejected before it was saved
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),
}

impl SyncError {
    /// Diagnostic text for a "show details" affordance
    pub fn details(&self) -> Option<&str> {
        match self {
            SyncError::Repository(e) => e.details(),
            _ => None,
        }
    }
}
