//! Domain types and invariants
//!
//! - Repository status snapshots and the derived toolbar indicator
//! - Orchestration phases, outcomes and the auto-sync schedule
//! - The Repository Adapter error taxonomy

pub mod errors;
pub mod status;
pub mod sync;

// Re-export commonly used types
pub use errors::{GitOperation, RepoError};
pub use status::{FileStatus, SyncIndicator, SyncState, SyncStatus};
pub use sync::{AutoSyncConfig, SyncOutcome, SyncStep, SyncTrigger};
