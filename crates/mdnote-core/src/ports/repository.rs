//! Repository port (driven/secondary port)
//!
//! This module defines the interface the Sync Engine uses to talk to the
//! version-control working copy. The production implementation shells out to
//! the `git` executable (`mdnote-git`); tests substitute in-memory mocks.
//!
//! ## Design Notes
//!
//! - Every call is atomic from the caller's point of view and may fail.
//! - Implementations perform **no retries**; retry policy belongs to the
//!   orchestrator, which deliberately has none within a single sync.
//! - Implementations hold no locks. Mutating calls (`commit`, `pull`,
//!   `push`) are only issued from inside the orchestrator's guarded
//!   sequence; `status` and `diff` may overlap with it.
//! - Paths given to `stage`, `diff` and `mark_resolved` may be absolute; the
//!   adapter converts them relative to the repository root.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::{RepoError, SyncStatus};

/// Result of a rebase pull
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    /// Remote commits (if any) were integrated
    Pulled,
    /// The remote has no branch for the current one yet; nothing was done
    NoRemoteBranch,
}

/// Port trait for the version-control working copy
#[async_trait]
pub trait IRepository: Send + Sync {
    /// Root of the working directory, if one is configured
    fn working_dir(&self) -> Option<PathBuf>;

    /// Creates the working directory and repository if absent
    ///
    /// A freshly initialized repository receives a bootstrap commit so that a
    /// branch reference exists before any sync. Idempotent.
    async fn ensure_initialized(&self) -> Result<(), RepoError>;

    /// Initializes an arbitrary directory as a new notebook repository
    async fn init_at(&self, path: &Path) -> Result<(), RepoError>;

    /// Points `origin` at `url`, replacing an existing `origin`
    ///
    /// When `path` is `None` the configured working directory is used and the
    /// URL is also persisted to the application configuration.
    async fn set_remote(&self, url: &str, path: Option<&Path>) -> Result<(), RepoError>;

    /// Clones `url` into a new directory under `parent` and returns its path
    ///
    /// Fails with [`RepoError::DestinationNotEmpty`] when the derived target
    /// exists and has content.
    async fn clone_repository(&self, url: &str, parent: &Path) -> Result<PathBuf, RepoError>;

    /// Stages every change in the working tree
    async fn stage_all(&self) -> Result<(), RepoError>;

    /// Stages a single path
    async fn stage(&self, path: &Path) -> Result<(), RepoError>;

    /// Stages all pending changes, then commits them
    async fn commit(&self, message: &str) -> Result<(), RepoError>;

    /// Rebase-pulls the current branch from `origin`
    async fn pull(&self) -> Result<PullOutcome, RepoError>;

    /// Pushes the current branch to `origin`, setting the upstream if absent
    async fn push(&self) -> Result<(), RepoError>;

    /// Reads a full status snapshot
    ///
    /// A missing, unconfigured or non-repository working directory yields
    /// [`SyncStatus::idle`], never an error.
    async fn status(&self) -> Result<SyncStatus, RepoError>;

    /// Working-tree-vs-index diff text for one path
    async fn diff(&self, path: &Path) -> Result<String, RepoError>;

    /// Records a user-resolved conflict by staging the path
    async fn mark_resolved(&self, path: &Path) -> Result<(), RepoError>;
}
