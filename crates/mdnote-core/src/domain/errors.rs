//! Domain error types
//!
//! This module defines the failure taxonomy of the Repository Adapter.
//! Every adapter operation returns [`RepoError`]; the Sync Orchestrator is the
//! single place that decides which of these reach the user.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// The version-control operation that produced a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitOperation {
    Init,
    Clone,
    Remote,
    Stage,
    Commit,
    Pull,
    Push,
    Status,
    Diff,
}

impl fmt::Display for GitOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GitOperation::Init => "init",
            GitOperation::Clone => "clone",
            GitOperation::Remote => "remote",
            GitOperation::Stage => "add",
            GitOperation::Commit => "commit",
            GitOperation::Pull => "pull",
            GitOperation::Push => "push",
            GitOperation::Status => "status",
            GitOperation::Diff => "diff",
        };
        write!(f, "{}", s)
    }
}

/// Errors raised by the Repository Adapter
#[derive(Debug, Error)]
pub enum RepoError {
    /// No working directory has been configured yet
    #[error("Project path not configured")]
    NotConfigured,

    /// The working directory is configured but does not exist on disk
    #[error("Working directory does not exist: {0}")]
    DirectoryMissing(PathBuf),

    /// The remote has no branch matching the local one (never pushed)
    #[error("Remote branch does not exist yet: {branch}")]
    RemoteRefMissing { branch: String },

    /// Network, authentication or protocol failure while talking to the remote
    #[error("{operation} failed: {message}")]
    TransportFailure {
        operation: GitOperation,
        message: String,
        details: Option<String>,
    },

    /// The working tree has unresolved merge conflicts
    #[error("Merge conflict in {} file(s)", .0.len())]
    MergeConflict(Vec<String>),

    /// Clone target already exists and has content
    #[error("Destination path '{}' already exists and is not empty.", .0.display())]
    DestinationNotEmpty(PathBuf),

    /// The `git` executable could not be started
    #[error("git executable not available: {0}")]
    GitUnavailable(String),

    /// A git command exited with a non-zero status not covered above
    #[error("git {operation} exited with {code:?}: {stderr}")]
    Command {
        operation: GitOperation,
        code: Option<i32>,
        stderr: String,
    },

    /// Filesystem error while preparing or inspecting the working directory
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisting a configuration side effect failed
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RepoError {
    /// Free-form diagnostic text for a "show details" affordance
    ///
    /// The headline message (`Display`) stays comprehensible without it.
    pub fn details(&self) -> Option<&str> {
        match self {
            RepoError::TransportFailure { details, .. } => details.as_deref(),
            RepoError::Command { stderr, .. } if !stderr.is_empty() => Some(stderr),
            _ => None,
        }
    }

    /// Returns true for the failures that talk to the remote
    pub fn is_transport(&self) -> bool {
        matches!(self, RepoError::TransportFailure { .. })
    }
}
