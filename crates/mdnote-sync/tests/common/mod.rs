//! In-memory test doubles for the repository and notification ports

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mdnote_core::domain::{GitOperation, RepoError, SyncStatus, SyncStep};
use mdnote_core::ports::{INotificationSink, IRepository, PullOutcome};
use tokio::sync::Notify;

// ============================================================================
// MockRepo
// ============================================================================

/// Repository double that records mutating calls in order
///
/// `commit` clears the modified count and bumps `ahead`, `push` clears
/// `ahead`, so follow-up status reads look like a real repository.
pub struct MockRepo {
    calls: Mutex<Vec<String>>,
    status: Mutex<SyncStatus>,
    working_dir: Mutex<Option<PathBuf>>,
    pull_outcome: Mutex<PullOutcome>,
    fail_commit: Mutex<Option<String>>,
    fail_pull: Mutex<Option<String>>,
    fail_push: Mutex<Option<String>>,
    fail_stage: Mutex<Option<String>>,
    fail_init: Mutex<Option<String>>,
    /// Notified when `pull` is entered
    pub pull_entered: Arc<Notify>,
    /// When set, `pull` waits for this before returning
    pull_gate: Mutex<Option<Arc<Notify>>>,
}

impl MockRepo {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            status: Mutex::new(SyncStatus::idle()),
            working_dir: Mutex::new(Some(PathBuf::from("/notes"))),
            pull_outcome: Mutex::new(PullOutcome::Pulled),
            fail_commit: Mutex::new(None),
            fail_pull: Mutex::new(None),
            fail_push: Mutex::new(None),
            fail_stage: Mutex::new(None),
            fail_init: Mutex::new(None),
            pull_entered: Arc::new(Notify::new()),
            pull_gate: Mutex::new(None),
        }
    }

    pub fn with_modified(self, n: u32) -> Self {
        self.status.lock().unwrap().modified_count = n;
        self
    }

    pub fn with_status(self, status: SyncStatus) -> Self {
        *self.status.lock().unwrap() = status;
        self
    }

    pub fn with_working_dir(self, dir: Option<PathBuf>) -> Self {
        *self.working_dir.lock().unwrap() = dir;
        self
    }

    pub fn with_pull_outcome(self, outcome: PullOutcome) -> Self {
        *self.pull_outcome.lock().unwrap() = outcome;
        self
    }

    pub fn failing_commit(self, message: &str) -> Self {
        *self.fail_commit.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn failing_pull(self, message: &str) -> Self {
        *self.fail_pull.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn failing_push(self, message: &str) -> Self {
        *self.fail_push.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn failing_stage(self, message: &str) -> Self {
        *self.fail_stage.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn failing_init(self, message: &str) -> Self {
        *self.fail_init.lock().unwrap() = Some(message.to_string());
        self
    }

    /// Makes `pull` block until the returned gate is notified
    pub fn gate_pull(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.pull_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_modified(&self, n: u32) {
        self.status.lock().unwrap().modified_count = n;
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn transport(operation: GitOperation, message: &str) -> RepoError {
        RepoError::TransportFailure {
            operation,
            message: message.to_string(),
            details: Some(format!("fatal: {}", message)),
        }
    }
}

#[async_trait]
impl IRepository for MockRepo {
    fn working_dir(&self) -> Option<PathBuf> {
        self.working_dir.lock().unwrap().clone()
    }

    async fn ensure_initialized(&self) -> Result<(), RepoError> {
        self.record("ensure_initialized");
        if let Some(msg) = self.fail_init.lock().unwrap().clone() {
            return Err(RepoError::Command {
                operation: GitOperation::Init,
                code: Some(128),
                stderr: msg,
            });
        }
        Ok(())
    }

    async fn init_at(&self, path: &Path) -> Result<(), RepoError> {
        self.record(format!("init_at {}", path.display()));
        Ok(())
    }

    async fn set_remote(&self, url: &str, _path: Option<&Path>) -> Result<(), RepoError> {
        self.record(format!("set_remote {}", url));
        Ok(())
    }

    async fn clone_repository(&self, url: &str, parent: &Path) -> Result<PathBuf, RepoError> {
        self.record(format!("clone {}", url));
        Ok(parent.join("cloned"))
    }

    async fn stage_all(&self) -> Result<(), RepoError> {
        self.record("stage_all");
        Ok(())
    }

    async fn stage(&self, path: &Path) -> Result<(), RepoError> {
        self.record(format!("stage {}", path.display()));
        if let Some(msg) = self.fail_stage.lock().unwrap().clone() {
            return Err(RepoError::Command {
                operation: GitOperation::Stage,
                code: Some(128),
                stderr: msg,
            });
        }
        Ok(())
    }

    async fn commit(&self, _message: &str) -> Result<(), RepoError> {
        self.record("commit");
        if let Some(msg) = self.fail_commit.lock().unwrap().clone() {
            return Err(RepoError::Command {
                operation: GitOperation::Commit,
                code: Some(1),
                stderr: msg,
            });
        }
        let mut status = self.status.lock().unwrap();
        status.modified_count = 0;
        status.ahead += 1;
        Ok(())
    }

    async fn pull(&self) -> Result<PullOutcome, RepoError> {
        self.record("pull");
        self.pull_entered.notify_one();

        let gate = self.pull_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if let Some(msg) = self.fail_pull.lock().unwrap().clone() {
            return Err(Self::transport(GitOperation::Pull, &msg));
        }
        self.status.lock().unwrap().behind = 0;
        Ok(*self.pull_outcome.lock().unwrap())
    }

    async fn push(&self) -> Result<(), RepoError> {
        self.record("push");
        if let Some(msg) = self.fail_push.lock().unwrap().clone() {
            return Err(Self::transport(GitOperation::Push, &msg));
        }
        self.status.lock().unwrap().ahead = 0;
        Ok(())
    }

    async fn status(&self) -> Result<SyncStatus, RepoError> {
        Ok(self.status.lock().unwrap().clone())
    }

    async fn diff(&self, path: &Path) -> Result<String, RepoError> {
        Ok(format!("diff --git a/{0} b/{0}", path.display()))
    }

    async fn mark_resolved(&self, path: &Path) -> Result<(), RepoError> {
        self.record(format!("resolve {}", path.display()));
        self.status.lock().unwrap().conflicted_paths.clear();
        Ok(())
    }
}

// ============================================================================
// RecordingSink
// ============================================================================

/// Notification sink that keeps everything it is told
#[derive(Default)]
pub struct RecordingSink {
    pub successes: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<(String, Option<String>)>>,
    pub progress: Mutex<Vec<SyncStep>>,
}

impl RecordingSink {
    pub fn successes(&self) -> Vec<String> {
        self.successes.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<(String, Option<String>)> {
        self.errors.lock().unwrap().clone()
    }

    pub fn progress(&self) -> Vec<SyncStep> {
        self.progress.lock().unwrap().clone()
    }
}

#[async_trait]
impl INotificationSink for RecordingSink {
    async fn report_success(&self, message: &str) -> anyhow::Result<()> {
        self.successes.lock().unwrap().push(message.to_string());
        Ok(())
    }

    async fn report_error(&self, message: &str, details: Option<&str>) -> anyhow::Result<()> {
        self.errors
            .lock()
            .unwrap()
            .push((message.to_string(), details.map(str::to_string)));
        Ok(())
    }

    async fn report_progress(&self, step: SyncStep) -> anyhow::Result<()> {
        self.progress.lock().unwrap().push(step);
        Ok(())
    }
}
