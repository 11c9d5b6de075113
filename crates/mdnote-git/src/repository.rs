//! [`IRepository`] implementation over the `git` executable

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use mdnote_core::config::ConfigStore;
use mdnote_core::domain::{GitOperation, RepoError, SyncStatus};
use mdnote_core::ports::{IRepository, PullOutcome};
use tracing::{debug, info, warn};

use crate::command::{classify_failure, is_missing_remote_ref, Git, Identity};
use crate::status::parse_porcelain;

/// Message of the commit that gives a fresh working directory a branch
const BOOTSTRAP_COMMIT_MESSAGE: &str = "Initial commit by mdNote";

/// Message of the commit created by [`IRepository::init_at`]
const NOTEBOOK_COMMIT_MESSAGE: &str = "Initial commit";

const README_FILE: &str = "README.md";
const README_CONTENT: &str = "# Notebook\n\nCreated with mdNote.\n";

/// Fallback directory name when a clone URL has no usable last segment
const DEFAULT_CLONE_DIR: &str = "repository";

enum Root {
    Fixed(PathBuf),
    Config(Arc<ConfigStore>),
}

/// Repository Adapter backed by the `git` command line
///
/// Holds no locks and performs no retries. The working directory is either
/// fixed at construction or read from the configuration on every call.
pub struct GitRepository {
    root: Root,
    git: Git,
    identity: Option<Identity>,
}

impl GitRepository {
    /// Adapter bound to one directory
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Root::Fixed(root.into()),
            git: Git::default(),
            identity: None,
        }
    }

    /// Adapter that follows `repoPath` in the configuration
    ///
    /// `set_remote` without an explicit path also records the URL there.
    pub fn from_config(config: Arc<ConfigStore>) -> Self {
        Self {
            root: Root::Config(config),
            git: Git::default(),
            identity: None,
        }
    }

    /// Overrides the commit identity from the configuration
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn with_git(mut self, git: Git) -> Self {
        self.git = git;
        self
    }

    fn root(&self) -> Result<PathBuf, RepoError> {
        self.working_dir().ok_or(RepoError::NotConfigured)
    }

    fn identity(&self) -> Option<Identity> {
        if let Some(id) = &self.identity {
            return Some(id.clone());
        }
        match &self.root {
            Root::Config(store) => store
                .get()
                .identity()
                .map(|(name, email)| Identity::new(name, email)),
            Root::Fixed(_) => None,
        }
    }

    async fn run(
        &self,
        operation: GitOperation,
        cwd: &Path,
        args: &[&str],
    ) -> Result<String, RepoError> {
        self.git
            .run(operation, cwd, self.identity().as_ref(), args)
            .await
    }

    async fn current_branch(&self, root: &Path) -> Result<String, RepoError> {
        let out = self
            .run(GitOperation::Status, root, &["symbolic-ref", "--short", "-q", "HEAD"])
            .await?;
        Ok(out.trim().to_string())
    }

    async fn stage_in(&self, root: &Path, path: &Path) -> Result<(), RepoError> {
        let relative = relative_to_root(root, path);
        let relative = relative.to_string_lossy();
        self.run(GitOperation::Stage, root, &["add", "--", &relative])
            .await?;
        Ok(())
    }
}

#[async_trait]
impl IRepository for GitRepository {
    fn working_dir(&self) -> Option<PathBuf> {
        match &self.root {
            Root::Fixed(path) => Some(path.clone()),
            Root::Config(store) => store.working_dir(),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn ensure_initialized(&self) -> Result<(), RepoError> {
        let root = self.root()?;
        tokio::fs::create_dir_all(&root).await?;

        if is_repository(&root) {
            debug!(path = %root.display(), "Repository already initialized");
            return Ok(());
        }

        self.run(GitOperation::Init, &root, &["init"]).await?;
        self.run(GitOperation::Stage, &root, &["add", "-A"]).await?;
        self.run(
            GitOperation::Commit,
            &root,
            &["commit", "--allow-empty", "-m", BOOTSTRAP_COMMIT_MESSAGE],
        )
        .await?;

        info!(path = %root.display(), "Initialized repository");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn init_at(&self, path: &Path) -> Result<(), RepoError> {
        tokio::fs::create_dir_all(path).await?;

        if is_repository(path) {
            debug!(path = %path.display(), "Notebook already initialized");
            return Ok(());
        }

        self.run(GitOperation::Init, path, &["init"]).await?;

        let readme = path.join(README_FILE);
        if !tokio::fs::try_exists(&readme).await? {
            tokio::fs::write(&readme, README_CONTENT).await?;
        }
        self.run(GitOperation::Stage, path, &["add", "--", README_FILE])
            .await?;
        self.run(
            GitOperation::Commit,
            path,
            &["commit", "-m", NOTEBOOK_COMMIT_MESSAGE],
        )
        .await?;

        info!(path = %path.display(), "Initialized notebook");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn set_remote(&self, url: &str, path: Option<&Path>) -> Result<(), RepoError> {
        let dir = match path {
            Some(p) => p.to_path_buf(),
            None => self.root()?,
        };

        let remotes = self.run(GitOperation::Remote, &dir, &["remote"]).await?;
        if remotes.lines().any(|r| r.trim() == "origin") {
            self.run(GitOperation::Remote, &dir, &["remote", "remove", "origin"])
                .await?;
        }
        self.run(GitOperation::Remote, &dir, &["remote", "add", "origin", url])
            .await?;

        if path.is_none() {
            if let Root::Config(store) = &self.root {
                store
                    .update(|cfg| cfg.remote_url = Some(url.to_string()))
                    .map_err(|e| RepoError::Config(e.to_string()))?;
            }
        }

        info!(url, path = %dir.display(), "Remote origin set");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn clone_repository(&self, url: &str, parent: &Path) -> Result<PathBuf, RepoError> {
        let target = parent.join(clone_dir_name(url));

        if tokio::fs::try_exists(&target).await? && !is_empty_dir(&target).await? {
            return Err(RepoError::DestinationNotEmpty(target));
        }

        tokio::fs::create_dir_all(&target).await?;
        let target_arg = target.to_string_lossy();
        self.run(GitOperation::Clone, parent, &["clone", url, &target_arg])
            .await?;

        info!(url, path = %target.display(), "Repository cloned");
        Ok(target)
    }

    #[tracing::instrument(skip(self))]
    async fn stage_all(&self) -> Result<(), RepoError> {
        let root = self.root()?;
        self.run(GitOperation::Stage, &root, &["add", "-A"]).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn stage(&self, path: &Path) -> Result<(), RepoError> {
        let root = self.root()?;
        self.stage_in(&root, path).await
    }

    #[tracing::instrument(skip(self))]
    async fn commit(&self, message: &str) -> Result<(), RepoError> {
        let root = self.root()?;
        self.run(GitOperation::Stage, &root, &["add", "-A"]).await?;
        self.run(GitOperation::Commit, &root, &["commit", "-m", message])
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn pull(&self) -> Result<PullOutcome, RepoError> {
        let root = self.root()?;
        let branch = self.current_branch(&root).await?;

        let out = self
            .git
            .output(
                &root,
                self.identity().as_ref(),
                ["pull", "--rebase", "origin", branch.as_str()],
            )
            .await?;

        if out.success() {
            return Ok(PullOutcome::Pulled);
        }
        if is_missing_remote_ref(&out.stderr) {
            warn!(branch = %branch, "Pull skipped: remote branch does not exist yet");
            return Ok(PullOutcome::NoRemoteBranch);
        }
        Err(classify_failure(GitOperation::Pull, out.code, &out.stderr))
    }

    #[tracing::instrument(skip(self))]
    async fn push(&self) -> Result<(), RepoError> {
        let root = self.root()?;
        let branch = self.current_branch(&root).await?;
        self.run(GitOperation::Push, &root, &["push", "-u", "origin", &branch])
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn status(&self) -> Result<SyncStatus, RepoError> {
        let Some(root) = self.working_dir() else {
            return Ok(SyncStatus::idle());
        };
        if !tokio::fs::try_exists(&root).await.unwrap_or(false) || !is_repository(&root) {
            return Ok(SyncStatus::idle());
        }

        let raw = self
            .run(
                GitOperation::Status,
                &root,
                &[
                    "status",
                    "--porcelain=v1",
                    "--branch",
                    "--untracked-files=all",
                    "-z",
                ],
            )
            .await?;
        let parsed = parse_porcelain(&raw);

        Ok(SyncStatus::from_entries(
            parsed.ahead,
            parsed.behind,
            parsed.entries,
            Utc::now(),
        ))
    }

    #[tracing::instrument(skip(self))]
    async fn diff(&self, path: &Path) -> Result<String, RepoError> {
        let root = self.root()?;
        let relative = relative_to_root(&root, path);
        let relative = relative.to_string_lossy();
        self.run(GitOperation::Diff, &root, &["diff", "--", &relative])
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn mark_resolved(&self, path: &Path) -> Result<(), RepoError> {
        let root = self.root()?;
        self.stage_in(&root, path).await?;
        info!(path = %path.display(), "Conflict marked as resolved");
        Ok(())
    }
}

fn is_repository(root: &Path) -> bool {
    root.join(".git").exists()
}

async fn is_empty_dir(path: &Path) -> Result<bool, RepoError> {
    let mut entries = tokio::fs::read_dir(path).await?;
    Ok(entries.next_entry().await?.is_none())
}

/// Converts an absolute path inside `root` to a repository-relative one
///
/// Relative paths, and absolute paths outside the root, are passed through
/// unchanged so git can report them.
pub fn relative_to_root(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        if let Ok(rel) = path.strip_prefix(root) {
            return rel.to_path_buf();
        }
    }
    path.to_path_buf()
}

/// Directory name a clone of `url` lands in
///
/// The last path segment with a trailing `.git` stripped, e.g.
/// `https://github.com/me/notes.git` → `notes`.
pub fn clone_dir_name(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    let last = trimmed
        .rsplit(['/', ':'])
        .next()
        .unwrap_or_default();
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() {
        DEFAULT_CLONE_DIR.to_string()
    } else {
        name.to_string()
    }
}
