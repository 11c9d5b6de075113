//! Dirty-document tracking for editing surfaces
//!
//! A document is dirty while its in-memory content differs from the content
//! last loaded from or written to disk. Dirtiness is cleared only by a
//! confirmed write. The orchestrator never consults this tracker; it relies
//! on the repository's modified count.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use mdnote_core::ports::IRepository;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::SyncError;

#[derive(Debug, Clone)]
struct Document {
    /// Content as it is on disk
    baseline: String,
    /// Content as it is in the editor
    current: String,
}

impl Document {
    fn is_dirty(&self) -> bool {
        self.current != self.baseline
    }
}

/// Tracks unsaved edits per absolute path
///
/// Uses DashMap so an editor thread and background saves can touch different
/// documents without a global lock.
#[derive(Default)]
pub struct DirtyTracker {
    documents: DashMap<PathBuf, Document>,
    repo: Option<Arc<dyn IRepository>>,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages every saved path through `repo`
    pub fn with_repository(repo: Arc<dyn IRepository>) -> Self {
        Self {
            documents: DashMap::new(),
            repo: Some(repo),
        }
    }

    /// Records freshly loaded content as the clean baseline
    pub fn open(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        let content = content.into();
        self.documents.insert(
            path.into(),
            Document {
                baseline: content.clone(),
                current: content,
            },
        );
    }

    /// Replaces the in-memory content and returns whether the document is now dirty
    pub fn edit(&self, path: &Path, content: impl Into<String>) -> Result<bool, SyncError> {
        let mut doc = self
            .documents
            .get_mut(path)
            .ok_or_else(|| SyncError::NotOpen(path.to_path_buf()))?;
        doc.current = content.into();
        Ok(doc.is_dirty())
    }

    pub fn is_dirty(&self, path: &Path) -> bool {
        self.documents.get(path).is_some_and(|doc| doc.is_dirty())
    }

    /// Current content of an open document
    pub fn content(&self, path: &Path) -> Option<String> {
        self.documents.get(path).map(|doc| doc.current.clone())
    }

    /// The set of paths with unsaved edits
    pub fn dirty_paths(&self) -> BTreeSet<PathBuf> {
        self.documents
            .iter()
            .filter(|entry| entry.value().is_dirty())
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Forgets a document, returning whether it had unsaved edits
    pub fn close(&self, path: &Path) -> bool {
        self.documents
            .remove(path)
            .is_some_and(|(_, doc)| doc.is_dirty())
    }

    /// Writes a dirty document to disk
    ///
    /// Returns `Ok(false)` without touching the disk when the document is
    /// clean. After a successful write the baseline becomes the written
    /// content, so edits made while the write was in flight stay dirty. The
    /// path is then staged when a repository is attached; a staging failure
    /// is logged and does not affect dirtiness.
    pub async fn save(&self, path: &Path) -> Result<bool, SyncError> {
        let content = {
            let doc = self
                .documents
                .get(path)
                .ok_or_else(|| SyncError::NotOpen(path.to_path_buf()))?;
            if !doc.is_dirty() {
                return Ok(false);
            }
            doc.current.clone()
        };

        write_atomic(path, &content).await?;
        debug!(path = %path.display(), bytes = content.len(), "Document written");

        if let Some(mut doc) = self.documents.get_mut(path) {
            doc.baseline = content;
        }

        if let Some(repo) = &self.repo {
            if let Err(e) = repo.stage(path).await {
                warn!(path = %path.display(), error = %e, "Failed to stage saved document");
            }
        }
        Ok(true)
    }

    /// Saves `path` in the background and returns immediately
    ///
    /// Used when the editor navigates away from a document; navigation never
    /// waits on the write.
    pub fn switch_away(self: &Arc<Self>, path: &Path) -> JoinHandle<Result<bool, SyncError>> {
        let tracker = Arc::clone(self);
        let path = path.to_path_buf();
        tokio::spawn(async move {
            let result = tracker.save(&path).await;
            match &result {
                Ok(true) => info!(path = %path.display(), "Saved document on switch"),
                Ok(false) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Background save failed"),
            }
            result
        })
    }
}

/// Writes through a sibling temp file and renames it over `path`
async fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{}.mdnote-tmp", name));

    if let Err(e) = tokio::fs::write(&tmp, content).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e);
    }
    tokio::fs::rename(&tmp, path).await
}
