//! Working-directory watcher and debounced change queue
//!
//! [`FileWatcher`] wraps the `notify` crate and turns raw OS events under the
//! note vault into [`ChangeEvent`] values. Anything inside the `.git`
//! directory is dropped at the source, otherwise every commit the
//! orchestrator makes would look like a user edit.
//!
//! [`DebouncedChangeQueue`] coalesces bursts of events per path so that a
//! consumer only hears about a path once it has been quiet for the debounce
//! window.
//!
//! ```text
//! inotify ──▶ FileWatcher ──▶ mpsc ──▶ DebouncedChangeQueue ──▶ AutoSyncScheduler
//! ```

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::SyncError;

/// Capacity of the event channel between the notify thread and the scheduler
const EVENT_CHANNEL_CAPACITY: usize = 1024;

// ============================================================================
// ChangeEvent
// ============================================================================

/// A filesystem change inside the working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    Created(PathBuf),
    Modified(PathBuf),
    Deleted(PathBuf),
    Renamed { old: PathBuf, new: PathBuf },
}

impl ChangeEvent {
    /// Primary path of the event; the destination for renames
    pub fn path(&self) -> &Path {
        match self {
            ChangeEvent::Created(p) | ChangeEvent::Modified(p) | ChangeEvent::Deleted(p) => p,
            ChangeEvent::Renamed { new, .. } => new,
        }
    }
}

/// True for paths inside version-control metadata
pub fn is_ignored(path: &Path) -> bool {
    path.components()
        .any(|c| matches!(c, Component::Normal(name) if name == ".git"))
}

// ============================================================================
// FileWatcher
// ============================================================================

/// Recursive watcher over a note vault
///
/// ```ignore
/// let (mut watcher, rx) = FileWatcher::new()?;
/// watcher.watch(Path::new("/home/me/notes"))?;
/// ```
///
/// Dropping the watcher stops all watches and closes the channel.
pub struct FileWatcher {
    watcher: RecommendedWatcher,
    watched: Option<PathBuf>,
}

impl FileWatcher {
    /// Creates the OS watcher and the receiving end of its event channel
    pub fn new() -> Result<(Self, mpsc::Receiver<ChangeEvent>), SyncError> {
        let (tx, rx) = mpsc::channel::<ChangeEvent>(EVENT_CHANNEL_CAPACITY);

        let watcher = RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    if let Some(change) = map_notify_event(&event) {
                        if let Err(e) = tx.blocking_send(change) {
                            warn!(error = %e, "Dropping change event, receiver is gone");
                        }
                    }
                }
                Err(err) => error!(error = %err, "File watcher error"),
            },
            notify::Config::default(),
        )?;

        Ok((
            Self {
                watcher,
                watched: None,
            },
            rx,
        ))
    }

    /// Watches `path` recursively, replacing any previous watch
    pub fn watch(&mut self, path: &Path) -> Result<(), SyncError> {
        if self.watched.as_deref() == Some(path) {
            return Ok(());
        }
        self.unwatch()?;

        info!(path = %path.display(), "Watching working directory");
        self.watcher.watch(path, RecursiveMode::Recursive)?;
        self.watched = Some(path.to_path_buf());
        Ok(())
    }

    /// Stops the current watch, if any
    pub fn unwatch(&mut self) -> Result<(), SyncError> {
        if let Some(previous) = self.watched.take() {
            debug!(path = %previous.display(), "Stopping watch");
            self.watcher.unwatch(&previous)?;
        }
        Ok(())
    }

    pub fn watched(&self) -> Option<&Path> {
        self.watched.as_deref()
    }
}

// ============================================================================
// Event mapping
// ============================================================================

/// Converts a `notify::Event` into a [`ChangeEvent`]
///
/// Access events, events without paths and events under `.git/` map to
/// `None`. A rename reported with a single path is treated as a modification.
fn map_notify_event(event: &notify::Event) -> Option<ChangeEvent> {
    let path = event.paths.first()?;
    if is_ignored(path) {
        return None;
    }

    let change = match &event.kind {
        EventKind::Create(_) => ChangeEvent::Created(path.clone()),
        EventKind::Remove(_) => ChangeEvent::Deleted(path.clone()),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => match event.paths.get(1) {
            Some(new) if !is_ignored(new) => ChangeEvent::Renamed {
                old: path.clone(),
                new: new.clone(),
            },
            Some(_) => ChangeEvent::Deleted(path.clone()),
            None => ChangeEvent::Modified(path.clone()),
        },
        EventKind::Modify(_) => ChangeEvent::Modified(path.clone()),
        _ => return None,
    };
    Some(change)
}

// ============================================================================
// DebouncedChangeQueue
// ============================================================================

/// Per-path coalescing queue
///
/// A newer event for a path replaces the older one and restarts that path's
/// quiet period. Uses the tokio clock so paused-time tests drive it.
pub struct DebouncedChangeQueue {
    pending: HashMap<PathBuf, (ChangeEvent, Instant)>,
    debounce_delay: Duration,
}

impl DebouncedChangeQueue {
    pub fn new(debounce_delay: Duration) -> Self {
        Self {
            pending: HashMap::new(),
            debounce_delay,
        }
    }

    pub fn push(&mut self, event: ChangeEvent) {
        let path = event.path().to_path_buf();
        self.pending.insert(path, (event, Instant::now()));
    }

    /// Removes and returns every event that has been quiet long enough
    pub fn poll(&mut self) -> Vec<ChangeEvent> {
        let now = Instant::now();
        let delay = self.debounce_delay;

        let settled_paths: Vec<PathBuf> = self
            .pending
            .iter()
            .filter(|(_, (_, at))| now.duration_since(*at) >= delay)
            .map(|(path, _)| path.clone())
            .collect();

        let settled: Vec<ChangeEvent> = settled_paths
            .iter()
            .filter_map(|path| self.pending.remove(path))
            .map(|(event, _)| event)
            .collect();

        if !settled.is_empty() {
            debug!(count = settled.len(), "Changes settled");
        }
        settled
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
