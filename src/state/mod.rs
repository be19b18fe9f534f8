// Mark state module
//
// This module provides the MarkStateManager which owns the marked set behind
// Arc<RwLock<T>> and emits change events for the host's decoration surface.

pub mod persist;
pub mod rename;

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexSet;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::{broadcast, watch};

use crate::metrics::Metrics;
use crate::models::{FileDecoration, MarkFilesConfig, normalize_path};
pub use persist::PersistQueue;

/// Capacity of the change channel; a slow subscriber that falls further
/// behind sees `RecvError::Lagged` and should re-render everything.
pub const CHANGE_CHANNEL_CAPACITY: usize = 1024;

/// Change events emitted when the visible marking of a path changes
///
/// Every variant names exactly one path the host must re-render, available
/// through [`MarkChange::path`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MarkChange {
    /// A file was added to the marked set
    Marked { path: Utf8PathBuf },

    /// A file was removed from the marked set
    Unmarked { path: Utf8PathBuf },

    /// A marked file moved; only the new path needs rendering
    Renamed { from: Utf8PathBuf, to: Utf8PathBuf },

    /// Membership unchanged, display settings changed
    Refreshed { path: Utf8PathBuf },
}

impl MarkChange {
    /// The path whose decoration changed
    pub fn path(&self) -> &Utf8Path {
        match self {
            MarkChange::Marked { path }
            | MarkChange::Unmarked { path }
            | MarkChange::Refreshed { path } => path,
            MarkChange::Renamed { to, .. } => to,
        }
    }
}

#[derive(Debug, Default)]
struct MarkState {
    marked: IndexSet<Utf8PathBuf>,
}

/// Owner of the marked set with event emission
///
/// The in-memory set is the single source of truth. Every mutation:
/// 1. changes the set under the write lock
/// 2. emits one [`MarkChange`] per affected path
/// 3. schedules the matching workspace store write on the [`PersistQueue`]
///    without waiting for it
///
/// No lock is ever held across an `.await`, so interleaved async operations
/// observe each mutation as a whole.
///
/// # Related Types
///
/// - [`crate::engine::MarkEngine`]: resolves paths on disk before calling in here
/// - [`MarkChange`]: events for the host's decoration surface
pub struct MarkStateManager {
    state: Arc<RwLock<MarkState>>,

    settings: Arc<RwLock<MarkFilesConfig>>,

    /// Broadcast channel for changed-path notifications
    change_tx: broadcast::Sender<MarkChange>,

    persist: PersistQueue,

    metrics: Arc<Metrics>,
}

impl MarkStateManager {
    /// Create an empty manager writing behind to `persist`
    pub fn new(persist: PersistQueue, config: MarkFilesConfig, metrics: Arc<Metrics>) -> Self {
        let (change_tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(RwLock::new(MarkState::default())),
            settings: Arc::new(RwLock::new(config)),
            change_tx,
            persist,
            metrics,
        }
    }

    /// Subscribe to change notifications
    ///
    /// Returns a receiver that gets every change made after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<MarkChange> {
        self.change_tx.subscribe()
    }

    pub fn is_marked(&self, path: &Utf8Path) -> bool {
        self.read().marked.contains(&normalize_path(path))
    }

    /// Snapshot of the marked set, in marking order
    pub fn marked_files(&self) -> Vec<Utf8PathBuf> {
        self.read().marked.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().marked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().marked.is_empty()
    }

    pub fn config(&self) -> MarkFilesConfig {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn persist(&self) -> &PersistQueue {
        &self.persist
    }

    /// Flip one regular file in or out of the marked set
    ///
    /// The caller is responsible for having checked that `path` is a file.
    pub fn toggle_file(&self, path: &Utf8Path) -> MarkChange {
        let path = normalize_path(path);
        let mut state = self.write();

        let change = if state.marked.shift_remove(&path) {
            self.persist.delete(&path);
            self.metrics.record_unmarked();
            MarkChange::Unmarked { path }
        } else {
            state.marked.insert(path.clone());
            self.persist.set(&path);
            self.metrics.record_marked();
            MarkChange::Marked { path }
        };

        self.emit(change.clone());
        change
    }

    /// Add `path` unless already marked
    pub fn mark(&self, path: &Utf8Path) -> Option<MarkChange> {
        let path = normalize_path(path);
        let mut state = self.write();
        if !state.marked.insert(path.clone()) {
            return None;
        }
        self.persist.set(&path);
        self.metrics.record_marked();
        let change = MarkChange::Marked { path };
        self.emit(change.clone());
        Some(change)
    }

    /// Remove `path` if marked
    pub fn unmark(&self, path: &Utf8Path) -> Option<MarkChange> {
        let path = normalize_path(path);
        let mut state = self.write();
        if !state.marked.shift_remove(&path) {
            return None;
        }
        self.persist.delete(&path);
        self.metrics.record_unmarked();
        let change = MarkChange::Unmarked { path };
        self.emit(change.clone());
        Some(change)
    }

    /// Add paths read back from the workspace store
    ///
    /// Emits notifications but schedules no writes: the store already holds
    /// these keys.
    pub fn restore<I, P>(&self, paths: I) -> Vec<MarkChange>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Utf8Path>,
    {
        let mut state = self.write();
        let mut changes = Vec::new();

        for path in paths {
            let path = normalize_path(path.as_ref());
            if state.marked.insert(path.clone()) {
                let change = MarkChange::Marked { path };
                self.emit(change.clone());
                changes.push(change);
            }
        }

        changes
    }

    /// Replace the whole marked set in one step
    ///
    /// Paths leaving the set are unmarked, paths entering it are marked, and
    /// paths in both are left alone (no event, no write). No observer can see
    /// a cleared-but-not-yet-applied set.
    pub fn replace_all<I, P>(&self, paths: I) -> Vec<MarkChange>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Utf8Path>,
    {
        let next: IndexSet<Utf8PathBuf> = paths
            .into_iter()
            .map(|p| normalize_path(p.as_ref()))
            .collect();

        let mut state = self.write();
        let mut changes = Vec::new();

        for path in state.marked.iter().filter(|p| !next.contains(*p)) {
            self.persist.delete(path);
            self.metrics.record_unmarked();
            changes.push(MarkChange::Unmarked { path: path.clone() });
        }
        for path in next.iter().filter(|p| !state.marked.contains(*p)) {
            self.persist.set(path);
            self.metrics.record_marked();
            changes.push(MarkChange::Marked { path: path.clone() });
        }

        state.marked = next;
        for change in &changes {
            self.emit(change.clone());
        }

        changes
    }

    /// Swap in new display settings
    pub fn set_config(&self, config: MarkFilesConfig) {
        *self
            .settings
            .write()
            .unwrap_or_else(PoisonError::into_inner) = config;
    }

    /// Re-emit a notification for every marked path without touching
    /// membership (forces the host to re-render after a display change)
    pub fn refresh_all(&self) -> Vec<MarkChange> {
        let state = self.read();
        let changes: Vec<MarkChange> = state
            .marked
            .iter()
            .map(|path| MarkChange::Refreshed { path: path.clone() })
            .collect();

        for change in &changes {
            self.emit(change.clone());
        }
        changes
    }

    /// Decoration for `path`, consulted by the host's rendering surface
    ///
    /// A request whose cancellation flag is already set gets the empty
    /// decoration. Never mutates state.
    pub fn decoration(&self, path: &Utf8Path, cancel: &watch::Receiver<bool>) -> FileDecoration {
        if *cancel.borrow() {
            return FileDecoration::default();
        }

        if self.is_marked(path) {
            FileDecoration::marked(&self.config())
        } else {
            FileDecoration::default()
        }
    }

    fn emit(&self, change: MarkChange) {
        // Sending fails only when nobody is subscribed
        let delivered = self.change_tx.send(change).is_ok();
        self.metrics.record_notification(delivered);
    }

    fn read(&self) -> RwLockReadGuard<'_, MarkState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MarkState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

// Make MarkStateManager cloneable for sharing across tasks
impl Clone for MarkStateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            settings: Arc::clone(&self.settings),
            change_tx: self.change_tx.clone(),
            persist: self.persist.clone(),
            metrics: Arc::clone(&self.metrics),
        }
    }
}
