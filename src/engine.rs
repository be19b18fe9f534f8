//! The mark engine: one explicitly constructed instance per workspace.
//!
//! [`MarkEngine`] composes the in-memory [`MarkStateManager`] with the
//! filesystem, workspace store and scope-file services. Host command handlers
//! and the decoration entry point all receive the same instance; there is no
//! process-wide provider.
//!
//! Operations that touch the filesystem resolve paths first and only then
//! mutate state, so every mutation is a short synchronous step between
//! suspension points.

use camino::{Utf8Path, Utf8PathBuf};
use futures::stream::{FuturesUnordered, StreamExt};
use std::io;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

use crate::metrics::Metrics;
use crate::models::{FileDecoration, MarkFilesConfig, Workspace};
use crate::services::export::{ExportCoordinator, ExportReport};
use crate::services::fs::{FileKind, FileSystem};
use crate::services::persistence::PersistenceAdapter;
use crate::services::prompt::Prompter;
use crate::services::reconcile::ScopeReconciler;
use crate::state::{MarkChange, MarkStateManager, PersistQueue};

/// Asked before a reload replaces every mark in the workspace
pub const RELOAD_CONFIRMATION: &str =
    "This operation will clear all marked files. Do you want to continue?";

/// Where the initial marked set came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupLoad {
    /// Restored this many paths from the workspace store
    Store(usize),
    /// Store was empty; the scope files marked this many paths
    Scope(usize),
    Empty,
}

/// Result of [`MarkEngine::reconcile_from_scope`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// No project root is open
    NoProject,
    /// The reload confirmation was declined; nothing changed
    Declined,
    Applied(Vec<MarkChange>),
}

impl ReconcileOutcome {
    pub fn changes(&self) -> &[MarkChange] {
        match self {
            ReconcileOutcome::Applied(changes) => changes,
            _ => &[],
        }
    }
}

pub struct MarkEngine {
    state: MarkStateManager,
    fs: Arc<dyn FileSystem>,
    store: Option<Arc<dyn PersistenceAdapter>>,
    workspace: Workspace,
    metrics: Arc<Metrics>,
}

impl MarkEngine {
    /// Build an engine for `workspace`.
    ///
    /// With a store, a write-behind task is spawned on the current tokio
    /// runtime. Without one, marks last for the session only.
    pub fn new(
        workspace: Workspace,
        fs: Arc<dyn FileSystem>,
        store: Option<Arc<dyn PersistenceAdapter>>,
        config: MarkFilesConfig,
    ) -> Self {
        let metrics = Arc::new(Metrics::new());

        let persist = match &store {
            Some(store) => PersistQueue::spawn(Arc::clone(store), Arc::clone(&metrics)),
            None => {
                tracing::warn!("No workspace store available; marks will not outlive this session");
                PersistQueue::disabled()
            }
        };

        tracing::info!(
            "Mark engine ready for {} project root(s)",
            workspace.roots().len()
        );

        Self {
            state: MarkStateManager::new(persist, config, Arc::clone(&metrics)),
            fs,
            store,
            workspace,
            metrics,
        }
    }

    pub fn state(&self) -> &MarkStateManager {
        &self.state
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn config(&self) -> MarkFilesConfig {
        self.state.config()
    }

    /// Subscribe to changed-path notifications (see [`MarkStateManager::subscribe`])
    pub fn subscribe(&self) -> broadcast::Receiver<MarkChange> {
        self.state.subscribe()
    }

    /// Toggle every candidate path.
    ///
    /// Directories expand to every file beneath them; missing and special
    /// entries are skipped. Lookups run concurrently and are applied in the
    /// order they complete. A failed lookup skips that candidate only.
    pub async fn toggle(&self, paths: &[Utf8PathBuf]) -> Vec<MarkChange> {
        let mut lookups: FuturesUnordered<_> = paths
            .iter()
            .map(|path| async move { (path, self.fs.stat(path).await) })
            .collect();

        let mut changes = Vec::new();
        while let Some((path, kind)) = lookups.next().await {
            match kind {
                Ok(FileKind::File) => changes.push(self.state.toggle_file(path)),
                Ok(FileKind::Directory) => match self.fs.list_files(path).await {
                    Ok(files) => {
                        tracing::debug!("Toggling {} file(s) under {}", files.len(), path);
                        changes.extend(files.iter().map(|file| self.state.toggle_file(file)));
                    }
                    Err(e) => tracing::warn!("Failed to enumerate {}: {}", path, e),
                },
                Ok(FileKind::Other) => {
                    tracing::debug!("Skipping {}: not a regular file or directory", path);
                }
                Err(e) => tracing::debug!("Skipping {}: {}", path, e),
            }
        }

        changes
    }

    /// Populate the marked set once at startup.
    ///
    /// Persisted keys whose file is gone are dropped from the store. The
    /// scope files are consulted only when nothing was restored and the
    /// configuration allows it.
    pub async fn startup_load(&self) -> StartupLoad {
        let restored = self.restore_from_store().await;
        if restored > 0 {
            tracing::info!("Restored {} marked file(s) from workspace store", restored);
            return StartupLoad::Store(restored);
        }

        if !self.config().autoload_from_scope {
            return StartupLoad::Empty;
        }

        let outcome = self.scan_and_toggle().await;
        match outcome.changes().len() {
            0 => StartupLoad::Empty,
            n => {
                tracing::info!("Marked {} file(s) from scope file(s)", n);
                StartupLoad::Scope(n)
            }
        }
    }

    async fn restore_from_store(&self) -> usize {
        let Some(store) = &self.store else {
            return 0;
        };

        let keys = match store.keys().await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::error!("{}", e);
                return 0;
            }
        };

        let mut alive = Vec::with_capacity(keys.len());
        for key in keys {
            let path = Utf8PathBuf::from(key);
            match self.fs.stat(&path).await {
                Ok(FileKind::File) => alive.push(path),
                Ok(FileKind::Directory | FileKind::Other) => {
                    tracing::debug!("Dropping mark for non-file {}", path);
                    self.state.persist().delete(&path);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    tracing::debug!("Dropping stale mark for {}", path);
                    self.state.persist().delete(&path);
                }
                // Unreadable for now (permissions, unmounted drive): keep it
                Err(e) => {
                    tracing::warn!("Could not check marked file {}: {}", path, e);
                    alive.push(path);
                }
            }
        }

        self.state.restore(&alive).len()
    }

    /// Evaluate every root's scope file against the workspace tree.
    ///
    /// Without `reload`, the matched files are toggled, so files already
    /// marked flip off. With `reload`, `prompter` must confirm first; the
    /// tree is then scanned and the marked set is replaced by the matches in
    /// one step. Toggles that land while the prompt is open are superseded
    /// by the scan.
    pub async fn reconcile_from_scope(
        &self,
        reload: bool,
        prompter: &dyn Prompter,
    ) -> ReconcileOutcome {
        if self.workspace.is_empty() {
            tracing::info!("No opened project - nothing to load");
            return ReconcileOutcome::NoProject;
        }

        if !reload {
            return self.scan_and_toggle().await;
        }

        if !prompter.confirm(RELOAD_CONFIRMATION).await {
            tracing::info!("Reload from scope file(s) declined");
            return ReconcileOutcome::Declined;
        }

        tracing::info!("Loading marked files from scope file(s)");
        let matched = self.matched_files().await;
        ReconcileOutcome::Applied(self.state.replace_all(&matched))
    }

    async fn scan_and_toggle(&self) -> ReconcileOutcome {
        if self.workspace.is_empty() {
            return ReconcileOutcome::NoProject;
        }
        let matched = self.matched_files().await;
        ReconcileOutcome::Applied(self.toggle(&matched).await)
    }

    async fn matched_files(&self) -> Vec<Utf8PathBuf> {
        let config = self.config();
        ScopeReconciler::new(self.fs.as_ref(), &self.workspace, &self.metrics)
            .matched_files(&config.scope_file_name, &config.scope_file_extension)
            .await
    }

    /// Re-notify every marked path after display settings changed
    pub fn config_changed(&self) -> Vec<MarkChange> {
        self.state.refresh_all()
    }

    pub fn apply_config(&self, config: MarkFilesConfig) -> Vec<MarkChange> {
        self.state.set_config(config);
        self.config_changed()
    }

    pub fn handle_rename(&self, old: &Utf8Path, new: &Utf8Path) -> Vec<MarkChange> {
        self.state.handle_rename(old, new)
    }

    pub fn handle_renames<I, P>(&self, renames: I) -> Vec<MarkChange>
    where
        I: IntoIterator<Item = (P, P)>,
        P: AsRef<Utf8Path>,
    {
        self.state.handle_renames(renames)
    }

    /// Write the marked set out as one scope file per project root
    ///
    /// The configured scope file name is offered as the default.
    pub async fn export_marked(&self, prompter: &dyn Prompter) -> Option<ExportReport> {
        let config = self.config();
        let marked = self.state.marked_files();

        ExportCoordinator::new(self.fs.as_ref(), &self.workspace, prompter, &self.metrics)
            .export(
                &marked,
                &config.scope_file_name,
                &config.scope_file_extension,
            )
            .await
    }

    pub fn decoration(&self, path: &Utf8Path, cancel: &watch::Receiver<bool>) -> FileDecoration {
        self.state.decoration(path, cancel)
    }

    /// Wait for every scheduled workspace store write to land
    pub async fn flush(&self) {
        self.state.persist().flush().await;
    }
}
