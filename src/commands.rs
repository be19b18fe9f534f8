//! Host command handlers.
//!
//! Each handler corresponds to one command or workspace event the host wires
//! up. They are thin: resolve the host's arguments, call into the shared
//! [`MarkEngine`], and report what changed.

use camino::{Utf8Path, Utf8PathBuf};
use std::sync::Arc;

use crate::engine::{MarkEngine, ReconcileOutcome};
use crate::models::MarkFilesConfig;
use crate::services::export::ExportReport;
use crate::services::prompt::Prompter;
use crate::state::MarkChange;

pub const MARK_UNMARK_ACTIVE_FILE: &str = "markfiles.markUnmarkActiveFile";
pub const MARK_UNMARK_SELECTED_FILE: &str = "markfiles.markUnmarkSelectedFile";
pub const RELOAD_FROM_SCOPE_FILE: &str = "markfiles.reloadFromScopeFile";
pub const WRITE_MARKED_FILES_TO_DISK: &str = "markfiles.writeMarkedFilesToDisk";

/// Configuration section whose changes trigger a re-render
pub const CONFIGURATION_SECTION: &str = "markfiles";

/// Every command id the host should register
pub const COMMANDS: [&str; 4] = [
    MARK_UNMARK_ACTIVE_FILE,
    MARK_UNMARK_SELECTED_FILE,
    RELOAD_FROM_SCOPE_FILE,
    WRITE_MARKED_FILES_TO_DISK,
];

#[derive(Clone)]
pub struct MarkFilesCommands {
    engine: Arc<MarkEngine>,
    prompter: Arc<dyn Prompter>,
}

impl MarkFilesCommands {
    pub fn new(engine: Arc<MarkEngine>, prompter: Arc<dyn Prompter>) -> Self {
        Self { engine, prompter }
    }

    pub fn engine(&self) -> &MarkEngine {
        &self.engine
    }

    /// Toggle the file open in the active editor, if any
    pub async fn mark_unmark_active_file(&self, active: Option<&Utf8Path>) -> Vec<MarkChange> {
        match active {
            Some(path) => self.engine.toggle(&[path.to_path_buf()]).await,
            None => {
                tracing::debug!("No active file to toggle");
                Vec::new()
            }
        }
    }

    /// Toggle the explorer selection
    ///
    /// Hosts that report no multi-selection pass only the clicked entry.
    pub async fn mark_unmark_selected_files(
        &self,
        clicked: Option<&Utf8Path>,
        selected: &[Utf8PathBuf],
    ) -> Vec<MarkChange> {
        if !selected.is_empty() {
            return self.engine.toggle(selected).await;
        }
        self.mark_unmark_active_file(clicked).await
    }

    pub async fn reload_from_scope_file(&self) -> ReconcileOutcome {
        self.engine
            .reconcile_from_scope(true, self.prompter.as_ref())
            .await
    }

    pub async fn write_marked_files_to_disk(&self) -> Option<ExportReport> {
        self.engine.export_marked(self.prompter.as_ref()).await
    }

    /// Apply new settings when any changed section belongs to us
    pub fn on_did_change_configuration(
        &self,
        changed_sections: &[&str],
        config: MarkFilesConfig,
    ) -> Vec<MarkChange> {
        let affected = changed_sections
            .iter()
            .any(|section| section.split('.').next() == Some(CONFIGURATION_SECTION));
        if !affected {
            return Vec::new();
        }
        self.engine.apply_config(config)
    }

    pub fn on_did_rename_files(&self, renames: &[(Utf8PathBuf, Utf8PathBuf)]) -> Vec<MarkChange> {
        if renames.is_empty() {
            return Vec::new();
        }
        self.engine
            .handle_renames(renames.iter().map(|(old, new)| (old.as_path(), new.as_path())))
    }
}
