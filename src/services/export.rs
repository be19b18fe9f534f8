//! Exporting the marked set to per-root scope files.

use camino::Utf8PathBuf;
use indexmap::IndexMap;

use super::fs::FileSystem;
use super::prompt::Prompter;
use super::scope_file::write_marked;
use crate::metrics::Metrics;
use crate::models::{ProjectRoot, Workspace, to_slash};

pub const EXPORT_NAME_PROMPT: &str = "Please enter a name for the exported file";
pub const OVERWRITE_CONFIRMATION: &str =
    "This operation will overwrite the existing scope file. Do you want to continue?";

/// Outcome of one export run, per target file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub written: Vec<Utf8PathBuf>,
    /// Existing files the user chose not to overwrite
    pub declined: Vec<Utf8PathBuf>,
    pub failed: Vec<Utf8PathBuf>,
}

/// Writes marked files, grouped by owning root, to `<name>.<extension>` at each root.
pub struct ExportCoordinator<'a> {
    fs: &'a dyn FileSystem,
    workspace: &'a Workspace,
    prompter: &'a dyn Prompter,
    metrics: &'a Metrics,
}

impl<'a> ExportCoordinator<'a> {
    pub fn new(
        fs: &'a dyn FileSystem,
        workspace: &'a Workspace,
        prompter: &'a dyn Prompter,
        metrics: &'a Metrics,
    ) -> Self {
        Self {
            fs,
            workspace,
            prompter,
            metrics,
        }
    }

    /// Prompt for a file name and write one scope file per root holding marks.
    ///
    /// Returns `None` when the prompt was dismissed, left empty or given a
    /// name with a path separator, or when no project is open. Declining an overwrite skips that root only; roots
    /// are written independently.
    pub async fn export(
        &self,
        marked: &[Utf8PathBuf],
        default_name: &str,
        extension: &str,
    ) -> Option<ExportReport> {
        tracing::info!("Exporting marked files to scope file");

        let name = self.prompter.input(EXPORT_NAME_PROMPT, default_name).await?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        if !is_plain_file_name(name) {
            tracing::warn!("Export name {:?} must be a plain file name - aborting", name);
            return None;
        }

        let targets = self.workspace.scope_files(name, extension);
        if targets.is_empty() {
            tracing::info!("No opened project - aborting");
            return None;
        }

        let groups = self.group_by_root(marked);
        let mut report = ExportReport::default();

        for (root, relative_paths) in groups {
            let Some(target) = targets.get(&root) else {
                continue;
            };

            if self.fs.exists(target).await && !self.prompter.confirm(OVERWRITE_CONFIRMATION).await
            {
                tracing::info!("Keeping existing scope file {}", target);
                report.declined.push(target.clone());
                continue;
            }

            tracing::info!("Exporting marked files to file {}", target);
            match write_marked(self.fs, target, &relative_paths).await {
                Ok(()) => {
                    self.metrics.record_scope_written();
                    report.written.push(target.clone());
                }
                Err(e) => {
                    tracing::error!("{}", e);
                    report.failed.push(target.clone());
                }
            }
        }

        Some(report)
    }

    /// Root-relative, forward-slash paths per owning root, sorted
    ///
    /// Files outside every root are left out.
    pub fn group_by_root(&self, marked: &[Utf8PathBuf]) -> IndexMap<ProjectRoot, Vec<String>> {
        let mut groups: IndexMap<ProjectRoot, Vec<String>> = IndexMap::new();

        for path in marked {
            let Some(root) = self.workspace.owning_root(path) else {
                tracing::debug!("{} is outside every project root; not exported", path);
                continue;
            };
            if let Some(relative) = root.relative(path) {
                groups
                    .entry(root.clone())
                    .or_default()
                    .push(to_slash(&relative));
            }
        }

        for relative_paths in groups.values_mut() {
            relative_paths.sort();
        }
        groups
    }
}

/// A name that stays inside the directory it is joined onto
fn is_plain_file_name(name: &str) -> bool {
    name != "." && name != ".." && !name.contains(['/', '\\'])
}
