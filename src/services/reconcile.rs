//! Scope file evaluation.
//!
//! For each project root with a scope file, the file's lines are compiled as
//! gitignore patterns and matched against every workspace file owned by that
//! root. The result is the list of absolute paths the scope files select.

use camino::Utf8PathBuf;
use indexmap::{IndexMap, IndexSet};

use super::fs::FileSystem;
use super::pattern::PatternMatcher;
use super::scope_file::read_patterns;
use crate::metrics::Metrics;
use crate::models::{ProjectRoot, Workspace, to_slash};

/// Resolves scope files against the workspace tree.
pub struct ScopeReconciler<'a> {
    fs: &'a dyn FileSystem,
    workspace: &'a Workspace,
    metrics: &'a Metrics,
}

impl<'a> ScopeReconciler<'a> {
    pub fn new(fs: &'a dyn FileSystem, workspace: &'a Workspace, metrics: &'a Metrics) -> Self {
        Self {
            fs,
            workspace,
            metrics,
        }
    }

    /// Compile the scope file `<base>.<extension>` of every root that has one
    ///
    /// Missing files are skipped quietly; unreadable files are logged and
    /// skipped without affecting other roots.
    pub async fn load_matchers(
        &self,
        base: &str,
        extension: &str,
    ) -> IndexMap<ProjectRoot, PatternMatcher> {
        let mut matchers = IndexMap::new();

        for (root, scope_path) in self.workspace.scope_files(base, extension) {
            match read_patterns(self.fs, &scope_path).await {
                Ok(Some(patterns)) => {
                    tracing::info!("Loaded patterns from {}", scope_path);
                    self.metrics.record_scope_loaded();
                    let matcher = PatternMatcher::compile(&patterns);
                    if !matcher.rejected().is_empty() {
                        tracing::warn!(
                            "Skipped {} invalid line(s) in {}: {:?}",
                            matcher.rejected().len(),
                            scope_path,
                            matcher.rejected()
                        );
                    }
                    matchers.insert(root, matcher);
                }
                Ok(None) => {
                    tracing::debug!("No scope file at {}", scope_path);
                }
                Err(e) => {
                    tracing::warn!("{}; skipping {}", e, root.path());
                    self.metrics.record_scope_read_failure();
                }
            }
        }

        matchers
    }

    /// Absolute paths of every workspace file selected by a scope file
    ///
    /// Each file is matched only against the scope file of the root that owns
    /// it (longest prefix). Returns nothing without enumerating the tree when
    /// no root has a scope file.
    pub async fn matched_files(&self, base: &str, extension: &str) -> Vec<Utf8PathBuf> {
        if self.workspace.is_empty() {
            return Vec::new();
        }

        let matchers = self.load_matchers(base, extension).await;
        if matchers.is_empty() {
            return Vec::new();
        }

        let files = self.workspace_files().await;
        let mut matched = Vec::new();

        for file in files {
            let Some(root) = self.workspace.owning_root(&file) else {
                continue;
            };
            let Some(matcher) = matchers.get(root) else {
                continue;
            };
            let Some(relative) = root.relative(&file) else {
                continue;
            };
            if matcher.matches(&to_slash(&relative)) {
                matched.push(file);
            }
        }

        tracing::debug!("Scope files selected {} file(s)", matched.len());
        matched
    }

    /// Every file under every root, deduplicated, sorted
    async fn workspace_files(&self) -> Vec<Utf8PathBuf> {
        let mut files = IndexSet::new();

        for root in self.workspace.roots() {
            match self.fs.list_files(root.path()).await {
                Ok(listed) => files.extend(listed),
                Err(e) => tracing::warn!("Failed to enumerate files under {}: {}", root.path(), e),
            }
        }

        let mut files: Vec<Utf8PathBuf> = files.into_iter().collect();
        files.sort();
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fs::LocalFileSystem;
    use std::fs;
    use tempfile::TempDir;

    fn tree(files: &[&str]) -> (TempDir, Utf8PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        for file in files {
            let path = root.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "").unwrap();
        }
        (temp_dir, root)
    }

    #[tokio::test]
    async fn test_matches_literal_paths() {
        let (_temp_dir, root) = tree(&["src/a.ts", "src/b.ts", "src/c.ts"]);
        fs::write(root.join("scope.txt"), "src/a.ts\nsrc/b.ts").unwrap();

        let workspace = Workspace::new([&root]);
        let metrics = Metrics::new();
        let disk = LocalFileSystem::new();
        let matched = ScopeReconciler::new(&disk, &workspace, &metrics)
            .matched_files("scope", "txt")
            .await;

        assert_eq!(matched, vec![root.join("src/a.ts"), root.join("src/b.ts")]);
    }

    #[tokio::test]
    async fn test_invalid_line_is_reported_and_rest_applies() {
        let (_temp_dir, root) = tree(&["a.rs", "b.md"]);
        fs::write(root.join("scope.txt"), "a[.rs\n*.md").unwrap();

        let workspace = Workspace::new([&root]);
        let metrics = Metrics::new();
        let disk = LocalFileSystem::new();
        let reconciler = ScopeReconciler::new(&disk, &workspace, &metrics);

        let matchers = reconciler.load_matchers("scope", "txt").await;
        let matcher = &matchers[0];
        assert_eq!(matcher.rejected(), ["a[.rs".to_string()]);

        let matched = reconciler.matched_files("scope", "txt").await;
        assert_eq!(matched, vec![root.join("b.md")]);
    }

    #[tokio::test]
    async fn test_each_root_uses_its_own_scope_file() {
        let (_temp_dir, base) = tree(&["one/a.rs", "one/b.md", "two/a.rs", "two/b.md"]);
        fs::write(base.join("one/scope.txt"), "*.rs").unwrap();
        fs::write(base.join("two/scope.txt"), "*.md").unwrap();

        let workspace = Workspace::new([base.join("one"), base.join("two")]);
        let metrics = Metrics::new();
        let disk = LocalFileSystem::new();
        let matched = ScopeReconciler::new(&disk, &workspace, &metrics)
            .matched_files("scope", "txt")
            .await;

        assert_eq!(matched, vec![base.join("one/a.rs"), base.join("two/b.md")]);
    }

    #[tokio::test]
    async fn test_missing_scope_file_selects_nothing() {
        let (_temp_dir, root) = tree(&["a.rs"]);

        let workspace = Workspace::new([&root]);
        let metrics = Metrics::new();
        let disk = LocalFileSystem::new();
        let reconciler = ScopeReconciler::new(&disk, &workspace, &metrics);

        assert!(reconciler.load_matchers("scope", "txt").await.is_empty());
        assert!(reconciler.matched_files("scope", "txt").await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_workspace_selects_nothing() {
        let workspace = Workspace::default();
        let metrics = Metrics::new();
        let disk = LocalFileSystem::new();

        let matched = ScopeReconciler::new(&disk, &workspace, &metrics)
            .matched_files("scope", "txt")
            .await;
        assert!(matched.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_scope_file_skips_only_that_root() {
        let (_temp_dir, base) = tree(&["one/a.rs", "two/a.rs"]);
        // A directory where the scope file should be cannot be read as text
        fs::create_dir_all(base.join("one/scope.txt")).unwrap();
        fs::write(base.join("two/scope.txt"), "*.rs").unwrap();

        let workspace = Workspace::new([base.join("one"), base.join("two")]);
        let metrics = Metrics::new();
        let disk = LocalFileSystem::new();
        let matched = ScopeReconciler::new(&disk, &workspace, &metrics)
            .matched_files("scope", "txt")
            .await;

        assert_eq!(matched, vec![base.join("two/a.rs")]);
        assert_eq!(metrics.scope_read_failures.load(std::sync::atomic::Ordering::Relaxed), 1);
    }
}
