//! Filesystem capability used by the engine.
//!
//! The engine never touches `std::fs` directly; everything goes through
//! [`FileSystem`] so hosts can substitute their own virtual filesystem.

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use std::io;
use walkdir::WalkDir;

use crate::models::normalize_path;

/// Kind of entry a path resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Directory,
    /// Sockets, devices, fifos and the like
    Other,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Resolve the kind of `path`, following symbolic links
    async fn stat(&self, path: &Utf8Path) -> io::Result<FileKind>;

    async fn read_to_string(&self, path: &Utf8Path) -> io::Result<String>;

    /// Replace the whole file with `contents`
    async fn write(&self, path: &Utf8Path, contents: &str) -> io::Result<()>;

    async fn exists(&self, path: &Utf8Path) -> bool;

    /// Every regular file beneath `root`, recursively
    async fn list_files(&self, root: &Utf8Path) -> io::Result<Vec<Utf8PathBuf>>;
}

/// [`FileSystem`] backed by the local disk.
///
/// Directory walks follow symbolic links; link cycles are detected and
/// skipped. Directories named `.git` and any explicitly excluded directory
/// (typically the workspace state directory) are never entered.
#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    excluded_names: Vec<String>,
    excluded_dirs: Vec<Utf8PathBuf>,
}

impl LocalFileSystem {
    pub fn new() -> Self {
        Self {
            excluded_names: vec![".git".to_string()],
            excluded_dirs: Vec::new(),
        }
    }

    /// Never enumerate files beneath `dir`
    pub fn with_excluded_dir(mut self, dir: impl AsRef<Utf8Path>) -> Self {
        self.excluded_dirs.push(normalize_path(dir.as_ref()));
        self
    }

    fn walk(&self, root: &Utf8Path) -> io::Result<Vec<Utf8PathBuf>> {
        std::fs::metadata(root)?;

        let mut files = Vec::new();
        let walker = WalkDir::new(root).follow_links(true).into_iter();

        for entry in walker.filter_entry(|e| !self.is_excluded(e)) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    if let Some(ancestor) = e.loop_ancestor() {
                        tracing::debug!("Skipping symlink cycle back to {}", ancestor.display());
                    } else {
                        tracing::debug!("Skipping unreadable entry under {}: {}", root, e);
                    }
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            match Utf8PathBuf::from_path_buf(entry.into_path()) {
                Ok(path) => files.push(normalize_path(&path)),
                Err(path) => tracing::debug!("Skipping non UTF-8 path {}", path.display()),
            }
        }

        Ok(files)
    }

    fn is_excluded(&self, entry: &walkdir::DirEntry) -> bool {
        if !entry.file_type().is_dir() || entry.depth() == 0 {
            return false;
        }
        if let Some(name) = entry.file_name().to_str() {
            if self.excluded_names.iter().any(|n| n == name) {
                return true;
            }
        }
        match Utf8Path::from_path(entry.path()) {
            Some(path) => {
                let path = normalize_path(path);
                self.excluded_dirs.iter().any(|dir| *dir == path)
            }
            None => false,
        }
    }
}

impl Default for LocalFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileSystem for LocalFileSystem {
    async fn stat(&self, path: &Utf8Path) -> io::Result<FileKind> {
        let metadata = tokio::fs::metadata(path).await?;
        Ok(if metadata.is_file() {
            FileKind::File
        } else if metadata.is_dir() {
            FileKind::Directory
        } else {
            FileKind::Other
        })
    }

    async fn read_to_string(&self, path: &Utf8Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }

    async fn write(&self, path: &Utf8Path, contents: &str) -> io::Result<()> {
        tokio::fs::write(path, contents).await
    }

    async fn exists(&self, path: &Utf8Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn list_files(&self, root: &Utf8Path) -> io::Result<Vec<Utf8PathBuf>> {
        let fs = self.clone();
        let root = root.to_path_buf();
        tokio::task::spawn_blocking(move || fs.walk(&root))
            .await
            .map_err(io::Error::other)?
    }
}
