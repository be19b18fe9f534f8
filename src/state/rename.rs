//! Carrying marks across file and folder renames.

use camino::{Utf8Path, Utf8PathBuf};

use super::{MarkChange, MarkStateManager};
use crate::models::normalize_path;

impl MarkStateManager {
    /// Migrate membership from `old` to `new` after the host renamed a path.
    ///
    /// - `old` marked: it is replaced by `new`, one [`MarkChange::Renamed`]
    ///   fires (for `new`).
    /// - `old` is a folder: every marked file beneath it moves to the same
    ///   relative location beneath `new`, one event per moved file.
    /// - otherwise nothing happens.
    ///
    /// The whole migration happens under one write lock, so no observer sees
    /// both paths marked or neither.
    pub fn handle_rename(&self, old: &Utf8Path, new: &Utf8Path) -> Vec<MarkChange> {
        let old = normalize_path(old);
        let new = normalize_path(new);
        if old == new {
            return Vec::new();
        }

        let mut state = self.write();

        let moves: Vec<(Utf8PathBuf, Utf8PathBuf)> = state
            .marked
            .iter()
            .filter_map(|path| {
                if *path == old {
                    Some((path.clone(), new.clone()))
                } else {
                    let rest = path.strip_prefix(&old).ok()?;
                    Some((path.clone(), new.join(rest)))
                }
            })
            .collect();

        let mut changes = Vec::with_capacity(moves.len());
        for (from, to) in moves {
            state.marked.shift_remove(&from);
            self.persist.delete(&from);
            state.marked.insert(to.clone());
            self.persist.set(&to);
            self.metrics.record_renamed();

            let change = MarkChange::Renamed { from, to };
            self.emit(change.clone());
            changes.push(change);
        }

        if !changes.is_empty() {
            tracing::debug!("Moved {} mark(s) from {} to {}", changes.len(), old, new);
        }
        changes
    }

    /// Apply a batch of renames delivered together, in order
    pub fn handle_renames<I, P>(&self, renames: I) -> Vec<MarkChange>
    where
        I: IntoIterator<Item = (P, P)>,
        P: AsRef<Utf8Path>,
    {
        renames
            .into_iter()
            .flat_map(|(old, new)| self.handle_rename(old.as_ref(), new.as_ref()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Metrics;
    use crate::models::MarkFilesConfig;
    use crate::services::persistence::{MemoryStore, PersistenceAdapter};
    use crate::state::PersistQueue;
    use std::sync::Arc;

    fn manager() -> MarkStateManager {
        MarkStateManager::new(
            PersistQueue::disabled(),
            MarkFilesConfig::default(),
            Arc::new(Metrics::new()),
        )
    }

    #[test]
    fn test_rename_marked_file_fires_once_for_new_path() {
        let manager = manager();
        manager.mark(Utf8Path::new("/proj/p.ts"));
        let mut rx = manager.subscribe();

        let changes = manager.handle_rename(Utf8Path::new("/proj/p.ts"), Utf8Path::new("/proj/q.ts"));

        assert_eq!(changes.len(), 1);
        assert!(!manager.is_marked(Utf8Path::new("/proj/p.ts")));
        assert!(manager.is_marked(Utf8Path::new("/proj/q.ts")));

        let event = rx.try_recv().unwrap();
        assert_eq!(event.path(), Utf8Path::new("/proj/q.ts"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_rename_unmarked_is_noop() {
        let manager = manager();
        manager.mark(Utf8Path::new("/proj/other.ts"));
        let mut rx = manager.subscribe();

        let changes = manager.handle_rename(Utf8Path::new("/proj/p.ts"), Utf8Path::new("/proj/q.ts"));

        assert!(changes.is_empty());
        assert!(!manager.is_marked(Utf8Path::new("/proj/q.ts")));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_rename_folder_moves_marked_children() {
        let manager = manager();
        manager.mark(Utf8Path::new("/proj/src/a.ts"));
        manager.mark(Utf8Path::new("/proj/src/deep/b.ts"));
        manager.mark(Utf8Path::new("/proj/srcfile.ts"));

        let changes = manager.handle_rename(Utf8Path::new("/proj/src"), Utf8Path::new("/proj/lib"));

        assert_eq!(changes.len(), 2);
        assert!(manager.is_marked(Utf8Path::new("/proj/lib/a.ts")));
        assert!(manager.is_marked(Utf8Path::new("/proj/lib/deep/b.ts")));
        assert!(!manager.is_marked(Utf8Path::new("/proj/src/a.ts")));
        // Sibling sharing a string prefix is untouched
        assert!(manager.is_marked(Utf8Path::new("/proj/srcfile.ts")));
    }

    #[test]
    fn test_rename_batch() {
        let manager = manager();
        manager.mark(Utf8Path::new("/proj/a.ts"));
        manager.mark(Utf8Path::new("/proj/b.ts"));

        let changes = manager.handle_renames([
            ("/proj/a.ts", "/proj/a2.ts"),
            ("/proj/b.ts", "/proj/b2.ts"),
            ("/proj/c.ts", "/proj/c2.ts"),
        ]);

        assert_eq!(changes.len(), 2);
        assert_eq!(manager.len(), 2);
        assert!(manager.is_marked(Utf8Path::new("/proj/a2.ts")));
        assert!(manager.is_marked(Utf8Path::new("/proj/b2.ts")));
    }

    #[tokio::test]
    async fn test_rename_migrates_persisted_key() {
        let store = Arc::new(MemoryStore::new());
        let metrics = Arc::new(Metrics::new());
        let manager = MarkStateManager::new(
            PersistQueue::spawn(store.clone(), metrics.clone()),
            MarkFilesConfig::default(),
            metrics,
        );

        manager.mark(Utf8Path::new("/proj/p.ts"));
        manager.handle_rename(Utf8Path::new("/proj/p.ts"), Utf8Path::new("/proj/q.ts"));
        manager.persist().flush().await;

        assert_eq!(store.keys().await.unwrap(), vec!["/proj/q.ts"]);
    }
}
