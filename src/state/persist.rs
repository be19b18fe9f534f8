// Write-behind queue to the workspace store
//
// Mutations enqueue and return immediately; a single background task applies
// the writes in order, so a set followed by a delete for the same key can never
// land reversed.

use camino::Utf8Path;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use crate::metrics::Metrics;
use crate::services::persistence::PersistenceAdapter;

#[derive(Debug)]
enum PersistOp {
    Set(String),
    Delete(String),
    Flush(oneshot::Sender<()>),
}

/// Fire-and-forget handle to the store writer task.
///
/// Cloning shares the same writer. A disabled queue (no store) drops every
/// write, which keeps marks session-only.
#[derive(Debug, Clone)]
pub struct PersistQueue {
    tx: Option<mpsc::UnboundedSender<PersistOp>>,
}

impl PersistQueue {
    /// Spawn the writer task on the current tokio runtime
    pub fn spawn(store: Arc<dyn PersistenceAdapter>, metrics: Arc<Metrics>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<PersistOp>();

        tokio::spawn(async move {
            tracing::debug!("Workspace store writer started");

            while let Some(op) = rx.recv().await {
                let (key, result) = match op {
                    PersistOp::Set(key) => {
                        let result = store.set(&key).await;
                        (key, result)
                    }
                    PersistOp::Delete(key) => {
                        let result = store.delete(&key).await;
                        (key, result)
                    }
                    PersistOp::Flush(done) => {
                        let _ = done.send(());
                        continue;
                    }
                };

                match result {
                    Ok(()) => metrics.record_persist_write(),
                    Err(e) => {
                        // In-memory state stays authoritative; the store lags for this key
                        tracing::error!("Failed to persist mark state for {}: {}", key, e);
                        metrics.record_persist_failure();
                    }
                }
            }

            tracing::debug!("Workspace store writer stopped");
        });

        Self { tx: Some(tx) }
    }

    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    pub fn set(&self, path: &Utf8Path) {
        self.send(PersistOp::Set(path.to_string()));
    }

    pub fn delete(&self, path: &Utf8Path) {
        self.send(PersistOp::Delete(path.to_string()));
    }

    /// Wait until every write enqueued before this call has been applied
    pub async fn flush(&self) {
        let Some(tx) = &self.tx else {
            return;
        };
        let (done_tx, done_rx) = oneshot::channel();
        if tx.send(PersistOp::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }

    fn send(&self, op: PersistOp) {
        if let Some(tx) = &self.tx {
            if tx.send(op).is_err() {
                tracing::warn!("Workspace store writer is gone; dropping write");
            }
        }
    }
}
