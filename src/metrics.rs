// Engine metrics
//
// Lightweight counters for what the engine did during a session

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Session counters
///
/// Uses atomic operations so the state manager, the write-behind queue and
/// command handlers can record without locks. Logged once at shutdown.
#[derive(Debug)]
pub struct Metrics {
    /// Files added to the marked set
    pub files_marked: AtomicU64,

    /// Files removed from the marked set
    pub files_unmarked: AtomicU64,

    /// Marked files migrated by rename notifications
    pub files_renamed: AtomicU64,

    /// Change notifications delivered to at least one subscriber
    pub notifications_sent: AtomicU64,

    /// Change notifications with nobody listening
    pub notifications_dropped: AtomicU64,

    /// Successful workspace store writes
    pub persist_writes: AtomicU64,

    /// Failed workspace store writes
    pub persist_failures: AtomicU64,

    /// Scope files read and compiled
    pub scope_files_loaded: AtomicU64,

    /// Scope files that existed but could not be read
    pub scope_read_failures: AtomicU64,

    /// Scope files written by export
    pub scope_files_written: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            files_marked: AtomicU64::new(0),
            files_unmarked: AtomicU64::new(0),
            files_renamed: AtomicU64::new(0),
            notifications_sent: AtomicU64::new(0),
            notifications_dropped: AtomicU64::new(0),
            persist_writes: AtomicU64::new(0),
            persist_failures: AtomicU64::new(0),
            scope_files_loaded: AtomicU64::new(0),
            scope_read_failures: AtomicU64::new(0),
            scope_files_written: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_marked(&self) {
        self.files_marked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unmarked(&self) {
        self.files_unmarked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_renamed(&self) {
        self.files_renamed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_notification(&self, delivered: bool) {
        if delivered {
            self.notifications_sent.fetch_add(1, Ordering::Relaxed);
        } else {
            self.notifications_dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_persist_write(&self) {
        self.persist_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persist_failure(&self) {
        self.persist_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scope_loaded(&self) {
        self.scope_files_loaded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scope_read_failure(&self) {
        self.scope_read_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scope_written(&self) {
        self.scope_files_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Session Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Files: {} marked, {} unmarked, {} renamed",
            self.files_marked.load(Ordering::Relaxed),
            self.files_unmarked.load(Ordering::Relaxed),
            self.files_renamed.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Notifications: {} sent, {} without subscribers",
            self.notifications_sent.load(Ordering::Relaxed),
            self.notifications_dropped.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Workspace store: {} writes, {} failures",
            self.persist_writes.load(Ordering::Relaxed),
            self.persist_failures.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Scope files: {} loaded, {} unreadable, {} written",
            self.scope_files_loaded.load(Ordering::Relaxed),
            self.scope_read_failures.load(Ordering::Relaxed),
            self.scope_files_written.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
