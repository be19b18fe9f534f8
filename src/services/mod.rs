//! Services module - capabilities and pure logic behind the mark engine.
//!
//! Nothing in here owns the marked set; these are the collaborators the
//! [`MarkEngine`](crate::engine::MarkEngine) drives.
//!
//! # Components
//!
//! - [`PatternMatcher`]: gitignore-style rule evaluation over root-relative paths
//! - [`scope_file`]: decoding pattern lines and encoding exported paths
//! - [`PersistenceAdapter`]: durable per-workspace key space ([`JsonFileStore`],
//!   [`MemoryStore`])
//! - [`FileSystem`]: stat/read/write/enumerate capability ([`LocalFileSystem`])
//! - [`Prompter`]: confirmation and text input ([`TerminalPrompter`], [`AssumeYes`])
//! - [`ScopeReconciler`]: which workspace files the scope files select
//! - [`ExportCoordinator`]: writing the marked set back out as scope files
//!
//! Capabilities are traits so hosts and tests can substitute their own.

pub mod export;
pub mod fs;
pub mod pattern;
pub mod persistence;
pub mod prompt;
pub mod reconcile;
pub mod scope_file;

pub use export::{EXPORT_NAME_PROMPT, ExportCoordinator, ExportReport, OVERWRITE_CONFIRMATION};
pub use fs::{FileKind, FileSystem, LocalFileSystem};
pub use pattern::PatternMatcher;
pub use persistence::{JsonFileStore, MemoryStore, PersistenceAdapter, StoreError};
pub use prompt::{AssumeYes, Prompter, TerminalPrompter};
pub use reconcile::ScopeReconciler;
pub use scope_file::{ScopeFileError, decode_patterns, encode_marked};
