// markfiles - mark files in a project as in scope and keep the marking durable
//
// This is the library crate containing the mark engine and its services.
// The binary crate (main.rs) provides a command-line host.

pub mod commands;
pub mod config;
pub mod engine;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use commands::MarkFilesCommands;
pub use config::ConfigManager;
pub use engine::{MarkEngine, ReconcileOutcome, StartupLoad};
pub use metrics::Metrics;
pub use models::{DisplayMode, FileDecoration, MarkFilesConfig, ProjectRoot, Workspace};
pub use state::{MarkChange, MarkStateManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
