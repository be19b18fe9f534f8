//! Data models for markfiles.
//!
//! - [`MarkFilesConfig`]: display and scope-file settings loaded from `config.yaml`
//! - [`FileDecoration`]: the annotation handed to the host for a marked path
//! - [`Workspace`] / [`ProjectRoot`]: the open project roots, longest-prefix
//!   ownership and scope-file locations
//!
//! The marked set itself is owned by [`MarkStateManager`](crate::state::MarkStateManager).

pub mod config;
pub mod decoration;
pub mod workspace;

pub use config::{DisplayMode, MARKED_FILE_COLOR, MARKED_FILE_TOOLTIP, MarkFilesConfig};
pub use decoration::FileDecoration;
pub use workspace::{ProjectRoot, Workspace, normalize_path, to_slash};
