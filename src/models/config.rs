use serde::{Deserialize, Serialize};

/// Theme color token handed to the host for marked files.
pub const MARKED_FILE_COLOR: &str = "markfiles.markedFileColor";

/// Tooltip shown on every marked file.
pub const MARKED_FILE_TOOLTIP: &str = "This file is marked";

/// How marked files are highlighted by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Color,
    Icon,
    #[default]
    Both,
    None,
}

impl DisplayMode {
    /// Whether the color token is part of the decoration
    pub fn shows_color(self) -> bool {
        matches!(self, DisplayMode::Color | DisplayMode::Both)
    }

    /// Whether the badge glyph is part of the decoration
    pub fn shows_icon(self) -> bool {
        matches!(self, DisplayMode::Icon | DisplayMode::Both)
    }
}

/// User configuration from `config.yaml` (plus `MARKFILES_*` environment overrides)
///
/// Read-only to the engine. A change is applied through
/// [`MarkEngine::apply_config`](crate::engine::MarkEngine::apply_config).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkFilesConfig {
    #[serde(default)]
    pub display_mode: DisplayMode,

    #[serde(default = "default_marked_file_icon")]
    pub marked_file_icon: String,

    /// Fall back to the scope files at startup when the workspace store is empty
    #[serde(default = "default_autoload_from_scope")]
    pub autoload_from_scope: bool,

    #[serde(default = "default_scope_file_name")]
    pub scope_file_name: String,

    #[serde(default = "default_scope_file_extension")]
    pub scope_file_extension: String,

    #[serde(default)]
    pub debug_mode: bool,
}

impl Default for MarkFilesConfig {
    fn default() -> Self {
        Self {
            display_mode: DisplayMode::default(),
            marked_file_icon: default_marked_file_icon(),
            autoload_from_scope: default_autoload_from_scope(),
            scope_file_name: default_scope_file_name(),
            scope_file_extension: default_scope_file_extension(),
            debug_mode: false,
        }
    }
}

fn default_marked_file_icon() -> String {
    "✓".to_string()
}

fn default_autoload_from_scope() -> bool {
    true
}

fn default_scope_file_name() -> String {
    "scope".to_string()
}

fn default_scope_file_extension() -> String {
    "txt".to_string()
}
