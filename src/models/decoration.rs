use serde::Serialize;

use super::config::{MARKED_FILE_COLOR, MARKED_FILE_TOOLTIP, MarkFilesConfig};

/// Visual annotation the host renders for a path.
///
/// The default value is the empty decoration (nothing rendered).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FileDecoration {
    /// Parent folders inherit the indicator
    pub propagate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl FileDecoration {
    /// Decoration for a marked file under the given display settings
    pub fn marked(config: &MarkFilesConfig) -> Self {
        Self {
            propagate: true,
            badge: config
                .display_mode
                .shows_icon()
                .then(|| config.marked_file_icon.clone()),
            tooltip: Some(MARKED_FILE_TOOLTIP.to_string()),
            color: config
                .display_mode
                .shows_color()
                .then(|| MARKED_FILE_COLOR.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
