//! Per-run extraction options

use serde::{Deserialize, Serialize};

/// Default width (hex characters) of a content identifier
pub const DEFAULT_CONTENT_ID_WIDTH: usize = 16;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractOptions {
    /// Whether whole-document links (no anchor) are extracted
    pub include_whole_files: bool,
    /// Width of the truncated content hash used as a block key
    pub content_id_width: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions {
            include_whole_files: false,
            content_id_width: DEFAULT_CONTENT_ID_WIDTH,
        }
    }
}
