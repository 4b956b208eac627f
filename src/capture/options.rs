use serde::{Deserialize, Serialize};

use crate::engine::{FramesData, ProgressHandle};

/// Pixel data of one `<canvas>`, correlated with the source element by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSnapshot {
    #[serde(rename = "dataURI")]
    pub data_uri: String,
    pub width: u32,
    pub height: u32,
}

/// Capture configuration.
///
/// The controller sets the flags; the orchestrator fills in the enrichment
/// fields (`canvas_data`, `frames_data`, `js_enabled`, `on_progress`, `url`,
/// `content`) before handing the options to the engine. Fields the
/// orchestrator does not know about are kept in `extra` and forwarded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CaptureOptions {
    /// Capture only the selected content
    pub selected: bool,
    pub remove_frames: bool,
    pub remove_hidden_elements: bool,
    pub remove_scripts: bool,
    /// Show the in-page capture UI
    pub shadow_enabled: bool,
    pub append_save_date: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub canvas_data: Option<Vec<Option<CanvasSnapshot>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frames_data: Option<FramesData>,
    pub js_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Doctype plus `outerHTML` of the document element
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip)]
    pub on_progress: Option<ProgressHandle>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CaptureOptions {
    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    pub fn with_remove_frames(mut self, remove_frames: bool) -> Self {
        self.remove_frames = remove_frames;
        self
    }

    pub fn with_remove_hidden_elements(mut self, remove: bool) -> Self {
        self.remove_hidden_elements = remove;
        self
    }

    pub fn with_remove_scripts(mut self, remove: bool) -> Self {
        self.remove_scripts = remove;
        self
    }

    pub fn with_shadow_enabled(mut self, enabled: bool) -> Self {
        self.shadow_enabled = enabled;
        self
    }

    pub fn with_append_save_date(mut self, append: bool) -> Self {
        self.append_save_date = append;
        self
    }
}
