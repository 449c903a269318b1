use serde::{Deserialize, Serialize};

use crate::error::PressError;

/// Options recognized by the renderer.
///
/// Deserializes from camelCase JSON; every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    /// Shallowest heading level listed in a TOC.
    #[serde(default = "default_toc_min_depth")]
    pub toc_min_depth: u8,
    /// Deepest heading level listed in a TOC.
    #[serde(default = "default_toc_max_depth")]
    pub toc_max_depth: u8,
    /// Heading texts left out of the TOC. `/.../` entries are regexes.
    #[serde(default)]
    pub toc_exclude: Vec<String>,
    /// First line number when `:line-numbers` has no `=N`.
    #[serde(default = "default_line_number_start")]
    pub line_number_default_start: usize,
    /// Heading of the rendered `[[toc]]` block.
    #[serde(default = "default_toc_title")]
    pub toc_title: String,
    /// Number every code block unless its info string says otherwise.
    #[serde(default)]
    pub line_numbers: bool,
    /// syntect theme used for code coloring.
    #[serde(default = "default_highlight_theme")]
    pub highlight_theme: String,
    /// Append a `#` self-link inside each heading.
    #[serde(default)]
    pub heading_anchors: bool,
}

fn default_toc_min_depth() -> u8 {
    2
}

fn default_toc_max_depth() -> u8 {
    6
}

fn default_line_number_start() -> usize {
    1
}

fn default_toc_title() -> String {
    "Table of Contents".to_string()
}

fn default_highlight_theme() -> String {
    "InspiredGitHub".to_string()
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            toc_min_depth: default_toc_min_depth(),
            toc_max_depth: default_toc_max_depth(),
            toc_exclude: Vec::new(),
            line_number_default_start: default_line_number_start(),
            toc_title: default_toc_title(),
            line_numbers: false,
            highlight_theme: default_highlight_theme(),
            heading_anchors: false,
        }
    }
}

impl RenderOptions {
    /// Parses options from a JSON object.
    pub fn from_json(json: &str) -> Result<Self, PressError> {
        Ok(serde_json::from_str(json)?)
    }

    /// TOC depth bounds clamped to heading levels 1..=6.
    pub fn toc_depth_range(&self) -> (u8, u8) {
        (self.toc_min_depth.clamp(1, 6), self.toc_max_depth.clamp(1, 6))
    }
}
