//! Back-references from extracted glyphs to the content-stream bytes that drew them.

use serde::{Deserialize, Serialize};

/// Where one extracted glyph lives in a page's decoded content operations.
///
/// Only glyphs drawn directly by page-level content carry a source; glyphs
/// painted from inside a Form XObject cannot be edited in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlyphSource {
    /// Index into the page's decoded operation list.
    pub op_index: usize,
    /// Element index inside a `TJ` array; `None` for `Tj`, `'` and `"`.
    pub element: Option<usize>,
    /// Byte range of the glyph's code within the string operand.
    pub byte_start: usize,
    pub byte_end: usize,
    /// `TJ` adjustment (thousandths of text space) that reproduces the glyph's advance.
    pub compensation: f32,
}

/// The glyphs that make up one placeholder occurrence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlyphRun {
    pub page_index: usize,
    pub sources: Vec<GlyphSource>,
}

impl GlyphRun {
    pub fn new(page_index: usize) -> Self {
        Self { page_index, sources: Vec::new() }
    }

    /// True when every glyph of the run was drawn by editable page content.
    pub fn is_retirable(&self, expected_glyphs: usize) -> bool {
        !self.sources.is_empty() && self.sources.len() == expected_glyphs
    }
}
