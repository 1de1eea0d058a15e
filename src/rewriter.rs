// src/rewriter.rs
//! Replaces placeholder tokens with page numbers on the rendered TOC pages.
//!
//! Placeholder boxes are found again on the document being edited rather than
//! reused from the scan. For every occurrence the rewriter
//!
//! 1. covers the token with a patch in the TOC background color,
//! 2. estimates the font size of the TOC line,
//! 3. draws the number right-aligned in a box widened around the token,
//! 4. falls back to unbounded text ending just left of the token's right edge
//!    when the number does not fit.
//!
//! Placeholder glyphs drawn by page-level content are also removed from their
//! text operation. Annotations are never touched, so TOC links keep working.

use crate::config::TocConfig;
use crate::error::TocError;
use folio_pdf_composer::{
    OverlayBuilder, PageFrame, add_standard_font, ensure_font_resource, overlay_content, retire_glyph_runs,
};
use folio_text_layer::{PageLayer, SearchHit, TextView, metrics, page_ids};
use folio_types::{Color, GlyphRun, PlaceholderToken, Rect, ReplacementMap};
use log::{debug, info, warn};
use lopdf::{Document, ObjectId};
use serde::Serialize;
use std::fs;
use std::path::Path;

pub const COVER_PAD_X: f32 = 0.5;
pub const COVER_PAD_Y: f32 = 0.2;
/// Spans whose top edge is this close to the placeholder's share its line.
pub const SPAN_TOP_TOLERANCE: f32 = 2.0;
pub const FONT_SIZE_MIN: f32 = 6.5;
pub const FONT_SIZE_MAX: f32 = 11.0;
pub const FALLBACK_SIZE_RATIO: f32 = 0.9;
pub const FALLBACK_SIZE_MAX: f32 = 10.0;
pub const DRAW_PAD_LEFT: f32 = 6.0;
pub const DRAW_PAD_RIGHT: f32 = 36.0;
pub const DRAW_PAD_Y: f32 = 0.8;
pub const OVERFLOW_RIGHT_INSET: f32 = 1.5;
pub const OVERFLOW_BASELINE_LIFT: f32 = 0.6;
pub const DEBUG_OUTLINE_WIDTH: f32 = 0.3;
/// Stroke color of debug outlines, (0.8, 0.2, 0.2) in unit RGB.
pub const DEBUG_OUTLINE_COLOR: Color = Color { r: 204, g: 51, b: 51 };
/// Page resource name requested for the injected Helvetica.
pub const FONT_RESOURCE_NAME: &str = "FolioHelv";

/// Drawing switches for one rewrite pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewriteOptions {
    pub cover_color: Color,
    pub retire_glyphs: bool,
    pub debug_outlines: bool,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self::from(&TocConfig::default())
    }
}

impl From<&TocConfig> for RewriteOptions {
    fn from(config: &TocConfig) -> Self {
        Self {
            cover_color: config.cover_color,
            retire_glyphs: config.retire_glyphs,
            debug_outlines: config.debug_outlines,
        }
    }
}

/// What a rewrite pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RewriteStats {
    pub pages: usize,
    pub patches: usize,
    pub retired_runs: usize,
    /// Numbers drawn with the overflow fallback.
    pub overflows: usize,
}

/// Median size of the spans on the placeholder's line, clamped to a TOC-friendly range.
pub fn estimate_font_size(layer: &PageLayer, bbox: Rect) -> f32 {
    let sizes: Vec<f32> = layer.spans_near_top(bbox.y0, SPAN_TOP_TOLERANCE).map(|s| s.size).collect();
    font_size_from(&sizes, bbox)
}

/// Font size from the sizes seen on the line, or from the box height when there are none.
pub fn font_size_from(sizes: &[f32], bbox: Rect) -> f32 {
    let mut sorted: Vec<f32> = sizes.iter().copied().filter(|s| s.is_finite()).collect();
    if sorted.is_empty() {
        return (FALLBACK_SIZE_RATIO * bbox.height()).clamp(FONT_SIZE_MIN, FALLBACK_SIZE_MAX);
    }
    sorted.sort_by(f32::total_cmp);
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 { (sorted[mid - 1] + sorted[mid]) / 2.0 } else { sorted[mid] };
    median.clamp(FONT_SIZE_MIN, FONT_SIZE_MAX)
}

/// The box the number is right-aligned in: wider than the token, mostly to the right.
pub fn draw_rect(bbox: Rect) -> Rect {
    Rect::new(
        (bbox.x0 - DRAW_PAD_LEFT).max(0.0),
        bbox.y0 - DRAW_PAD_Y,
        bbox.x1 + DRAW_PAD_RIGHT,
        bbox.y1 + DRAW_PAD_Y,
    )
}

/// Origin and baseline for a number that did not fit its draw rect.
pub fn overflow_origin(bbox: Rect, text: &str, size: f32) -> (f32, f32) {
    let width = metrics::helvetica().text_width(text, size);
    ((bbox.x1 - OVERFLOW_RIGHT_INSET - width).max(0.0), bbox.y1 - OVERFLOW_BASELINE_LIFT)
}

struct Placement<'m> {
    token: &'m PlaceholderToken,
    number: &'m str,
    hit: SearchHit,
}

/// Loads `input`, rewrites it, and returns the serialized result.
pub fn rewrite_file(
    input: &Path,
    map: &ReplacementMap,
    options: RewriteOptions,
) -> Result<(Vec<u8>, RewriteStats), TocError> {
    let bytes = fs::read(input)?;
    let doc = Document::load_mem(&bytes)?;
    rewrite(doc, map, options)
}

/// Rewrites every placeholder in `map` and serializes the whole document.
pub fn rewrite(
    mut doc: Document,
    map: &ReplacementMap,
    options: RewriteOptions,
) -> Result<(Vec<u8>, RewriteStats), TocError> {
    let stats = rewrite_document(&mut doc, map, options)?;
    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok((out, stats))
}

/// Rewrites placeholders in place.
pub fn rewrite_document(
    doc: &mut Document,
    map: &ReplacementMap,
    options: RewriteOptions,
) -> Result<RewriteStats, TocError> {
    let mut stats = RewriteStats::default();
    let mut font_id: Option<ObjectId> = None;

    // Every layer is read before the first edit, so glyph sources match the content as loaded.
    let layers = TextView::new(doc).pages()?;
    for (layer, page_id) in layers.iter().zip(page_ids(doc)) {
        let placements: Vec<Placement> = map
            .iter()
            .flat_map(|(token, number)| {
                layer.search(token.as_str()).into_iter().map(move |hit| Placement { token, number, hit })
            })
            .collect();
        if placements.is_empty() {
            continue;
        }

        let font = *font_id.get_or_insert_with(|| add_standard_font(doc, "Helvetica"));
        rewrite_page(doc, page_id, layer, &placements, font, options, &mut stats)?;
        stats.pages += 1;
    }

    info!(
        "[REWRITE] Drew {} number(s) on {} page(s); retired {} placeholder run(s).",
        stats.patches, stats.pages, stats.retired_runs
    );
    Ok(stats)
}

fn rewrite_page(
    doc: &mut Document,
    page_id: ObjectId,
    layer: &PageLayer,
    placements: &[Placement],
    font_id: ObjectId,
    options: RewriteOptions,
    stats: &mut RewriteStats,
) -> Result<(), TocError> {
    let page_number = layer.page_index + 1;

    // Glyph sources index the content as extracted, so retire before anything is appended.
    if options.retire_glyphs {
        let runs: Vec<GlyphRun> = placements
            .iter()
            .filter_map(|p| match layer.glyph_run(&p.hit) {
                Some(run) if run.is_retirable(p.hit.glyphs.len()) => Some(run),
                _ => {
                    debug!("[REWRITE] {} on page {} is drawn from a form; cover only", p.token, page_number);
                    None
                }
            })
            .collect();
        if !runs.is_empty() {
            retire_glyph_runs(doc, page_id, &runs)?;
            stats.retired_runs += runs.len();
        }
    }

    let font_name = ensure_font_resource(doc, page_id, font_id, FONT_RESOURCE_NAME)?;
    let frame = PageFrame::new(layer.media_box.x0, layer.media_box.y1);
    let mut overlay = OverlayBuilder::new(frame, font_name);

    for placement in placements {
        let bbox = placement.hit.bbox;
        overlay.cover(bbox.expand(COVER_PAD_X, COVER_PAD_Y), options.cover_color);

        let size = estimate_font_size(layer, bbox);
        let rect = draw_rect(bbox);
        if overlay.text_right_aligned(rect, placement.number, size, Color::BLACK) {
            debug!(
                "[REWRITE] {} -> '{}' on page {} at {:.1}pt",
                placement.token, placement.number, page_number, size
            );
        } else {
            let (x, baseline) = overflow_origin(bbox, placement.number, size);
            warn!(
                "[REWRITE] '{}' does not fit the box of {} on page {}; drawing unbounded",
                placement.number, placement.token, page_number
            );
            overlay.text_at(x, baseline, placement.number, size, Color::BLACK);
            stats.overflows += 1;
        }
        if options.debug_outlines {
            overlay.outline(rect, DEBUG_OUTLINE_COLOR, DEBUG_OUTLINE_WIDTH);
        }
        stats.patches += 1;
    }

    overlay_content(doc, page_id, overlay.finish()?)?;
    Ok(())
}
