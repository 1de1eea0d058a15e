// src/extractor.rs
//! Rebuilds TOC rows from placeholder positions and the text to their left.

use crate::error::TocError;
use folio_text_layer::{PageLayer, TextView};
use folio_types::{PlaceholderOccurrence, TocEntry};
use itertools::Itertools;
use log::{debug, info};
use lopdf::Document;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

/// Two boxes whose top edges differ by less than this sit on the same visual line.
pub const LINE_TOLERANCE: f32 = 2.0;
/// Heading queries are cut to this many characters.
pub const MAX_QUERY_CHARS: usize = 80;

static SECTION_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(\.\d+)*$").expect("BUG: invalid SECTION_NUMBER regex literal"));

/// The pages that carry the TOC.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TocPages {
    pub indices: BTreeSet<usize>,
}

impl TocPages {
    pub fn from_occurrences(occurrences: &[PlaceholderOccurrence]) -> Self {
        Self { indices: occurrences.iter().map(|o| o.page_index).collect() }
    }

    /// Highest 0-based TOC page index; `None` when there are no placeholders.
    pub fn max_toc_page(&self) -> Option<usize> {
        self.indices.last().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Extracts TOC entries, reading only the pages that carry placeholders.
pub fn extract(doc: &Document, occurrences: &[PlaceholderOccurrence]) -> Result<Vec<TocEntry>, TocError> {
    let pages = TocPages::from_occurrences(occurrences);
    let view = TextView::new(doc);
    let layers = pages
        .indices
        .iter()
        .map(|&index| view.page(index))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(extract_from_layers(&layers, occurrences))
}

/// Extracts TOC entries from already-extracted pages, in TOC order.
///
/// Occurrences on pages missing from `layers` are skipped.
pub fn extract_from_layers(layers: &[PageLayer], occurrences: &[PlaceholderOccurrence]) -> Vec<TocEntry> {
    let by_page = occurrences.iter().into_group_map_by(|o| o.page_index);
    let by_page: BTreeMap<usize, Vec<&PlaceholderOccurrence>> = by_page.into_iter().collect();

    let mut entries = Vec::new();
    for (page_index, page_occurrences) in by_page {
        let Some(layer) = layers.iter().find(|l| l.page_index == page_index) else {
            debug!("[EXTRACT] Page {} was not extracted; skipping its placeholders", page_index + 1);
            continue;
        };
        let lines = cluster_lines(&page_occurrences);
        debug!(
            "[EXTRACT] Page {}: {} placeholder(s) on {} line(s)",
            page_index + 1,
            page_occurrences.len(),
            lines.len()
        );
        for occurrence in lines.into_iter().flatten() {
            let query = heading_query(&left_context(layer, occurrence));
            if query.is_empty() {
                debug!("[EXTRACT] {} has no heading text; skipped", occurrence.token);
                continue;
            }
            debug!("[EXTRACT] {} -> '{}'", occurrence.token, query);
            entries.push(TocEntry {
                token: occurrence.token.clone(),
                heading_query: query,
                page_index,
                bbox: occurrence.bbox,
            });
        }
    }
    info!("[EXTRACT] Built {} TOC entr{}.", entries.len(), if entries.len() == 1 { "y" } else { "ies" });
    entries
}

/// Sorts one page's occurrences into reading order and groups them by visual line.
///
/// Each occurrence is compared with the first member of the most recent line.
pub fn cluster_lines<'a>(occurrences: &[&'a PlaceholderOccurrence]) -> Vec<Vec<&'a PlaceholderOccurrence>> {
    let mut sorted = occurrences.to_vec();
    sorted.sort_by(|a, b| {
        round_tenth(a.bbox.y0)
            .total_cmp(&round_tenth(b.bbox.y0))
            .then(a.bbox.x0.total_cmp(&b.bbox.x0))
    });

    let mut lines: Vec<Vec<&PlaceholderOccurrence>> = Vec::new();
    for occurrence in sorted {
        match lines.last_mut() {
            Some(line) if (line[0].bbox.y0 - occurrence.bbox.y0).abs() < LINE_TOLERANCE => line.push(occurrence),
            _ => lines.push(vec![occurrence]),
        }
    }
    lines
}

fn round_tenth(v: f32) -> f32 {
    (v * 10.0).round() / 10.0
}

/// Words on the placeholder's line that start left of it, joined by single spaces.
fn left_context(layer: &PageLayer, occurrence: &PlaceholderOccurrence) -> String {
    layer
        .words
        .iter()
        .filter(|w| (w.bbox.y0 - occurrence.bbox.y0).abs() < LINE_TOLERANCE)
        .filter(|w| w.bbox.x0 < occurrence.bbox.x0)
        .sorted_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0))
        .map(|w| w.text.as_str())
        .join(" ")
        .trim()
        .to_string()
}

/// Removes a leading dotted section number such as `2.3`.
pub fn strip_section_number(context: &str) -> &str {
    let trimmed = context.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((first, rest)) if SECTION_NUMBER.is_match(first) => rest.trim(),
        None if SECTION_NUMBER.is_match(trimmed) => "",
        _ => trimmed,
    }
}

fn heading_query(context: &str) -> String {
    let stripped = strip_section_number(context);
    let truncated: String = stripped.chars().take(MAX_QUERY_CHARS).collect();
    truncated.trim().to_string()
}
