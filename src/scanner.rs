// src/scanner.rs
//! Finds placeholder tokens on rendered pages.

use crate::error::TocError;
use folio_text_layer::{PageLayer, extract_pages};
use folio_types::{PlaceholderOccurrence, PlaceholderToken};
use log::{debug, info, warn};
use lopdf::Document;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

/// A whole word that is a placeholder token.
pub static TOKEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^P#\d{2,4}$").expect("BUG: invalid TOKEN_PATTERN regex literal"));

/// Every placeholder occurrence in the document, or nothing if the text layer is unreadable.
pub fn scan(doc: &Document) -> Vec<PlaceholderOccurrence> {
    match try_scan(doc) {
        Ok(occurrences) => occurrences,
        Err(e) => {
            warn!("[SCAN] Text extraction failed, treating document as placeholder-free: {}", e);
            Vec::new()
        }
    }
}

/// Like [`scan`], but reports extraction failures instead of hiding them.
pub fn try_scan(doc: &Document) -> Result<Vec<PlaceholderOccurrence>, TocError> {
    let layers = extract_pages(doc)?;
    Ok(scan_layers(&layers))
}

/// Collects occurrences from already-extracted pages.
pub fn scan_layers(layers: &[PageLayer]) -> Vec<PlaceholderOccurrence> {
    let mut occurrences = Vec::new();
    for layer in layers {
        for word in &layer.words {
            if !TOKEN_PATTERN.is_match(&word.text) {
                continue;
            }
            let Ok(token) = PlaceholderToken::new(&word.text) else {
                continue;
            };
            debug!("[SCAN] {} on page {} at {:?}", token, layer.page_index + 1, word.bbox);
            occurrences.push(PlaceholderOccurrence { page_index: layer.page_index, bbox: word.bbox, token });
        }
    }
    info!("[SCAN] Found {} placeholder occurrence(s) in {} page(s).", occurrences.len(), layers.len());
    occurrences
}

/// True when the PDF at `path` can be read and carries at least one placeholder.
pub fn has_placeholders(path: impl AsRef<Path>) -> bool {
    match Document::load(path.as_ref()) {
        Ok(doc) => !scan(&doc).is_empty(),
        Err(e) => {
            warn!("[SCAN] Could not open '{}': {}", path.as_ref().display(), e);
            false
        }
    }
}
