// src/resolver.rs
//! Maps each TOC entry to the page where its section begins.
//!
//! Pages are searched forward only: a section cannot start before the one
//! listed above it, so each search resumes where the previous hit was.

use crate::error::TocError;
use folio_text_layer::{PageLayer, extract_pages};
use folio_types::{ReplacementMap, ResolutionSource, ResolvedEntry, ResolvedPage, TocEntry};
use log::{debug, info, warn};
use lopdf::Document;
use serde::Serialize;

/// Strips all whitespace and lower-cases, so line breaks and spacing never block a match.
pub fn normalize(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).flat_map(char::to_lowercase).collect()
}

/// Normalized text of every page, computed once per run.
#[derive(Debug, Clone, Default)]
pub struct BodyText {
    pages: Vec<String>,
}

impl BodyText {
    pub fn from_layers(layers: &[PageLayer]) -> Self {
        Self { pages: layers.iter().map(|l| normalize(&l.text())).collect() }
    }

    pub fn from_texts<S: AsRef<str>>(texts: &[S]) -> Self {
        Self { pages: texts.iter().map(|t| normalize(t.as_ref())).collect() }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// First page at or after `from` whose text contains the normalized `query`.
    fn find_from(&self, from: usize, query: &str) -> Option<usize> {
        if query.is_empty() {
            return None;
        }
        self.pages.iter().enumerate().skip(from).find(|(_, text)| text.contains(query)).map(|(i, _)| i)
    }
}

/// Search position threaded from one TOC entry to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    /// 0-based index of the page the next search starts from.
    position: usize,
    /// 0-based index of the first page after the TOC.
    start_page: usize,
    page_count: usize,
    last_found: Option<ResolvedPage>,
    last_emitted: Option<ResolvedPage>,
}

impl PageCursor {
    /// A cursor for a document whose TOC ends on 0-based page `max_toc_page`.
    pub fn new(max_toc_page: usize, page_count: usize) -> Self {
        let start_page = (max_toc_page + 1).max(1);
        Self { position: start_page, start_page, page_count, last_found: None, last_emitted: None }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Resolves one entry and returns the cursor for the next.
    pub fn advance(self, entry: &TocEntry, body: &BodyText) -> (PageCursor, ResolvedEntry) {
        let query = normalize(&entry.heading_query);
        let from = self.position.max(self.start_page);
        let mut next = self;

        let (candidate, source) = match body.find_from(from, &query) {
            Some(index) => {
                let page = ResolvedPage::from_index(index);
                next.position = index;
                next.last_found = Some(page);
                (page, ResolutionSource::Found)
            }
            None => {
                let guess = match self.last_found {
                    Some(found) => found.number() + 1,
                    None => self.start_page + 1,
                };
                // A guess past the last page would print a number the reader cannot turn to.
                (ResolvedPage(guess.min(self.page_count.max(1))), ResolutionSource::Guessed)
            }
        };

        let (page, source) = match self.last_emitted {
            Some(last) if candidate < last => (last, ResolutionSource::Bumped),
            _ => (candidate, source),
        };
        next.last_emitted = Some(page);

        let resolved = ResolvedEntry { token: entry.token.clone(), heading_query: entry.heading_query.clone(), page, source };
        (next, resolved)
    }
}

/// Result of resolving every TOC entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Resolution {
    pub map: ReplacementMap,
    pub entries: Vec<ResolvedEntry>,
}

impl Resolution {
    pub fn guessed(&self) -> impl Iterator<Item = &ResolvedEntry> {
        self.entries.iter().filter(|e| e.is_guess())
    }
}

/// Resolves entries against the whole document and returns the replacement map.
pub fn resolve(doc: &Document, entries: &[TocEntry], max_toc_page: usize) -> Result<ReplacementMap, TocError> {
    Ok(resolve_with_report(doc, entries, max_toc_page)?.map)
}

/// Like [`resolve`], but keeps the per-entry outcome.
pub fn resolve_with_report(doc: &Document, entries: &[TocEntry], max_toc_page: usize) -> Result<Resolution, TocError> {
    let layers = extract_pages(doc)?;
    Ok(resolve_in(&BodyText::from_layers(&layers), entries, max_toc_page))
}

/// Resolves entries in TOC order against prepared page text.
pub fn resolve_in(body: &BodyText, entries: &[TocEntry], max_toc_page: usize) -> Resolution {
    let mut cursor = PageCursor::new(max_toc_page, body.page_count());
    let mut resolution = Resolution::default();

    for entry in entries {
        let (next, resolved) = cursor.advance(entry, body);
        cursor = next;
        match resolved.source {
            ResolutionSource::Found => {
                debug!("[RESOLVE] {} '{}' -> page {}", resolved.token, resolved.heading_query, resolved.page)
            }
            ResolutionSource::Guessed => warn!(
                "[RESOLVE] {} '{}' not found after page {}; guessing page {}",
                resolved.token,
                resolved.heading_query,
                cursor.position() + 1,
                resolved.page
            ),
            ResolutionSource::Bumped => warn!(
                "[RESOLVE] {} '{}' found before the guess above it; raised to page {}",
                resolved.token, resolved.heading_query, resolved.page
            ),
        }
        resolution.map.insert(resolved.token.clone(), resolved.page.to_string());
        resolution.entries.push(resolved);
    }

    info!(
        "[RESOLVE] Resolved {} entr{} ({} guessed).",
        resolution.entries.len(),
        if resolution.entries.len() == 1 { "y" } else { "ies" },
        resolution.guessed().count()
    );
    resolution
}
