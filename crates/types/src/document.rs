use crate::geometry::Rect;
use crate::ids::PlaceholderToken;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One visual occurrence of a placeholder token on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderOccurrence {
    /// 0-based page index.
    pub page_index: usize,
    pub bbox: Rect,
    pub token: PlaceholderToken,
}

/// A TOC row: the placeholder plus the heading text used to find its section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TocEntry {
    pub token: PlaceholderToken,
    /// Searchable heading text, numeral prefix removed, at most 80 characters.
    pub heading_query: String,
    /// 0-based index of the TOC page carrying the row.
    pub page_index: usize,
    pub bbox: Rect,
}

/// A 1-based page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedPage(pub usize);

impl ResolvedPage {
    /// Page number for a 0-based page index.
    pub fn from_index(index: usize) -> Self {
        Self(index + 1)
    }

    pub fn number(self) -> usize {
        self.0
    }
}

impl fmt::Display for ResolvedPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a page number was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// The heading text was found on the page.
    Found,
    /// The heading was not found; the number is a forward guess.
    Guessed,
    /// The heading was found on an earlier page than a guess above it, so
    /// the number was raised to keep the TOC non-decreasing.
    Bumped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedEntry {
    pub token: PlaceholderToken,
    pub heading_query: String,
    pub page: ResolvedPage,
    pub source: ResolutionSource,
}

impl ResolvedEntry {
    /// True when the number is not the page the heading was found on.
    pub fn is_guess(&self) -> bool {
        matches!(self.source, ResolutionSource::Guessed | ResolutionSource::Bumped)
    }
}

/// Token → page-number text, consumed wholesale by the rewriter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplacementMap(BTreeMap<PlaceholderToken, String>);

impl ReplacementMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the replacement for `token`; a later insert for the same token wins.
    pub fn insert(&mut self, token: PlaceholderToken, replacement: impl Into<String>) {
        self.0.insert(token, replacement.into());
    }

    pub fn get(&self, token: &PlaceholderToken) -> Option<&str> {
        self.0.get(token).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PlaceholderToken, &str)> {
        self.0.iter().map(|(k, v)| (k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(PlaceholderToken, String)> for ReplacementMap {
    fn from_iter<I: IntoIterator<Item = (PlaceholderToken, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
