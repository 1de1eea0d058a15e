//! Derived text views over a page's glyphs: spans, words, lines, page text and search.

use folio_types::{GlyphRun, GlyphSource, Rect};
use std::ops::Range;

/// Horizontal gap, as a fraction of font size, that separates two words.
pub const WORD_GAP_RATIO: f32 = 0.25;
/// Baseline distance, as a fraction of font size, within which glyphs share a line.
pub const BASELINE_TOLERANCE_RATIO: f32 = 0.3;

#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub text: String,
    pub bbox: Rect,
    /// Baseline y in top-down page space.
    pub baseline: f32,
    /// Effective font size: the Tf size scaled by the text and graphics matrices.
    pub size: f32,
    /// Index of the span (shown string) that drew the glyph.
    pub span: usize,
    /// Set for glyphs drawn by page-level content; `None` inside Form XObjects.
    pub source: Option<GlyphSource>,
}

impl Glyph {
    pub fn is_whitespace(&self) -> bool {
        !self.text.is_empty() && self.text.chars().all(char::is_whitespace)
    }
}

/// Everything one shown string drew.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub bbox: Rect,
    pub size: f32,
    pub text: String,
    pub glyphs: Range<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub bbox: Rect,
    pub glyphs: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub baseline: f32,
    pub bbox: Rect,
    /// Glyph indices in left-to-right order.
    pub glyphs: Vec<usize>,
    /// Range into [`PageLayer::words`].
    pub words: Range<usize>,
}

/// One literal match of [`PageLayer::search`].
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub bbox: Rect,
    pub line: usize,
    pub glyphs: Vec<usize>,
}

/// The positioned text of one page.
#[derive(Debug, Clone, Default)]
pub struct PageLayer {
    pub page_index: usize,
    pub width: f32,
    pub height: f32,
    /// MediaBox in PDF user space, as `(llx, lly, urx, ury)`.
    pub media_box: Rect,
    pub glyphs: Vec<Glyph>,
    pub spans: Vec<TextSpan>,
    pub words: Vec<Word>,
    pub lines: Vec<TextLine>,
}

impl PageLayer {
    pub fn assemble(page_index: usize, width: f32, height: f32, glyphs: Vec<Glyph>, spans: Vec<TextSpan>) -> Self {
        let mut layer = PageLayer {
            page_index,
            width,
            height,
            media_box: Rect::new(0.0, 0.0, width, height),
            glyphs,
            spans,
            words: Vec::new(),
            lines: Vec::new(),
        };
        layer.build_lines();
        layer
    }

    fn build_lines(&mut self) {
        let mut groups: Vec<(f32, Vec<usize>)> = Vec::new();
        for (i, g) in self.glyphs.iter().enumerate() {
            if g.is_whitespace() && g.bbox.width() <= 0.0 {
                continue;
            }
            let tolerance = BASELINE_TOLERANCE_RATIO * g.size.max(1.0);
            match groups.iter_mut().rev().find(|(baseline, _)| (baseline - g.baseline).abs() <= tolerance) {
                Some((_, members)) => members.push(i),
                None => groups.push((g.baseline, vec![i])),
            }
        }
        groups.sort_by(|a, b| a.0.total_cmp(&b.0));

        for (baseline, mut members) in groups {
            members.sort_by(|&a, &b| self.glyphs[a].bbox.x0.total_cmp(&self.glyphs[b].bbox.x0));
            let first_word = self.words.len();
            self.split_words(&members);
            let bbox = members
                .iter()
                .map(|&i| self.glyphs[i].bbox)
                .reduce(Rect::union)
                .unwrap_or_default();
            self.lines.push(TextLine { baseline, bbox, glyphs: members, words: first_word..self.words.len() });
        }
    }

    fn split_words(&mut self, line: &[usize]) {
        let mut current: Vec<usize> = Vec::new();
        for &i in line {
            let g = &self.glyphs[i];
            if g.is_whitespace() {
                self.flush_word(&mut current);
                continue;
            }
            if let Some(&prev) = current.last() {
                let p = &self.glyphs[prev];
                let gap = g.bbox.x0 - p.bbox.x1;
                let size = p.size.max(g.size).max(1.0);
                if gap > WORD_GAP_RATIO * size || gap < -size {
                    self.flush_word(&mut current);
                }
            }
            current.push(i);
        }
        self.flush_word(&mut current);
    }

    fn flush_word(&mut self, current: &mut Vec<usize>) {
        if current.is_empty() {
            return;
        }
        let glyphs = std::mem::take(current);
        let text: String = glyphs.iter().map(|&i| self.glyphs[i].text.as_str()).collect();
        if text.is_empty() {
            return;
        }
        let bbox = glyphs.iter().map(|&i| self.glyphs[i].bbox).reduce(Rect::union).unwrap_or_default();
        self.words.push(Word { text, bbox, glyphs });
    }

    pub fn line_text(&self, line: &TextLine) -> String {
        self.words[line.words.clone()].iter().map(|w| w.text.as_str()).collect::<Vec<_>>().join(" ")
    }

    /// Lines joined by `\n`, words within a line by a single space.
    pub fn text(&self) -> String {
        self.lines.iter().map(|l| self.line_text(l)).collect::<Vec<_>>().join("\n")
    }

    /// Finds every occurrence of `needle` within a line that is not followed by an ASCII digit.
    pub fn search(&self, needle: &str) -> Vec<SearchHit> {
        if needle.is_empty() {
            return Vec::new();
        }
        let mut hits = Vec::new();
        for (line_index, line) in self.lines.iter().enumerate() {
            let (haystack, ranges) = self.line_index(line);
            for (start, matched) in haystack.match_indices(needle) {
                let end = start + matched.len();
                if haystack[end..].chars().next().is_some_and(|c| c.is_ascii_digit()) {
                    continue;
                }
                let glyphs: Vec<usize> = ranges
                    .iter()
                    .filter(|(_, r)| r.start < end && r.end > start)
                    .map(|(g, _)| *g)
                    .collect();
                let Some(bbox) = glyphs.iter().map(|&i| self.glyphs[i].bbox).reduce(Rect::union) else {
                    continue;
                };
                hits.push(SearchHit { bbox, line: line_index, glyphs });
            }
        }
        hits
    }

    /// The line's words joined by spaces, with each glyph's byte range in that string.
    fn line_index(&self, line: &TextLine) -> (String, Vec<(usize, Range<usize>)>) {
        let mut haystack = String::new();
        let mut ranges = Vec::new();
        for (n, word) in self.words[line.words.clone()].iter().enumerate() {
            if n > 0 {
                haystack.push(' ');
            }
            for &g in &word.glyphs {
                let start = haystack.len();
                haystack.push_str(&self.glyphs[g].text);
                ranges.push((g, start..haystack.len()));
            }
        }
        (haystack, ranges)
    }

    /// The editable glyphs of a hit, or `None` when any glyph came from a Form XObject.
    pub fn glyph_run(&self, hit: &SearchHit) -> Option<GlyphRun> {
        let sources: Option<Vec<GlyphSource>> = hit.glyphs.iter().map(|&i| self.glyphs[i].source).collect();
        let sources = sources?;
        if sources.is_empty() {
            return None;
        }
        Some(GlyphRun { page_index: self.page_index, sources })
    }

    /// Spans whose top edge lies within `tolerance` of `y0`.
    pub fn spans_near_top(&self, y0: f32, tolerance: f32) -> impl Iterator<Item = &TextSpan> {
        self.spans.iter().filter(move |s| (s.bbox.y0 - y0).abs() <= tolerance)
    }
}
