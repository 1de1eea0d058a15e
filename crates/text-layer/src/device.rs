//! pdf-extract output device that records positioned glyphs.
//!
//! pdf-extract hands over the text rendering matrix, advance width and font
//! size of every glyph it shows. The collector turns those into top-down
//! bounding boxes and groups them per shown string.

use crate::layout::{Glyph, TextSpan};
use folio_types::{Point, Rect};
use pdf_extract::{MediaBox, OutputDev, OutputError, Transform};
use std::ops::Range;

/// Glyph top above the baseline, in em. pdf-extract reports no font bounding boxes.
pub const GLYPH_ASCENT: f64 = 0.8;
/// Glyph bottom below the baseline, in em.
pub const GLYPH_DESCENT: f64 = -0.2;

/// What pdf-extract reported for one page.
#[derive(Debug, Default)]
pub(crate) struct PageCapture {
    /// MediaBox as `(llx, lly, urx, ury)`.
    pub media_box: Rect,
    pub glyphs: Vec<Glyph>,
    pub spans: Vec<TextSpan>,
    /// Glyph range of every shown string, empty strings included.
    pub shows: Vec<Range<usize>>,
    /// TJ displacement that replaces each glyph's advance, when the font size is non-zero.
    pub compensations: Vec<Option<f32>>,
    open_show: Option<usize>,
}

impl PageCapture {
    fn push_glyph(&mut self, trm: &Transform, width: f64, spacing: f64, font_size: f64, text: &str) {
        let (llx, ury) = (self.media_box.x0 as f64, self.media_box.y1 as f64);
        // Glyph space in em -> text space -> device space, flipped to top-down.
        let to_page = |u: f64, v: f64| {
            let (tx, ty) = (u * font_size, v * font_size);
            let x = tx * trm.m11 + ty * trm.m21 + trm.m31;
            let y = tx * trm.m12 + ty * trm.m22 + trm.m32;
            Point::new((x - llx) as f32, (ury - y) as f32)
        };
        let corners = [
            to_page(0.0, GLYPH_DESCENT),
            to_page(width, GLYPH_DESCENT),
            to_page(0.0, GLYPH_ASCENT),
            to_page(width, GLYPH_ASCENT),
        ];
        let size = (font_size.abs() * trm.m21.hypot(trm.m22)) as f32;
        let compensation = (font_size != 0.0).then(|| (-(width * font_size + spacing) * 1000.0 / font_size) as f32);

        self.glyphs.push(Glyph {
            text: text.to_string(),
            bbox: Rect::from_points(&corners).unwrap_or_default(),
            baseline: to_page(0.0, 0.0).y,
            size,
            span: self.spans.len(),
            source: None,
        });
        self.compensations.push(compensation);
    }

    fn close_show(&mut self) {
        let Some(start) = self.open_show.take() else {
            return;
        };
        let end = self.glyphs.len();
        self.shows.push(start..end);
        let glyphs = &self.glyphs[start..end];
        let Some(bbox) = glyphs.iter().map(|g| g.bbox).reduce(Rect::union) else {
            return;
        };
        self.spans.push(TextSpan {
            bbox,
            size: glyphs.iter().map(|g| g.size).fold(0.0f32, f32::max),
            text: glyphs.iter().map(|g| g.text.as_str()).collect(),
            glyphs: start..end,
        });
    }
}

/// Collects one [`PageCapture`] per page pdf-extract walks.
#[derive(Debug, Default)]
pub(crate) struct GlyphCollector {
    pub pages: Vec<PageCapture>,
}

impl GlyphCollector {
    fn current(&mut self) -> Option<&mut PageCapture> {
        self.pages.last_mut()
    }
}

impl OutputDev for GlyphCollector {
    fn begin_page(&mut self, _page_num: u32, media_box: &MediaBox, _art_box: Option<(f64, f64, f64, f64)>) -> Result<(), OutputError> {
        let bounds = Rect::new(
            media_box.llx.min(media_box.urx) as f32,
            media_box.lly.min(media_box.ury) as f32,
            media_box.llx.max(media_box.urx) as f32,
            media_box.lly.max(media_box.ury) as f32,
        );
        self.pages.push(PageCapture { media_box: bounds, ..PageCapture::default() });
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn output_character(&mut self, trm: &Transform, width: f64, spacing: f64, font_size: f64, char: &str) -> Result<(), OutputError> {
        if let Some(page) = self.current() {
            page.push_glyph(trm, width, spacing, font_size, char);
        }
        Ok(())
    }

    fn begin_word(&mut self) -> Result<(), OutputError> {
        if let Some(page) = self.current() {
            page.close_show();
            page.open_show = Some(page.glyphs.len());
        }
        Ok(())
    }

    fn end_word(&mut self) -> Result<(), OutputError> {
        if let Some(page) = self.current() {
            page.close_show();
        }
        Ok(())
    }

    fn end_line(&mut self) -> Result<(), OutputError> {
        Ok(())
    }
}
