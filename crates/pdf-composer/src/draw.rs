//! Overlay content builder working in top-left-origin page coordinates.

use crate::error::ComposerError;
use folio_text_layer::metrics::{self, HELVETICA_ASCENT, HELVETICA_DESCENT};
use folio_types::{Color, Rect};
use lopdf::content::{Content, Operation};
use lopdf::{Object, StringFormat};

/// Maps top-down page coordinates onto PDF user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFrame {
    /// MediaBox lower-left x.
    pub llx: f32,
    /// MediaBox upper-right y.
    pub ury: f32,
}

impl PageFrame {
    pub fn new(llx: f32, ury: f32) -> Self {
        Self { llx, ury }
    }

    fn x(&self, x: f32) -> f32 {
        x + self.llx
    }

    fn y(&self, y: f32) -> f32 {
        self.ury - y
    }
}

/// Accumulates drawing operations for one page overlay.
///
/// Every primitive is wrapped in its own `q … Q` so fill colors and line
/// widths never leak between primitives.
pub struct OverlayBuilder {
    frame: PageFrame,
    font: String,
    operations: Vec<Operation>,
}

impl OverlayBuilder {
    /// `font` is the page resource name of a Helvetica font.
    pub fn new(frame: PageFrame, font: impl Into<String>) -> Self {
        Self { frame, font: font.into(), operations: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Fills `rect` with `color`, no border.
    pub fn cover(&mut self, rect: Rect, color: Color) {
        let [r, g, b] = color.to_unit_rgb();
        self.operations.extend([
            Operation::new("q", vec![]),
            Operation::new("rg", vec![r.into(), g.into(), b.into()]),
            Operation::new("re", self.rect_operands(rect)),
            Operation::new("f", vec![]),
            Operation::new("Q", vec![]),
        ]);
    }

    /// Strokes the outline of `rect`.
    pub fn outline(&mut self, rect: Rect, color: Color, width: f32) {
        let [r, g, b] = color.to_unit_rgb();
        self.operations.extend([
            Operation::new("q", vec![]),
            Operation::new("RG", vec![r.into(), g.into(), b.into()]),
            Operation::new("w", vec![width.into()]),
            Operation::new("re", self.rect_operands(rect)),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ]);
    }

    /// Draws `text` right-aligned inside `rect`, baseline at `rect.y0 + size × ascent`.
    ///
    /// Returns `false` without drawing when the text is wider than the box or
    /// the font's ascent-to-descent height exceeds the box height.
    pub fn text_right_aligned(&mut self, rect: Rect, text: &str, size: f32, color: Color) -> bool {
        let width = metrics::helvetica().text_width(text, size);
        let height = size * (HELVETICA_ASCENT - HELVETICA_DESCENT);
        if width > rect.width() || height > rect.height() {
            return false;
        }
        self.text_at(rect.x1 - width, rect.y0 + size * HELVETICA_ASCENT, text, size, color);
        true
    }

    /// Draws `text` with its origin at `x` and its baseline at `baseline`, unbounded.
    pub fn text_at(&mut self, x: f32, baseline: f32, text: &str, size: f32, color: Color) {
        let [r, g, b] = color.to_unit_rgb();
        let (px, py) = (self.frame.x(x), self.frame.y(baseline));
        self.operations.extend([
            Operation::new("q", vec![]),
            Operation::new("rg", vec![r.into(), g.into(), b.into()]),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(self.font.as_bytes().to_vec()), size.into()]),
            Operation::new("Td", vec![px.into(), py.into()]),
            Operation::new("Tj", vec![Object::String(to_win_ansi(text), StringFormat::Literal)]),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ]);
    }

    fn rect_operands(&self, rect: Rect) -> Vec<Object> {
        vec![
            self.frame.x(rect.x0).into(),
            self.frame.y(rect.y1).into(),
            rect.width().into(),
            rect.height().into(),
        ]
    }

    pub fn finish(self) -> Result<Vec<u8>, ComposerError> {
        Ok(Content { operations: self.operations }.encode()?)
    }
}

/// Encodes text for a WinAnsi simple font; characters outside Latin-1 become `?`.
pub fn to_win_ansi(s: &str) -> Vec<u8> {
    s.chars().map(|c| if c as u32 <= 255 { c as u8 } else { b'?' }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> Vec<Operation> {
        Content::decode(bytes).unwrap().operations
    }

    #[test]
    fn cover_flips_into_pdf_space() {
        let mut overlay = OverlayBuilder::new(PageFrame::new(0.0, 792.0), "FolioHelv");
        overlay.cover(Rect::new(100.0, 84.0, 130.0, 94.0), Color::TOC_BACKGROUND);
        let ops = decode(&overlay.finish().unwrap());

        let re = ops.iter().find(|op| op.operator == "re").unwrap();
        let nums: Vec<f32> = re.operands.iter().map(|o| o.as_float().unwrap()).collect();
        assert_eq!(nums, vec![100.0, 698.0, 30.0, 10.0]);
        assert!(ops.iter().any(|op| op.operator == "f"));
    }

    #[test]
    fn right_aligned_text_refuses_to_overflow() {
        let mut overlay = OverlayBuilder::new(PageFrame::new(0.0, 792.0), "FolioHelv");
        let narrow = Rect::new(0.0, 0.0, 5.0, 20.0);
        assert!(!overlay.text_right_aligned(narrow, "12", 10.0, Color::BLACK));
        assert!(overlay.is_empty());

        let wide = Rect::new(50.0, 100.0, 150.0, 112.0);
        assert!(overlay.text_right_aligned(wide, "12", 10.0, Color::BLACK));
        let ops = decode(&overlay.finish().unwrap());
        let td = ops.iter().find(|op| op.operator == "Td").unwrap();
        let x = td.operands[0].as_float().unwrap();
        let y = td.operands[1].as_float().unwrap();
        // "12" is 11.12pt wide at 10pt; baseline sits 7.18pt below the box top.
        assert!((x - 138.88).abs() < 1e-3);
        assert!((y - (792.0 - 107.18)).abs() < 1e-3);
    }

    #[test]
    fn win_ansi_replaces_wide_characters() {
        assert_eq!(to_win_ansi("7"), b"7".to_vec());
        assert_eq!(to_win_ansi("\u{e9}\u{2192}"), vec![0xE9, b'?']);
    }
}
