//! Advance widths of standard-14 fonts, as pdf-extract knows them.
//!
//! pdf-extract ships the AFM metrics of the base fonts but keeps them
//! private. They are read back once by showing the printable ASCII range in
//! the font on a scratch page and recording the width of every glyph.

use crate::error::TextLayerError;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, StringFormat, dictionary};
use once_cell::sync::Lazy;
use pdf_extract::{MediaBox, OutputDev, OutputError, Transform};
use std::panic::{self, AssertUnwindSafe};

/// Helvetica cap-to-descender metrics, in em.
pub const HELVETICA_ASCENT: f32 = 0.718;
pub const HELVETICA_DESCENT: f32 = -0.207;

const FIRST_PRINTABLE: u8 = b' ';
const LAST_PRINTABLE: u8 = b'~';
/// Width used for characters without a measurement, in em.
const DEFAULT_ADVANCE: f32 = 0.556;

static HELVETICA: Lazy<FontWidths> = Lazy::new(|| {
    FontWidths::measure("Helvetica").unwrap_or_else(|e| {
        log::warn!("[TEXT] Could not measure Helvetica widths: {e}; using a fixed advance");
        FontWidths::uniform(DEFAULT_ADVANCE)
    })
});

/// Helvetica widths, measured on first use.
pub fn helvetica() -> &'static FontWidths {
    &HELVETICA
}

/// Per-character advance widths of one font.
#[derive(Debug, Clone, PartialEq)]
pub struct FontWidths {
    /// Advances of the printable ASCII range, in em.
    advances: Vec<f32>,
    fallback: f32,
}

impl FontWidths {
    fn uniform(advance: f32) -> Self {
        let count = (LAST_PRINTABLE - FIRST_PRINTABLE + 1) as usize;
        Self { advances: vec![advance; count], fallback: advance }
    }

    /// Measures a standard-14 font by its `/BaseFont` name.
    pub fn measure(base_font: &str) -> Result<Self, TextLayerError> {
        let doc = scratch_page(base_font)?;
        let mut recorder = WidthRecorder::default();
        panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::output_doc(&doc, &mut recorder)))
            .map_err(|_| TextLayerError::Extraction { page: 0, reason: "pdf-extract panicked".to_string() })??;

        let expected = (LAST_PRINTABLE - FIRST_PRINTABLE + 1) as usize;
        if recorder.advances.len() != expected {
            return Err(TextLayerError::Extraction {
                page: 0,
                reason: format!("expected {expected} glyph widths, got {}", recorder.advances.len()),
            });
        }
        let fallback = recorder.advances[(b'0' - FIRST_PRINTABLE) as usize];
        Ok(Self { advances: recorder.advances, fallback })
    }

    /// Advance of `ch` in em; characters outside printable ASCII measure like `0`.
    pub fn advance(&self, ch: char) -> f32 {
        u8::try_from(ch)
            .ok()
            .filter(|b| (FIRST_PRINTABLE..=LAST_PRINTABLE).contains(b))
            .map_or(self.fallback, |b| self.advances[(b - FIRST_PRINTABLE) as usize])
    }

    /// Width of `text` set at `size` points.
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        text.chars().map(|c| self.advance(c)).sum::<f32>() * size
    }
}

/// One page showing the printable ASCII range in `base_font`.
fn scratch_page(base_font: &str) -> Result<Document, TextLayerError> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
    });
    let sample: Vec<u8> = (FIRST_PRINTABLE..=LAST_PRINTABLE).collect();
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new("Tj", vec![Object::String(sample, StringFormat::Hexadecimal)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 1000.into(), 100.into()],
        "Contents" => content_id,
        "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! { "Type" => "Pages", "Kids" => vec![page_id.into()], "Count" => 1 }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);
    Ok(doc)
}

#[derive(Default)]
struct WidthRecorder {
    advances: Vec<f32>,
}

impl OutputDev for WidthRecorder {
    fn begin_page(&mut self, _: u32, _: &MediaBox, _: Option<(f64, f64, f64, f64)>) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn output_character(&mut self, _: &Transform, width: f64, _: f64, _: f64, _: &str) -> Result<(), OutputError> {
        self.advances.push(width as f32);
        Ok(())
    }

    fn begin_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_line(&mut self) -> Result<(), OutputError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helvetica_digits_share_one_width() {
        let widths = helvetica();
        for d in '0'..='9' {
            assert!((widths.advance(d) - 0.556).abs() < 1e-4, "{d}");
        }
        assert!((widths.text_width("12", 10.0) - 11.12).abs() < 1e-3);
        assert_eq!(widths.text_width("", 12.0), 0.0);
    }

    #[test]
    fn narrow_and_wide_glyphs_differ() {
        let widths = FontWidths::measure("Helvetica").unwrap();
        assert!(widths.advance('i') < widths.advance('W'));
        assert_eq!(widths.advance('\u{2192}'), widths.advance('0'));
    }
}
