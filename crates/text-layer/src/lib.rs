//! Positioned text of rendered PDF pages.
//!
//! Glyph positions, advances and sizes come from pdf-extract. This crate
//! shapes them into what the TOC post-processor needs to see on a page:
//! - Glyphs with top-left-origin bounding boxes, baselines and effective sizes
//! - Spans (one per shown string), words and lines
//! - Literal search with per-glyph provenance for in-place edits
//! - Standard-14 advance widths for text drawn back onto the page

mod device;
mod error;
mod layout;
pub mod metrics;
mod objects;
mod shows;

pub use device::{GLYPH_ASCENT, GLYPH_DESCENT};
pub use error::TextLayerError;
pub use layout::{
    BASELINE_TOLERANCE_RATIO, Glyph, PageLayer, SearchHit, TextLine, TextSpan, WORD_GAP_RATIO, Word,
};

use device::{GlyphCollector, PageCapture};
use folio_types::GlyphSource;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use shows::ShowSite;
use std::panic::{self, AssertUnwindSafe};

/// Page object ids in page order; position `i` is the page at 0-based index `i`.
pub fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

/// Decoded operations of a page's content, all `/Contents` streams concatenated.
///
/// Operation indices in [`folio_types::GlyphSource`] refer to this list.
pub fn page_operations(doc: &Document, page_id: ObjectId) -> Result<Vec<Operation>, TextLayerError> {
    let bytes = doc.get_page_content(page_id)?;
    Ok(Content::decode(&bytes)?.operations)
}

/// A read-only copy of a document prepared for pdf-extract.
///
/// pdf-extract interprets every XObject it meets as content, so image
/// XObjects are swapped for empty forms in the copy.
pub struct TextView {
    doc: Document,
    page_ids: Vec<ObjectId>,
}

impl TextView {
    pub fn new(doc: &Document) -> Self {
        let mut doc = doc.clone();
        let images: Vec<ObjectId> = doc
            .objects
            .iter()
            .filter_map(|(id, obj)| match obj {
                Object::Stream(stream) if shows::is_image(&doc, stream) => Some(*id),
                _ => None,
            })
            .collect();
        for id in images {
            let blank = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Form",
                    "BBox" => vec![0.into(), 0.into(), 1.into(), 1.into()],
                },
                Vec::new(),
            );
            doc.objects.insert(id, Object::Stream(blank));
        }
        let page_ids = page_ids(&doc);
        Self { doc, page_ids }
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Extracts the text layer of the page at a 0-based index.
    pub fn page(&self, page_index: usize) -> Result<PageLayer, TextLayerError> {
        let page_id = *self.page_ids.get(page_index).ok_or(TextLayerError::MissingPage(page_index))?;
        let page_number = page_index as u32 + 1;

        let mut collector = GlyphCollector::default();
        // pdf-extract panics on some malformed resources instead of returning an error.
        panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::output_doc_page(&self.doc, &mut collector, page_number)
        }))
        .map_err(|_| TextLayerError::Extraction { page: page_index, reason: "pdf-extract panicked".to_string() })??;

        let mut capture = collector.pages.pop().ok_or_else(|| TextLayerError::Extraction {
            page: page_index,
            reason: "no page was reported".to_string(),
        })?;
        match self.show_sites(page_id) {
            Some(sites) if sites.len() == capture.shows.len() => attach_sources(&mut capture, &sites),
            sites => log::debug!(
                "[TEXT] Page {}: {} strings reported, {:?} found in content; glyphs stay read-only",
                page_number,
                capture.shows.len(),
                sites.map(|s| s.len())
            ),
        }

        log::debug!("[TEXT] Page {}: {} glyphs in {} spans", page_number, capture.glyphs.len(), capture.spans.len());
        let media_box = capture.media_box;
        let mut layer =
            PageLayer::assemble(page_index, media_box.width(), media_box.height(), capture.glyphs, capture.spans);
        layer.media_box = media_box;
        Ok(layer)
    }

    /// Extracts every page; fails on the first page that cannot be read.
    pub fn pages(&self) -> Result<Vec<PageLayer>, TextLayerError> {
        (0..self.page_count()).map(|index| self.page(index)).collect()
    }

    fn show_sites(&self, page_id: ObjectId) -> Option<Vec<ShowSite>> {
        let operations = page_operations(&self.doc, page_id).ok()?;
        let page = self.doc.get_object(page_id).ok()?.as_dict().ok()?;
        shows::show_sites(&self.doc, &operations, objects::page_resources(&self.doc, page))
    }
}

/// Gives page-level glyphs the operation and byte range that drew them.
///
/// Byte ranges are split evenly across a string's glyphs, so strings whose
/// length is not a multiple of their glyph count stay read-only.
fn attach_sources(capture: &mut PageCapture, sites: &[ShowSite]) {
    for (site, range) in sites.iter().zip(&capture.shows) {
        let count = range.len();
        if !site.page_level || count == 0 || site.byte_len % count != 0 {
            continue;
        }
        let code_len = site.byte_len / count;
        for (k, g) in range.clone().enumerate() {
            let Some(compensation) = capture.compensations[g] else {
                continue;
            };
            capture.glyphs[g].source = Some(GlyphSource {
                op_index: site.op_index,
                element: site.element,
                byte_start: k * code_len,
                byte_end: (k + 1) * code_len,
                compensation,
            });
        }
    }
}

/// Extracts every page of `doc`.
pub fn extract_pages(doc: &Document) -> Result<Vec<PageLayer>, TextLayerError> {
    TextView::new(doc).pages()
}

/// Extracts the page at a 0-based index.
pub fn extract_page_at(doc: &Document, page_index: usize) -> Result<PageLayer, TextLayerError> {
    TextView::new(doc).page(page_index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Dictionary, StringFormat};

    /// A single-page document with a Helvetica `/F1` resource and the given content.
    ///
    /// `extra` may add objects to the document and returns additional resource entries.
    fn single_page_with(content: &[u8], extra: impl FnOnce(&mut Document) -> Dictionary) -> Document {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let mut resources = extra(&mut doc);
        resources.set("Font", dictionary! { "F1" => font_id });
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => resources,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    fn single_page(content: &[u8]) -> Document {
        single_page_with(content, |_| Dictionary::new())
    }

    #[test]
    fn positions_glyphs_in_top_down_space() {
        let doc = single_page(b"BT /F1 10 Tf 100 700 Td (P#01) Tj ET");
        let layer = extract_page_at(&doc, 0).unwrap();

        assert_eq!(layer.glyphs.len(), 4);
        let p = &layer.glyphs[0];
        assert!((p.baseline - 92.0).abs() < 1e-3);
        assert!((p.bbox.x0 - 100.0).abs() < 1e-3);
        assert!((p.bbox.x1 - 106.67).abs() < 1e-3);
        assert!((p.bbox.y0 - 84.0).abs() < 1e-3);
        assert!((p.bbox.y1 - 94.0).abs() < 1e-3);
        assert!((p.size - 10.0).abs() < 1e-4);
        assert_eq!(layer.spans.len(), 1);
        assert_eq!(layer.text(), "P#01");
        assert_eq!(layer.media_box.y1, 792.0);
    }

    #[test]
    fn tj_adjustments_move_following_glyphs_and_record_sources() {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 10.into()]),
                Operation::new("Td", vec![100.into(), 700.into()]),
                Operation::new(
                    "TJ",
                    vec![Object::Array(vec![
                        Object::String(b"A".to_vec(), StringFormat::Literal),
                        Object::Integer(-1000),
                        Object::String(b"B".to_vec(), StringFormat::Literal),
                    ])],
                ),
                Operation::new("ET", vec![]),
            ],
        }
        .encode()
        .unwrap();
        let doc = single_page(&content);
        let layer = extract_page_at(&doc, 0).unwrap();

        let b = &layer.glyphs[1];
        // A is 6.67 wide, the -1000 adjustment adds one em (10pt).
        assert!((b.bbox.x0 - 116.67).abs() < 1e-3);
        let source = b.source.unwrap();
        assert_eq!(source.op_index, 3);
        assert_eq!(source.element, Some(2));
        assert_eq!((source.byte_start, source.byte_end), (0, 1));
        assert!((source.compensation + 667.0).abs() < 1e-2);
    }

    #[test]
    fn form_xobject_text_is_found_without_sources() {
        let doc = single_page_with(b"q /Fm1 Do Q", |doc| {
            let form_id = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Form",
                    "BBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                },
                b"BT /F1 12 Tf 72 600 Td (Deep) Tj ET".to_vec(),
            ));
            dictionary! { "XObject" => dictionary! { "Fm1" => form_id } }
        });

        let layer = extract_page_at(&doc, 0).unwrap();
        assert_eq!(layer.text(), "Deep");
        assert!(layer.glyphs.iter().all(|g| g.source.is_none()));
    }

    #[test]
    fn image_xobjects_do_not_disturb_extraction() {
        let doc = single_page_with(b"q 10 0 0 10 0 0 cm /Im1 Do Q BT /F1 10 Tf 72 700 Td (Intro) Tj ET", |doc| {
            let image_id = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => 1,
                    "Height" => 1,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                vec![0x7F, 0x28, 0x5C],
            ));
            dictionary! { "XObject" => dictionary! { "Im1" => image_id } }
        });

        let layer = extract_page_at(&doc, 0).unwrap();
        assert_eq!(layer.text(), "Intro");
        assert!(layer.glyphs.iter().all(|g| g.source.is_some()));
    }

    #[test]
    fn missing_page_index_is_an_error() {
        let doc = single_page(b"");
        assert!(matches!(extract_page_at(&doc, 3), Err(TextLayerError::MissingPage(3))));
        assert!(extract_page_at(&doc, 0).unwrap().glyphs.is_empty());
    }
}
