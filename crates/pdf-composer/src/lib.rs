//! PDF page editing utilities for post-processing rendered documents.
//!
//! This crate provides low-level page manipulation using lopdf:
//! - Content overlaying with the original content isolated in `q … Q`
//! - Standard font registration in page resources
//! - Cover patches and Helvetica text in top-left-origin coordinates
//! - Glyph retirement (removing glyphs while keeping following positions)

mod draw;
mod error;
mod resources;
mod retire;

pub use draw::{OverlayBuilder, PageFrame, to_win_ansi};
pub use error::ComposerError;
pub use resources::{add_standard_font, ensure_font_resource};
pub use retire::retire_glyph_runs;

use lopdf::{Document, Object, ObjectId, Stream, dictionary};

/// Adds a new content stream to an existing page, overlaying it on top.
///
/// The page's existing content streams are wrapped between a `q` stream and a
/// `Q` stream, so graphics state left open by the original content cannot
/// shift or recolor the overlay.
///
/// # Arguments
/// * `doc` - The document containing the page to modify.
/// * `page_id` - The `ObjectId` of the page to add the overlay to.
/// * `content_stream` - The raw bytes of the new content stream.
pub fn overlay_content(
    doc: &mut Document,
    page_id: ObjectId,
    content_stream: Vec<u8>,
) -> Result<(), ComposerError> {
    let overlay_id = doc.add_object(Object::Stream(Stream::new(dictionary! {}, content_stream)));

    let existing = match doc.get_object(page_id)?.as_dict()?.get(b"Contents") {
        Ok(Object::Array(arr)) => arr.clone(),
        Ok(reference @ Object::Reference(_)) => vec![reference.clone()],
        Ok(other) => {
            return Err(ComposerError::Other(format!(
                "Page {:?} has an unsupported /Contents entry: {:?}",
                page_id, other
            )));
        }
        Err(_) => Vec::new(),
    };

    let mut contents = Vec::with_capacity(existing.len() + 3);
    if !existing.is_empty() {
        let save_id = doc.add_object(Object::Stream(Stream::new(dictionary! {}, b"q\n".to_vec())));
        let restore_id = doc.add_object(Object::Stream(Stream::new(dictionary! {}, b"\nQ\n".to_vec())));
        contents.push(Object::Reference(save_id));
        contents.extend(existing);
        contents.push(Object::Reference(restore_id));
    }
    // The overlay goes last, so it's drawn on top.
    contents.push(Object::Reference(overlay_id));

    let page_dict = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page_dict.set("Contents", Object::Array(contents));
    Ok(())
}
