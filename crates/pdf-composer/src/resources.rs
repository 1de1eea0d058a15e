//! Page resource editing: registering a standard font under a collision-free name.

use crate::error::ComposerError;
use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};

const MAX_PARENT_HOPS: usize = 32;

/// Adds a standard-14 Type1 font object with WinAnsi encoding and returns its id.
pub fn add_standard_font(doc: &mut Document, base_font: &str) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
        "Encoding" => "WinAnsiEncoding",
    })
}

/// Makes `font_id` available to the page and returns its resource name.
///
/// The page's effective `/Resources` (possibly inherited or shared with other
/// pages) is cloned onto the page before editing, so no other page changes.
/// Calling this again for the same font returns the existing name.
pub fn ensure_font_resource(
    doc: &mut Document,
    page_id: ObjectId,
    font_id: ObjectId,
    preferred_name: &str,
) -> Result<String, ComposerError> {
    let mut resources = effective_resources(doc, page_id)?;
    let mut fonts = match resources.get(b"Font") {
        Ok(obj) => resolve_dict(doc, obj).unwrap_or_default(),
        Err(_) => Dictionary::new(),
    };

    let existing = fonts.iter().find_map(|(name, value)| match value {
        Object::Reference(id) if *id == font_id => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    });
    if let Some(name) = existing {
        return Ok(name);
    }

    let name = free_name(&fonts, preferred_name);
    fonts.set(name.as_bytes().to_vec(), Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));

    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page.set("Resources", Object::Dictionary(resources));
    Ok(name)
}

fn free_name(fonts: &Dictionary, preferred: &str) -> String {
    if !fonts.has(preferred.as_bytes()) {
        return preferred.to_string();
    }
    (1..)
        .map(|n| format!("{preferred}{n}"))
        .find(|candidate| !fonts.has(candidate.as_bytes()))
        .unwrap_or_else(|| preferred.to_string())
}

/// The page's `/Resources` dictionary, following `/Parent` inheritance, as an owned copy.
fn effective_resources(doc: &Document, page_id: ObjectId) -> Result<Dictionary, ComposerError> {
    let mut current = doc.get_object(page_id)?.as_dict()?;
    for _ in 0..MAX_PARENT_HOPS {
        if let Ok(obj) = current.get(b"Resources") {
            return Ok(resolve_dict(doc, obj).unwrap_or_default());
        }
        match current.get(b"Parent").and_then(Object::as_reference) {
            Ok(parent) => current = doc.get_object(parent)?.as_dict()?,
            Err(_) => return Ok(Dictionary::new()),
        }
    }
    Err(ComposerError::Other(format!("Page {:?} has a cyclic /Parent chain", page_id)))
}

fn resolve_dict(doc: &Document, obj: &Object) -> Option<Dictionary> {
    match obj {
        Object::Dictionary(dict) => Some(dict.clone()),
        Object::Reference(id) => doc.get_object(*id).ok().and_then(|o| o.as_dict().ok()).cloned(),
        _ => None,
    }
}
