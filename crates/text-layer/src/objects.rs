//! Small accessors over lopdf objects used to walk page resources.

use lopdf::{Dictionary, Document, Object};

const MAX_REFERENCE_HOPS: usize = 32;

static NULL: Object = Object::Null;

/// Follows indirect references until a direct object is reached.
pub fn resolve<'a>(doc: &'a Document, mut obj: &'a Object) -> &'a Object {
    for _ in 0..MAX_REFERENCE_HOPS {
        match obj {
            Object::Reference(id) => match doc.get_object(*id) {
                Ok(target) => obj = target,
                Err(_) => return &NULL,
            },
            _ => return obj,
        }
    }
    &NULL
}

pub fn get<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    dict.get(key).ok().map(|obj| resolve(doc, obj))
}

pub fn get_dict<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Dictionary> {
    match get(doc, dict, key)? {
        Object::Dictionary(d) => Some(d),
        Object::Stream(s) => Some(&s.dict),
        _ => None,
    }
}

pub fn get_name<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a [u8]> {
    match get(doc, dict, key)? {
        Object::Name(name) => Some(name.as_slice()),
        _ => None,
    }
}

/// The page's `/Resources`, following `/Parent` links when the page inherits them.
pub fn page_resources<'a>(doc: &'a Document, page: &'a Dictionary) -> Option<&'a Dictionary> {
    let mut current = page;
    for _ in 0..MAX_REFERENCE_HOPS {
        if let Some(resources) = get_dict(doc, current, b"Resources") {
            return Some(resources);
        }
        current = get_dict(doc, current, b"Parent")?;
    }
    None
}
