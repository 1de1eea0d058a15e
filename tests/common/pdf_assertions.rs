use folio_text_layer::extract_page_at;
use lopdf::{Document, Object};

/// Text of the page at a 0-based index, lines joined by `\n`.
pub fn page_text(doc: &Document, index: usize) -> String {
    extract_page_at(doc, index).unwrap().text()
}

/// Whole words on the page at a 0-based index.
pub fn page_words(doc: &Document, index: usize) -> Vec<String> {
    extract_page_at(doc, index).unwrap().words.into_iter().map(|w| w.text).collect()
}

/// Number of entries in the page's `/Annots` array.
pub fn annotation_count(doc: &Document, index: usize) -> usize {
    let page_id = doc.get_pages().into_values().nth(index).unwrap();
    match doc.get_object(page_id).unwrap().as_dict().unwrap().get(b"Annots") {
        Ok(Object::Array(annots)) => annots.len(),
        _ => 0,
    }
}

/// Panics if any page still shows `token`.
pub fn assert_token_gone(doc: &Document, token: &str) {
    for index in 0..doc.get_pages().len() {
        let text = page_text(doc, index);
        assert!(!text.contains(token), "page {} still shows {}: {:?}", index + 1, token, text);
    }
}
