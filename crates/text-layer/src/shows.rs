//! Where each string pdf-extract shows comes from in the page content.
//!
//! pdf-extract reports one `begin_word`/`end_word` pair per string it shows:
//! every `Tj` operand and every string element of a `TJ` array, in content
//! order, descending into XObjects through `Do`. Walking the same operations
//! in the same order pairs each reported string with its operation index.

use crate::objects::{get, get_dict, get_name};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};

const MAX_FORM_DEPTH: usize = 8;

/// One string shown by a text operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ShowSite {
    pub op_index: usize,
    /// Position inside a `TJ` array; `None` for `Tj`.
    pub element: Option<usize>,
    pub byte_len: usize,
    /// False for strings drawn inside a Form XObject.
    pub page_level: bool,
}

/// Every string the page shows, in the order pdf-extract reports them.
///
/// Returns `None` when an XObject cannot be followed, since the pairing
/// would no longer line up.
pub(crate) fn show_sites(doc: &Document, operations: &[Operation], resources: Option<&Dictionary>) -> Option<Vec<ShowSite>> {
    let mut sites = Vec::new();
    walk(doc, operations, resources, 0, &mut sites)?;
    Some(sites)
}

fn walk(
    doc: &Document,
    operations: &[Operation],
    resources: Option<&Dictionary>,
    depth: usize,
    sites: &mut Vec<ShowSite>,
) -> Option<()> {
    let page_level = depth == 0;
    for (op_index, op) in operations.iter().enumerate() {
        match (op.operator.as_str(), op.operands.first()) {
            ("Tj", Some(Object::String(bytes, _))) => {
                sites.push(ShowSite { op_index, element: None, byte_len: bytes.len(), page_level });
            }
            ("TJ", Some(Object::Array(elements))) => {
                for (element, obj) in elements.iter().enumerate() {
                    if let Object::String(bytes, _) = obj {
                        sites.push(ShowSite { op_index, element: Some(element), byte_len: bytes.len(), page_level });
                    }
                }
            }
            ("Do", Some(Object::Name(name))) => {
                if depth >= MAX_FORM_DEPTH {
                    return None;
                }
                let resources = resources?;
                let stream = get(doc, get_dict(doc, resources, b"XObject")?, name)?.as_stream().ok()?;
                let form_resources = get_dict(doc, &stream.dict, b"Resources").or(Some(resources));
                let operations = form_operations(stream)?;
                walk(doc, &operations, form_resources, depth + 1, sites)?;
            }
            _ => {}
        }
    }
    Some(())
}

fn form_operations(stream: &Stream) -> Option<Vec<Operation>> {
    let bytes = if stream.filters().is_ok() {
        stream.decompressed_content().unwrap_or_else(|_| stream.content.clone())
    } else {
        stream.content.clone()
    };
    Content::decode(&bytes).ok().map(|content| content.operations)
}

/// True for XObjects that hold sampled image data rather than content.
pub(crate) fn is_image(doc: &Document, stream: &Stream) -> bool {
    get_name(doc, &stream.dict, b"Subtype") == Some(b"Image".as_slice())
}
