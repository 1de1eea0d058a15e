//! Glyph retirement: removing glyphs from text-showing operations in place.
//!
//! Each retired glyph is replaced by a `TJ` displacement equal to its advance,
//! so every glyph drawn after it keeps its position.

use crate::error::ComposerError;
use folio_types::{GlyphRun, GlyphSource};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, StringFormat, dictionary};
use std::collections::BTreeMap;

/// Removes the glyphs of `runs` from the page's content and returns how many were removed.
///
/// Sources must refer to the page's decoded operation list as extracted from the
/// same document state. The page ends up with a single content stream.
pub fn retire_glyph_runs(doc: &mut Document, page_id: ObjectId, runs: &[GlyphRun]) -> Result<usize, ComposerError> {
    let mut by_op: BTreeMap<usize, Vec<GlyphSource>> = BTreeMap::new();
    for source in runs.iter().flat_map(|r| r.sources.iter()) {
        let entry = by_op.entry(source.op_index).or_default();
        if !entry.iter().any(|s| s.element == source.element && s.byte_start == source.byte_start) {
            entry.push(*source);
        }
    }
    if by_op.is_empty() {
        return Ok(0);
    }

    let bytes = doc.get_page_content(page_id)?;
    let mut content =
        Content::decode(&bytes).map_err(|e| ComposerError::UndecodableContent(page_id, e.to_string()))?;

    let mut retired = 0;
    // Descending order keeps lower indices valid while operations are split.
    for (&op_index, sources) in by_op.iter().rev() {
        let Some(op) = content.operations.get(op_index) else {
            log::warn!("[RETIRE] Operation {} is out of range on page {:?}", op_index, page_id);
            continue;
        };
        match rewrite_operation(op, sources) {
            Some(replacement) => {
                retired += sources.len();
                let tail = content.operations.split_off(op_index + 1);
                content.operations.pop();
                content.operations.extend(replacement);
                content.operations.extend(tail);
            }
            None => log::warn!(
                "[RETIRE] Operation {} ('{}') does not match its glyph sources; left untouched",
                op_index,
                op.operator
            ),
        }
    }

    let mut stream = Stream::new(dictionary! {}, content.encode()?);
    if let Err(e) = stream.compress() {
        log::debug!("[RETIRE] Content stream left uncompressed: {}", e);
    }
    let content_id = doc.add_object(stream);
    doc.get_object_mut(page_id)?.as_dict_mut()?.set("Contents", Object::Reference(content_id));
    Ok(retired)
}

fn rewrite_operation(op: &Operation, sources: &[GlyphSource]) -> Option<Vec<Operation>> {
    match op.operator.as_str() {
        "Tj" => {
            let items = retire_in_string(op.operands.first()?, sources)?;
            Some(vec![Operation::new("TJ", vec![Object::Array(items)])])
        }
        "'" => {
            let items = retire_in_string(op.operands.first()?, sources)?;
            Some(vec![Operation::new("T*", vec![]), Operation::new("TJ", vec![Object::Array(items)])])
        }
        "\"" => {
            let items = retire_in_string(op.operands.get(2)?, sources)?;
            Some(vec![
                Operation::new("Tw", vec![op.operands.first()?.clone()]),
                Operation::new("Tc", vec![op.operands.get(1)?.clone()]),
                Operation::new("T*", vec![]),
                Operation::new("TJ", vec![Object::Array(items)]),
            ])
        }
        "TJ" => {
            let Object::Array(elements) = op.operands.first()? else {
                return None;
            };
            let mut by_element: BTreeMap<usize, Vec<GlyphSource>> = BTreeMap::new();
            for source in sources {
                by_element.entry(source.element?).or_default().push(*source);
            }
            let mut items = Vec::with_capacity(elements.len() + sources.len());
            for (index, element) in elements.iter().enumerate() {
                match by_element.get(&index) {
                    Some(element_sources) => items.extend(retire_in_string(element, element_sources)?),
                    None => items.push(element.clone()),
                }
            }
            Some(vec![Operation::new("TJ", vec![Object::Array(merge_adjustments(items))])])
        }
        _ => None,
    }
}

/// Splits a string operand around the retired byte ranges.
fn retire_in_string(operand: &Object, sources: &[GlyphSource]) -> Option<Vec<Object>> {
    let Object::String(bytes, format) = operand else {
        return None;
    };
    let mut sorted: Vec<&GlyphSource> = sources.iter().collect();
    sorted.sort_by_key(|s| s.byte_start);

    let mut items = Vec::new();
    let mut cursor = 0;
    for source in sorted {
        if source.byte_start < cursor || source.byte_end > bytes.len() || source.byte_start >= source.byte_end {
            return None;
        }
        push_string(&mut items, &bytes[cursor..source.byte_start], *format);
        items.push(Object::Real(source.compensation));
        cursor = source.byte_end;
    }
    push_string(&mut items, &bytes[cursor..], *format);
    Some(merge_adjustments(items))
}

fn push_string(items: &mut Vec<Object>, bytes: &[u8], format: StringFormat) {
    if !bytes.is_empty() {
        items.push(Object::String(bytes.to_vec(), format));
    }
}

/// Sums adjacent numeric adjustments so the array stays compact.
fn merge_adjustments(items: Vec<Object>) -> Vec<Object> {
    let mut merged: Vec<Object> = Vec::with_capacity(items.len());
    for item in items {
        if let (Some(v), Some(prev)) = (adjustment(&item), merged.last().and_then(adjustment)) {
            if let Some(last) = merged.last_mut() {
                *last = Object::Real(prev + v);
            }
            continue;
        }
        merged.push(item);
    }
    merged
}

fn adjustment(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}
