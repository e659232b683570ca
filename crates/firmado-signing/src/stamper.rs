//! Visual signature stamping
//!
//! Overlays a `Firmado por: <label>` line near the lower-left corner of every
//! page. The stamp is drawn with a bold serif Type1 font registered once in
//! the document and referenced from each page's resources.

use lopdf::content::Operation;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, StringFormat};

use crate::error::{SigningError, SigningResult};

const STAMP_FONT_RESOURCE: &str = "FirmadoStamp";
const STAMP_FONT_SIZE: i64 = 12;
const STAMP_MARGIN: f64 = 40.0;

/// Stamp `Firmado por: <signer_label>` on every page of a PDF.
///
/// The anchor point is the page's media box lower-left corner offset by the
/// stamp margin, so the text lands in the same spot regardless of page size.
/// Returns the re-serialized document.
pub fn stamp_visual(pdf_bytes: &[u8], signer_label: &str) -> SigningResult<Vec<u8>> {
    let mut document = Document::load_mem(pdf_bytes)
        .map_err(|e| SigningError::DocumentCorrupt(format!("Failed to parse PDF: {}", e)))?;

    let pages: Vec<ObjectId> = document.get_pages().into_values().collect();
    if pages.is_empty() {
        return Err(SigningError::DocumentCorrupt(
            "PDF has no pages".to_string(),
        ));
    }

    let font_id = document.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Times-Bold",
        "Encoding" => "WinAnsiEncoding",
    });

    let text = format!("Firmado por: {}", signer_label);
    for page_id in pages {
        let (x, y) = stamp_anchor(&document, page_id)?;
        register_stamp_font(&mut document, page_id, font_id)?;
        append_stamp_text(&mut document, page_id, &text, x, y)?;
    }

    let mut output = Vec::new();
    document.save_to(&mut output).map_err(|e| {
        SigningError::DocumentCorrupt(format!("Failed to serialize stamped PDF: {}", e))
    })?;
    Ok(output)
}

/// Lower-left media box corner plus the stamp margin.
///
/// MediaBox is inheritable, so the page's parent chain is walked until an
/// entry turns up.
fn stamp_anchor(document: &Document, page_id: ObjectId) -> SigningResult<(f64, f64)> {
    let mut current = Some(page_id);
    while let Some(id) = current {
        let dict = page_dict(document, id)?;
        if let Some((llx, lly)) = media_box_lower_left(document, dict) {
            return Ok((llx + STAMP_MARGIN, lly + STAMP_MARGIN));
        }
        current = dict.get(b"Parent").and_then(|p| p.as_reference()).ok();
    }
    Err(SigningError::DocumentCorrupt(
        "Page has no MediaBox".to_string(),
    ))
}

fn page_dict(document: &Document, id: ObjectId) -> SigningResult<&Dictionary> {
    document
        .get_object(id)
        .and_then(|obj| obj.as_dict())
        .map_err(|e| SigningError::DocumentCorrupt(format!("Invalid page object: {}", e)))
}

fn media_box_lower_left(document: &Document, dict: &Dictionary) -> Option<(f64, f64)> {
    let raw = dict.get(b"MediaBox").ok()?;
    let resolved = match raw {
        Object::Reference(id) => document.get_object(*id).ok()?,
        other => other,
    };
    let array = resolved.as_array().ok()?;
    if array.len() != 4 {
        return None;
    }
    let llx = object_to_f64(&array[0])?;
    let lly = object_to_f64(&array[1])?;
    Some((llx, lly))
}

fn object_to_f64(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some((*f).into()),
        _ => None,
    }
}

/// Make the stamp font reachable from the page's resources.
///
/// Resources may be inherited or indirect; the effective dictionary is
/// materialized directly onto the page so the addition never leaks into
/// sibling pages.
fn register_stamp_font(
    document: &mut Document,
    page_id: ObjectId,
    font_id: ObjectId,
) -> SigningResult<()> {
    let mut resources = effective_resources(document, page_id)?.unwrap_or_default();

    let mut fonts = match resources.get(b"Font") {
        Ok(Object::Dictionary(existing)) => existing.clone(),
        Ok(Object::Reference(id)) => document
            .get_object(*id)
            .and_then(|obj| obj.as_dict())
            .map(|dict| dict.clone())
            .unwrap_or_default(),
        _ => Dictionary::new(),
    };
    fonts.set(STAMP_FONT_RESOURCE, Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));

    let page = document
        .get_object_mut(page_id)
        .and_then(|obj| obj.as_dict_mut())
        .map_err(|e| SigningError::DocumentCorrupt(format!("Invalid page object: {}", e)))?;
    page.set("Resources", Object::Dictionary(resources));
    Ok(())
}

fn effective_resources(
    document: &Document,
    page_id: ObjectId,
) -> SigningResult<Option<Dictionary>> {
    let mut current = Some(page_id);
    while let Some(id) = current {
        let dict = page_dict(document, id)?;
        if let Ok(raw) = dict.get(b"Resources") {
            let resolved = match raw {
                Object::Reference(res_id) => document
                    .get_object(*res_id)
                    .and_then(|obj| obj.as_dict())
                    .map_err(|e| {
                        SigningError::DocumentCorrupt(format!("Invalid Resources: {}", e))
                    })?,
                Object::Dictionary(d) => d,
                _ => {
                    return Err(SigningError::DocumentCorrupt(
                        "Resources is not a dictionary".to_string(),
                    ));
                }
            };
            return Ok(Some(resolved.clone()));
        }
        current = dict.get(b"Parent").and_then(|p| p.as_reference()).ok();
    }
    Ok(None)
}

fn append_stamp_text(
    document: &mut Document,
    page_id: ObjectId,
    text: &str,
    x: f64,
    y: f64,
) -> SigningResult<()> {
    let mut content = document.get_and_decode_page_content(page_id).map_err(|e| {
        SigningError::DocumentCorrupt(format!("Failed to decode page content: {}", e))
    })?;

    content.operations.push(Operation::new("q", vec![]));
    content.operations.push(Operation::new("BT", vec![]));
    content.operations.push(Operation::new(
        "Tf",
        vec![
            Object::Name(STAMP_FONT_RESOURCE.into()),
            STAMP_FONT_SIZE.into(),
        ],
    ));
    content.operations.push(Operation::new(
        "Td",
        vec![Object::Real(x as f32), Object::Real(y as f32)],
    ));
    content.operations.push(Operation::new(
        "Tj",
        vec![Object::String(
            encode_win_ansi(text),
            StringFormat::Literal,
        )],
    ));
    content.operations.push(Operation::new("ET", vec![]));
    content.operations.push(Operation::new("Q", vec![]));

    let encoded = content.encode().map_err(|e| {
        SigningError::DocumentCorrupt(format!("Failed to encode page content: {}", e))
    })?;
    document.change_page_content(page_id, encoded).map_err(|e| {
        SigningError::DocumentCorrupt(format!("Failed to update page content: {}", e))
    })?;
    Ok(())
}

/// Map to WinAnsi single-byte codes; code points outside Latin-1 degrade to `?`.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if (c as u32) <= 0xFF { c as u8 } else { b'?' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf_fixtures;

    fn stamp_operations(stamped: &[u8], label: &str) -> Vec<(u32, Vec<Operation>)> {
        let document = Document::load_mem(stamped).unwrap();
        let expected = encode_win_ansi(&format!("Firmado por: {}", label));
        document
            .get_pages()
            .into_iter()
            .map(|(number, page_id)| {
                let content = document.get_and_decode_page_content(page_id).unwrap();
                let matching = content
                    .operations
                    .into_iter()
                    .filter(|op| {
                        op.operator == "Tj"
                            && matches!(
                                op.operands.first(),
                                Some(Object::String(bytes, _)) if *bytes == expected
                            )
                    })
                    .collect();
                (number, matching)
            })
            .collect()
    }

    #[test]
    fn test_stamps_every_page_once() {
        let pdf = pdf_fixtures::build_pdf(3);
        let stamped = stamp_visual(&pdf, "Ana Torres").unwrap();

        let per_page = stamp_operations(&stamped, "Ana Torres");
        assert_eq!(per_page.len(), 3);
        for (number, ops) in per_page {
            assert_eq!(ops.len(), 1, "page {} should carry exactly one stamp", number);
        }
    }

    #[test]
    fn test_stamp_anchor_offsets_media_box_origin() {
        let pdf = pdf_fixtures::build_pdf(1);
        let stamped = stamp_visual(&pdf, "Ana Torres").unwrap();

        let document = Document::load_mem(&stamped).unwrap();
        let page_id = document.get_pages().into_values().next().unwrap();
        let content = document.get_and_decode_page_content(page_id).unwrap();

        let td = content
            .operations
            .iter()
            .rev()
            .find(|op| op.operator == "Td")
            .unwrap();
        assert_eq!(td.operands[0], Object::Real(40.0));
        assert_eq!(td.operands[1], Object::Real(40.0));
    }

    #[test]
    fn test_stamp_resolves_inherited_media_box() {
        // build_pdf keeps MediaBox and Resources on the Pages node, so every
        // stamped page exercises the parent-chain walk
        let pdf = pdf_fixtures::build_pdf(2);
        assert!(stamp_visual(&pdf, "Ana Torres").is_ok());
    }

    #[test]
    fn test_existing_content_is_preserved() {
        let pdf = pdf_fixtures::build_pdf(1);
        let original_ops = {
            let document = Document::load_mem(&pdf).unwrap();
            let page_id = document.get_pages().into_values().next().unwrap();
            document
                .get_and_decode_page_content(page_id)
                .unwrap()
                .operations
                .len()
        };

        let stamped = stamp_visual(&pdf, "Ana Torres").unwrap();
        let document = Document::load_mem(&stamped).unwrap();
        let page_id = document.get_pages().into_values().next().unwrap();
        let stamped_ops = document
            .get_and_decode_page_content(page_id)
            .unwrap()
            .operations
            .len();

        assert_eq!(stamped_ops, original_ops + 7);
    }

    #[test]
    fn test_latin1_label_is_kept_verbatim() {
        let pdf = pdf_fixtures::build_pdf(1);
        let stamped = stamp_visual(&pdf, "José Muñoz").unwrap();
        let per_page = stamp_operations(&stamped, "José Muñoz");
        assert_eq!(per_page[0].1.len(), 1);
    }

    #[test]
    fn test_garbage_input_reports_corrupt_document() {
        let result = stamp_visual(b"definitely not a pdf", "Ana Torres");
        assert!(matches!(result, Err(SigningError::DocumentCorrupt(_))));
    }
}
