//! Detached CMS digital signatures
//!
//! A digital signature is appended as a PDF incremental update: the original
//! bytes stay untouched and a new revision adds the signature dictionary, a
//! signature widget on the first page, and the AcroForm wiring. The CMS
//! SignedData is computed over the whole file minus the `/Contents` hex slot
//! and spliced into the reserved placeholder afterwards.

use chrono::Utc;
use cryptographic_message_syntax::{Bytes, Oid, SignedDataBuilder, SignerBuilder};
use lopdf::{dictionary, Dictionary, Document, IncrementalDocument, Object, StringFormat};

use crate::byte_range::ByteRange;
use crate::error::{SigningError, SigningResult};
use crate::keystore::SigningKey;

/// Reserved space for the DER-encoded CMS structure, in bytes.
const SIGNATURE_PLACEHOLDER_LEN: usize = 8192;
/// ByteRange values as serialized before the offsets are known.
const BYTE_RANGE_SENTINEL: &str = "0 10000 20000 10000";
/// Width the final ByteRange list is padded to. Odd on purpose: the slack
/// swallowed from the hex area must leave it with an even character count.
const BYTE_RANGE_WIDTH: usize = 33;

/// Digitally sign a PDF with a detached CMS signature.
///
/// The returned bytes start with `pdf_bytes` verbatim; everything the
/// signature needs lives in the appended revision.
pub fn sign_digital(
    pdf_bytes: &[u8],
    signer_label: &str,
    reason: &str,
    signing_key: &SigningKey,
) -> SigningResult<Vec<u8>> {
    let document = Document::load_mem(pdf_bytes)
        .map_err(|e| SigningError::DocumentCorrupt(format!("Failed to parse PDF: {}", e)))?;
    let mut incremental = IncrementalDocument::create_from(pdf_bytes.to_vec(), document);

    append_signature_objects(&mut incremental, signer_label, reason)?;

    let mut serialized = Vec::new();
    incremental.save_to(&mut serialized).map_err(|e| {
        SigningError::SignatureGenerationFailed(format!("Failed to serialize signed PDF: {}", e))
    })?;

    let (byte_range, serialized) = reserve_signature_slot(serialized)?;
    let covered = byte_range.covered_bytes(&serialized)?;
    let signature = build_cms_signature(covered, signing_key)?;

    tracing::debug!(
        covered_ranges = ?byte_range.values(),
        signature_bytes = signature.len(),
        "CMS signature built"
    );

    embed_signature(serialized, &signature)
}

/// Add the signature value, its widget field, and the AcroForm entry to the
/// incremental revision.
fn append_signature_objects(
    incremental: &mut IncrementalDocument,
    signer_label: &str,
    reason: &str,
) -> SigningResult<()> {
    let prev = incremental.get_prev_documents();

    let first_page_id = prev.get_pages().into_values().next().ok_or_else(|| {
        SigningError::DocumentCorrupt("PDF has no pages".to_string())
    })?;
    let root_id = prev
        .trailer
        .get(b"Root")
        .and_then(|obj| obj.as_reference())
        .map_err(|e| SigningError::DocumentCorrupt(format!("Invalid trailer: {}", e)))?;
    let catalog = prev
        .get_object(root_id)
        .and_then(|obj| obj.as_dict())
        .map_err(|e| SigningError::DocumentCorrupt(format!("Invalid catalog: {}", e)))?;

    // Carry over any existing AcroForm and annotation state before mutating;
    // references are materialized as direct values in the new revision.
    let mut acro_form = catalog
        .get(b"AcroForm")
        .ok()
        .map(|raw| resolve(prev, raw))
        .and_then(|obj| obj.as_dict().ok())
        .cloned()
        .unwrap_or_default();
    let mut fields = acro_form
        .get(b"Fields")
        .ok()
        .map(|raw| resolve(prev, raw))
        .and_then(|obj| obj.as_array().ok())
        .cloned()
        .unwrap_or_default();
    let page = prev
        .get_object(first_page_id)
        .and_then(|obj| obj.as_dict())
        .map_err(|e| SigningError::DocumentCorrupt(format!("Invalid page object: {}", e)))?;
    let mut annotations = page
        .get(b"Annots")
        .ok()
        .map(|raw| resolve(prev, raw))
        .and_then(|obj| obj.as_array().ok())
        .cloned()
        .unwrap_or_default();
    let field_name = format!("Signature{}", fields.len() + 1);

    // ByteRange must immediately precede Contents: the serialized pair is
    // located by pattern and patched in place after writing.
    let now = Utc::now();
    let signature_id = incremental.new_document.add_object(dictionary! {
        "Type" => "Sig",
        "Filter" => "Adobe.PPKLite",
        "SubFilter" => "adbe.pkcs7.detached",
        "ByteRange" => vec![
            Object::Integer(0),
            Object::Integer(10_000),
            Object::Integer(20_000),
            Object::Integer(10_000),
        ],
        "Contents" => Object::String(
            vec![0; SIGNATURE_PLACEHOLDER_LEN],
            StringFormat::Hexadecimal,
        ),
        "M" => Object::String(
            now.format("D:%Y%m%d%H%M%S+00'00'").to_string().into_bytes(),
            StringFormat::Literal,
        ),
        "Name" => Object::String(signer_label.as_bytes().to_vec(), StringFormat::Literal),
        "Reason" => Object::String(reason.as_bytes().to_vec(), StringFormat::Literal),
    });

    // Merged signature field and widget annotation, invisible (zero rect),
    // printed and locked.
    let field_id = incremental.new_document.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Sig",
        "Rect" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(0),
        ],
        "F" => 132,
        "T" => Object::String(field_name.into_bytes(), StringFormat::Literal),
        "P" => Object::Reference(first_page_id),
        "V" => Object::Reference(signature_id),
    });

    incremental
        .opt_clone_object_to_new_document(first_page_id)
        .map_err(|e| SigningError::DocumentCorrupt(format!("Failed to clone page: {}", e)))?;
    annotations.push(Object::Reference(field_id));
    let page = incremental
        .new_document
        .get_object_mut(first_page_id)
        .and_then(|obj| obj.as_dict_mut())
        .map_err(|e| SigningError::DocumentCorrupt(format!("Invalid cloned page: {}", e)))?;
    page.set("Annots", annotations);

    incremental
        .opt_clone_object_to_new_document(root_id)
        .map_err(|e| SigningError::DocumentCorrupt(format!("Failed to clone catalog: {}", e)))?;
    fields.push(Object::Reference(field_id));
    acro_form.set("Fields", fields);
    acro_form.set("SigFlags", 3);
    let catalog = incremental
        .new_document
        .get_object_mut(root_id)
        .and_then(|obj| obj.as_dict_mut())
        .map_err(|e| SigningError::DocumentCorrupt(format!("Invalid cloned catalog: {}", e)))?;
    catalog.set("AcroForm", acro_form);

    Ok(())
}

fn resolve<'a>(document: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => document.get_object(*id).unwrap_or(object),
        other => other,
    }
}

/// Locate the serialized placeholder, compute the real byte range, and patch
/// it in without shifting any offsets.
fn reserve_signature_slot(mut data: Vec<u8>) -> SigningResult<(ByteRange, Vec<u8>)> {
    let mut pattern = format!("/ByteRange[{}]/Contents<", BYTE_RANGE_SENTINEL).into_bytes();
    pattern.extend(std::iter::repeat(b'0').take(51));
    let found_at = find_pattern(&data, &pattern).ok_or_else(|| {
        SigningError::SignatureGenerationFailed(
            "Signature placeholder not found in serialized PDF".to_string(),
        )
    })?;

    // Widening the ByteRange list from the sentinel to BYTE_RANGE_WIDTH
    // consumes the leading characters of the hex area.
    let prefix_len = "/ByteRange[]/Contents<".len() + BYTE_RANGE_WIDTH;
    let hex_len = 2 * SIGNATURE_PLACEHOLDER_LEN + BYTE_RANGE_SENTINEL.len() - BYTE_RANGE_WIDTH;
    let contents_offset = found_at + prefix_len - 1;

    let tail_len = data
        .len()
        .checked_sub(contents_offset + hex_len + 2)
        .ok_or_else(|| {
            SigningError::SignatureGenerationFailed(
                "Serialized PDF ends inside the signature placeholder".to_string(),
            )
        })?;
    let byte_range = ByteRange::new([
        0,
        contents_offset,
        contents_offset + hex_len + 2,
        tail_len,
    ]);

    let replacement = format!(
        "/ByteRange[{}]/Contents<{}",
        byte_range.to_list(BYTE_RANGE_WIDTH)?,
        "0".repeat(22)
    )
    .into_bytes();
    data.splice(found_at..found_at + replacement.len(), replacement);

    Ok((byte_range, data))
}

fn build_cms_signature(content: Vec<u8>, signing_key: &SigningKey) -> SigningResult<Vec<u8>> {
    SignedDataBuilder::default()
        .content_external(content)
        .content_type(Oid(Bytes::copy_from_slice(
            cryptographic_message_syntax::asn1::rfc5652::OID_ID_DATA.as_ref(),
        )))
        .signer(SignerBuilder::new(
            &signing_key.key_pair,
            signing_key.leaf_certificate.clone(),
        ))
        .certificates(signing_key.chain.iter().cloned())
        .build_der()
        .map_err(|e| {
            SigningError::SignatureGenerationFailed(format!("Failed to build CMS signature: {}", e))
        })
}

/// Splice the hex-encoded signature over the reserved zero run.
fn embed_signature(mut data: Vec<u8>, signature: &[u8]) -> SigningResult<Vec<u8>> {
    let hex_len = 2 * SIGNATURE_PLACEHOLDER_LEN + BYTE_RANGE_SENTINEL.len() - BYTE_RANGE_WIDTH;
    if signature.len() * 2 > hex_len {
        return Err(SigningError::SignatureGenerationFailed(format!(
            "Signature needs {} hex characters but only {} are reserved",
            signature.len() * 2,
            hex_len
        )));
    }

    let mut pattern = b"/Contents<".to_vec();
    pattern.extend(std::iter::repeat(b'0').take(51));
    let found_at = find_pattern(&data, &pattern).ok_or_else(|| {
        SigningError::SignatureGenerationFailed(
            "Signature slot not found in serialized PDF".to_string(),
        )
    })?;

    let replacement = format!("/Contents<{}", hex::encode(signature)).into_bytes();
    data.splice(found_at..found_at + replacement.len(), replacement);
    Ok(data)
}

fn find_pattern(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::{load_signing_key, SigningKey};
    use crate::pdf_fixtures;
    use cryptographic_message_syntax::SignedData;
    use firmado_core::KeyMaterial;
    use std::path::PathBuf;

    async fn test_signing_key() -> SigningKey {
        let key_material = KeyMaterial {
            store_path: PathBuf::from(env!("CARGO_MANIFEST_DIR"))
                .join("testdata")
                .join("signing.p12"),
            passphrase: "firmado-test".to_string(),
            alias: None,
        };
        load_signing_key(&key_material).await.unwrap()
    }

    fn signature_dict(document: &Document) -> Dictionary {
        let root_id = document.trailer.get(b"Root").unwrap().as_reference().unwrap();
        let catalog = document.get_object(root_id).unwrap().as_dict().unwrap();
        let acro_form = catalog.get(b"AcroForm").unwrap().as_dict().unwrap();
        assert_eq!(acro_form.get(b"SigFlags").unwrap().as_i64().unwrap(), 3);

        let fields = acro_form.get(b"Fields").unwrap().as_array().unwrap();
        assert_eq!(fields.len(), 1);
        let field_id = fields[0].as_reference().unwrap();
        let field = document.get_object(field_id).unwrap().as_dict().unwrap();
        assert_eq!(field.get(b"FT").unwrap().as_name().unwrap(), b"Sig");
        assert_eq!(
            field.get(b"T").unwrap().as_str().unwrap(),
            b"Signature1"
        );

        let value_id = field.get(b"V").unwrap().as_reference().unwrap();
        document
            .get_object(value_id)
            .unwrap()
            .as_dict()
            .unwrap()
            .clone()
    }

    fn byte_range_values(signature: &Dictionary) -> [usize; 4] {
        let array = signature.get(b"ByteRange").unwrap().as_array().unwrap();
        let mut values = [0usize; 4];
        for (slot, object) in values.iter_mut().zip(array.iter()) {
            *slot = object.as_i64().unwrap() as usize;
        }
        values
    }

    // Total length of the outermost DER TLV, used to strip zero padding.
    fn der_total_len(bytes: &[u8]) -> usize {
        assert_eq!(bytes[0], 0x30);
        let first = bytes[1];
        if first & 0x80 == 0 {
            2 + first as usize
        } else {
            let octets = (first & 0x7f) as usize;
            let mut len = 0usize;
            for byte in &bytes[2..2 + octets] {
                len = (len << 8) | *byte as usize;
            }
            2 + octets + len
        }
    }

    #[tokio::test]
    async fn test_signed_output_extends_original() {
        let pdf = pdf_fixtures::build_pdf(1);
        let key = test_signing_key().await;
        let signed = sign_digital(&pdf, "Ana Torres", "Firmado electronicamente", &key).unwrap();

        assert!(signed.len() > pdf.len());
        assert_eq!(&signed[..pdf.len()], &pdf[..]);
    }

    #[tokio::test]
    async fn test_signature_dictionary_wiring() {
        let pdf = pdf_fixtures::build_pdf(2);
        let key = test_signing_key().await;
        let signed = sign_digital(&pdf, "Ana Torres", "Aprobado", &key).unwrap();

        let document = Document::load_mem(&signed).unwrap();
        let signature = signature_dict(&document);
        assert_eq!(signature.get(b"Type").unwrap().as_name().unwrap(), b"Sig");
        assert_eq!(
            signature.get(b"Filter").unwrap().as_name().unwrap(),
            b"Adobe.PPKLite"
        );
        assert_eq!(
            signature.get(b"SubFilter").unwrap().as_name().unwrap(),
            b"adbe.pkcs7.detached"
        );
        assert_eq!(
            signature.get(b"Name").unwrap().as_str().unwrap(),
            b"Ana Torres"
        );
        assert_eq!(
            signature.get(b"Reason").unwrap().as_str().unwrap(),
            b"Aprobado"
        );
    }

    #[tokio::test]
    async fn test_byte_range_brackets_the_contents_slot() {
        let pdf = pdf_fixtures::build_pdf(1);
        let key = test_signing_key().await;
        let signed = sign_digital(&pdf, "Ana Torres", "Aprobado", &key).unwrap();

        let document = Document::load_mem(&signed).unwrap();
        let values = byte_range_values(&signature_dict(&document));

        assert_eq!(values[0], 0);
        assert_eq!(signed[values[1]], b'<');
        assert_eq!(signed[values[2] - 1], b'>');
        assert_eq!(values[2] + values[3], signed.len());
    }

    #[tokio::test]
    async fn test_first_page_gains_signature_widget() {
        let pdf = pdf_fixtures::build_pdf(2);
        let key = test_signing_key().await;
        let signed = sign_digital(&pdf, "Ana Torres", "Aprobado", &key).unwrap();

        let document = Document::load_mem(&signed).unwrap();
        let page_id = document.get_pages().into_values().next().unwrap();
        let page = document.get_object(page_id).unwrap().as_dict().unwrap();
        let annotations = page.get(b"Annots").unwrap().as_array().unwrap();
        assert_eq!(annotations.len(), 1);

        let widget_id = annotations[0].as_reference().unwrap();
        let widget = document.get_object(widget_id).unwrap().as_dict().unwrap();
        assert_eq!(widget.get(b"Subtype").unwrap().as_name().unwrap(), b"Widget");
        assert_eq!(widget.get(b"P").unwrap().as_reference().unwrap(), page_id);
    }

    #[tokio::test]
    async fn test_cms_signature_verifies_over_covered_bytes() {
        let pdf = pdf_fixtures::build_pdf(1);
        let key = test_signing_key().await;
        let signed = sign_digital(&pdf, "Ana Torres", "Aprobado", &key).unwrap();

        let document = Document::load_mem(&signed).unwrap();
        let signature = signature_dict(&document);
        let values = byte_range_values(&signature);

        let mut covered = Vec::new();
        covered.extend_from_slice(&signed[..values[1]]);
        covered.extend_from_slice(&signed[values[2]..values[2] + values[3]]);

        let padded = signature.get(b"Contents").unwrap().as_str().unwrap();
        let der = &padded[..der_total_len(padded)];

        let signed_data = SignedData::parse_ber(der).unwrap();
        for signer in signed_data.signers() {
            signer.verify_signature_with_signed_data(&signed_data).unwrap();
            signer.verify_message_digest_with_content(&covered).unwrap();
        }
    }

    #[tokio::test]
    async fn test_garbage_input_reports_corrupt_document() {
        let key = test_signing_key().await;
        let result = sign_digital(b"definitely not a pdf", "Ana Torres", "Aprobado", &key);
        assert!(matches!(result, Err(SigningError::DocumentCorrupt(_))));
    }
}
