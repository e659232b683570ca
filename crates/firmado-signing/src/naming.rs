//! Artifact naming conventions
//!
//! Signed artifacts keep the source document's stored name with a mode suffix
//! spliced in before the extension. Converted PDFs reuse the upload's original
//! filename with the extension swapped to `.pdf`.

use firmado_core::SigningMode;

const VISUAL_SUFFIX: &str = "_Firmado";
const DIGITAL_SUFFIX: &str = "_signed";

/// Derive the signed artifact name from a stored document name.
///
/// `contrato.pdf` becomes `contrato_Firmado.pdf` for a visual signature and
/// `contrato_signed.pdf` for a digital one. Names without an extension get the
/// suffix plus `.pdf` appended.
pub fn signed_file_name(stored_name: &str, mode: SigningMode) -> String {
    let suffix = match mode {
        SigningMode::Visual => VISUAL_SUFFIX,
        SigningMode::Digital => DIGITAL_SUFFIX,
    };
    match stored_name.rfind('.') {
        Some(dot) if dot > 0 => {
            format!("{}{}{}", &stored_name[..dot], suffix, &stored_name[dot..])
        }
        _ => format!("{}{}.pdf", stored_name, suffix),
    }
}

/// Replace an uploaded filename's extension with `.pdf`.
pub fn pdf_file_name(original_name: &str) -> String {
    match original_name.rfind('.') {
        Some(dot) if dot > 0 => format!("{}.pdf", &original_name[..dot]),
        _ => format!("{}.pdf", original_name),
    }
}
