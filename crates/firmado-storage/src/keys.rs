//! Shared key generation for storage backends.
//!
//! Key format: `{uuid}_{sanitized_filename}`. The UUID prefix guarantees
//! uniqueness; sanitization keeps user-supplied names out of path semantics.

use uuid::Uuid;

const MAX_NAME_LEN: usize = 255;
const DEFAULT_NAME: &str = "document";

/// Sanitize a user-supplied filename for use inside a storage key.
///
/// Directory components are stripped, every character outside
/// `[A-Za-z0-9._-]` becomes `_`, and the result is capped at 255 characters.
/// Names that are empty after sanitization (or contain `..`) fall back to a
/// default name.
pub fn sanitize_file_name(filename: &str) -> String {
    let base = std::path::Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    if base.contains("..") {
        return DEFAULT_NAME.to_string();
    }

    let sanitized: String = base
        .chars()
        .take(MAX_NAME_LEN)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        DEFAULT_NAME.to_string()
    } else {
        sanitized
    }
}

/// Generate a storage key for the given original filename.
///
/// Produces `{uuid}_{sanitized_filename}` with a fresh v4 UUID. All write
/// paths must use this format for consistency.
pub fn generate_storage_key(original_name: &str) -> String {
    format!("{}_{}", Uuid::new_v4(), sanitize_file_name(original_name))
}
