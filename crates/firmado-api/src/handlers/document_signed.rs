use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::read_multipart_upload;
use axum::{
    extract::{Multipart, State},
    Json,
};
use chrono::{DateTime, Utc};
use firmado_core::models::{DocumentResponse, PDF_CONTENT_TYPE};
use firmado_core::AppError;
use firmado_signing::DocumentValidator;
use std::sync::Arc;
use uuid::Uuid;

/// Length of a hex-encoded SHA-256 digest.
const SHA256_HEX_LEN: usize = 64;

#[utoipa::path(
    post,
    path = "/api/documents/signed",
    tag = "documents",
    responses(
        (status = 200, description = "Signed document registered", body = DocumentResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn register_signed_document(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<DocumentResponse>, HttpAppError> {
    let upload = read_multipart_upload(multipart).await?;

    let owner_id: Uuid = upload
        .text_field("owner_id")?
        .trim()
        .parse()
        .map_err(|_| AppError::InvalidInput("owner_id must be a valid UUID".to_string()))?;

    let original_name = upload.text_field("original_name")?.trim().to_string();
    if original_name.is_empty() {
        return Err(AppError::InvalidInput("original_name must not be empty".to_string()).into());
    }

    let signature_hash = parse_signature_hash(upload.text_field("hash")?)?;

    let signed_at: DateTime<Utc> =
        DateTime::parse_from_rfc3339(upload.text_field("signed_at")?.trim())
            .map_err(|e| {
                AppError::InvalidInput(format!("signed_at must be an RFC 3339 timestamp: {}", e))
            })?
            .with_timezone(&Utc);

    // Only finished PDFs can be registered here; unsigned uploads go through POST /api/documents
    let validator = DocumentValidator::new(
        state.documents.max_file_size,
        vec![PDF_CONTENT_TYPE.to_string()],
    );
    validator
        .validate_all(&upload.file_name, &upload.content_type, upload.data.len())
        .map_err(HttpAppError::from)?;

    let size = upload.data.len() as i64;
    let stored_name = state
        .documents
        .storage
        .store(&upload.file_name, upload.data)
        .await
        .map_err(HttpAppError::from)?;

    // The artifact already carries its signature; one blob serves as both
    // stored_name and signed_name.
    let document = match state
        .db
        .repository
        .create_signed(
            owner_id,
            original_name,
            stored_name.clone(),
            PDF_CONTENT_TYPE.to_string(),
            size,
            stored_name.clone(),
            signature_hash,
            signed_at,
        )
        .await
    {
        Ok(document) => document,
        Err(e) => {
            // Cleanup storage on database failure
            if let Err(cleanup_err) = state.documents.storage.delete(&stored_name).await {
                tracing::debug!(
                    error = %cleanup_err,
                    storage_key = %stored_name,
                    "Failed to cleanup storage file after DB error"
                );
            }
            return Err(HttpAppError::from(e));
        }
    };

    tracing::info!(
        document_id = %document.id,
        owner_id = %document.owner_id,
        size = document.size,
        "Externally signed document registered"
    );

    Ok(Json(DocumentResponse::from(document)))
}

/// The hash field must be a hex-encoded SHA-256 digest; stored lowercase.
fn parse_signature_hash(raw: &str) -> Result<String, HttpAppError> {
    let hash = raw.trim();
    if hash.len() != SHA256_HEX_LEN || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AppError::InvalidInput(
            "hash must be a hex-encoded SHA-256 digest (64 hex characters)".to_string(),
        )
        .into());
    }
    Ok(hash.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_signature_hash_normalizes_to_lowercase() {
        let raw = "A".repeat(64);
        assert_eq!(parse_signature_hash(&raw).unwrap(), "a".repeat(64));
    }

    #[test]
    fn parse_signature_hash_trims_whitespace() {
        let raw = format!("  {}  ", "0f".repeat(32));
        assert_eq!(parse_signature_hash(&raw).unwrap(), "0f".repeat(32));
    }

    #[test]
    fn parse_signature_hash_rejects_wrong_length() {
        assert!(parse_signature_hash("abc123").is_err());
        assert!(parse_signature_hash(&"a".repeat(65)).is_err());
    }

    #[test]
    fn parse_signature_hash_rejects_non_hex() {
        let raw = format!("{}zz", "a".repeat(62));
        assert!(parse_signature_hash(&raw).is_err());
    }
}
