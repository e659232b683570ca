use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::read_multipart_upload;
use axum::{
    extract::{Multipart, State},
    Json,
};
use firmado_core::models::DocumentResponse;
use firmado_core::AppError;
use firmado_signing::DocumentValidator;
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/api/documents",
    tag = "documents",
    responses(
        (status = 200, description = "Document uploaded successfully", body = DocumentResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<DocumentResponse>, HttpAppError> {
    let upload = read_multipart_upload(multipart).await?;

    let owner_id: Uuid = upload
        .text_field("owner_id")?
        .trim()
        .parse()
        .map_err(|_| AppError::InvalidInput("owner_id must be a valid UUID".to_string()))?;

    let validator = DocumentValidator::new(
        state.documents.max_file_size,
        state.documents.allowed_content_types.clone(),
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

    let document = match state
        .db
        .repository
        .create(
            owner_id,
            upload.file_name.clone(),
            stored_name.clone(),
            upload.content_type.clone(),
            size,
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
        content_type = %document.content_type,
        size = document.size,
        "Document uploaded"
    );

    Ok(Json(DocumentResponse::from(document)))
}
