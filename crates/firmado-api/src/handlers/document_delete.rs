use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use firmado_core::AppError;
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    delete,
    path = "/api/documents/{id}",
    tag = "documents",
    params(
        ("id" = Uuid, Path, description = "Document ID")
    ),
    responses(
        (status = 204, description = "Document deleted successfully"),
        (status = 404, description = "Document not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpAppError> {
    let document = state
        .db
        .repository
        .find(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

    // Remove blobs first; a failed blob delete is logged, not fatal
    if let Err(e) = state.documents.storage.delete(&document.stored_name).await {
        tracing::debug!(
            error = %e,
            storage_key = %document.stored_name,
            "Failed to delete stored file"
        );
    }
    if let Some(signed_name) = &document.signed_name {
        // Externally registered documents share one blob for both names
        if signed_name != &document.stored_name {
            if let Err(e) = state.documents.storage.delete(signed_name).await {
                tracing::debug!(
                    error = %e,
                    storage_key = %signed_name,
                    "Failed to delete signed file"
                );
            }
        }
    }

    state
        .db
        .repository
        .delete(id)
        .await
        .map_err(HttpAppError::from)?;

    tracing::info!(document_id = %id, "Document deleted");

    Ok(StatusCode::NO_CONTENT)
}
