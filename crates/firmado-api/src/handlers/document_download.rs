use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, Response, StatusCode},
    response::IntoResponse,
};
use bytes::Bytes;
use firmado_core::models::PDF_CONTENT_TYPE;
use firmado_core::AppError;
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/documents/{id}/file",
    tag = "documents",
    params(
        ("id" = Uuid, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Document file", content_type = "application/octet-stream"),
        (status = 404, description = "Document not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn download_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    // Get document metadata
    let document = state
        .db
        .repository
        .find(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

    tracing::debug!(
        document_id = %id,
        storage_key = %document.stored_name,
        "Serving document from storage"
    );

    let data = state
        .documents
        .storage
        .load(&document.stored_name)
        .await
        .map_err(HttpAppError::from)?;

    // The stored artifact may be the converted PDF even when the upload was DOCX;
    // content_type tracks the stored artifact, original_name stays the upload name.
    let content_disposition = format!("attachment; filename=\"{}\"", document.original_name);

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, document.content_type.as_str())
        .header(header::CONTENT_DISPOSITION, content_disposition.as_str())
        .body(Body::from(Bytes::from(data)))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}

#[utoipa::path(
    get,
    path = "/api/documents/{id}/signed-file",
    tag = "documents",
    params(
        ("id" = Uuid, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Signed document file", content_type = "application/pdf"),
        (status = 404, description = "Document not found or not signed", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn download_signed_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let document = state
        .db
        .repository
        .find(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

    let signed_name = document
        .signed_name
        .as_deref()
        .ok_or_else(|| AppError::NotFound("Document has not been signed".to_string()))?;

    tracing::debug!(
        document_id = %id,
        storage_key = %signed_name,
        "Serving signed document from storage"
    );

    let data = state
        .documents
        .storage
        .load(signed_name)
        .await
        .map_err(HttpAppError::from)?;

    let content_disposition = format!("attachment; filename=\"{}\"", signed_name);

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, PDF_CONTENT_TYPE)
        .header(header::CONTENT_DISPOSITION, content_disposition.as_str())
        .body(Body::from(Bytes::from(data)))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}
