use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use firmado_core::models::{DocumentResponse, SigningMode};
use firmado_core::AppError;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SignRequest {
    /// Name shown in the stamp ("Firmado por: ...") or recorded in the digital signature
    #[validate(length(
        min = 1,
        max = 255,
        message = "signer_label must be between 1 and 255 characters"
    ))]
    pub signer_label: String,
    /// "visual" (default) or "digital"
    #[serde(default)]
    pub mode: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/documents/{id}/sign",
    tag = "documents",
    params(
        ("id" = Uuid, Path, description = "Document ID")
    ),
    request_body = SignRequest,
    responses(
        (status = 200, description = "Document signed", body = DocumentResponse),
        (status = 400, description = "Invalid input, unknown mode, or document already signed", body = ErrorResponse),
        (status = 404, description = "Document not found", body = ErrorResponse),
        (status = 422, description = "Stored document is not a well-formed PDF", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, body),
    fields(
        document_id = %id,
        mode = ?body.mode,
        operation = "sign_document"
    )
)]
pub async fn sign_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<SignRequest>,
) -> Result<Json<DocumentResponse>, HttpAppError> {
    body.validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;
    let mode = SigningMode::parse(body.mode.as_deref()).map_err(HttpAppError::from)?;

    let document = state
        .signing
        .pipeline
        .sign(id, &body.signer_label, mode)
        .await
        .map_err(HttpAppError::from)?;

    Ok(Json(DocumentResponse::from(document)))
}
