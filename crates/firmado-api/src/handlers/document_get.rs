use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use firmado_core::models::DocumentResponse;
use firmado_core::AppError;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/documents/{id}",
    tag = "documents",
    params(
        ("id" = Uuid, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Document found", body = DocumentResponse),
        (status = 404, description = "Document not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentResponse>, HttpAppError> {
    let document = state
        .db
        .repository
        .find(id)
        .await
        .map_err(HttpAppError::from)?
        .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

    Ok(Json(DocumentResponse::from(document)))
}

#[derive(Deserialize, ToSchema, utoipa::IntoParams)]
pub struct ListQuery {
    /// Owner whose documents to list
    pub owner_id: Option<Uuid>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

#[utoipa::path(
    get,
    path = "/api/documents",
    tag = "documents",
    params(
        ListQuery
    ),
    responses(
        (status = 200, description = "Documents owned by the given owner, most recent first", body = Vec<DocumentResponse>),
        (status = 400, description = "Missing owner_id", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<DocumentResponse>>, HttpAppError> {
    let owner_id = query
        .owner_id
        .ok_or_else(|| AppError::InvalidInput("owner_id query parameter is required".to_string()))?;

    // Enforce maximum limit to prevent abuse
    let limit = query.limit.clamp(1, 100);
    let offset = query.offset.max(0);

    let documents = state
        .db
        .repository
        .list_by_owner(owner_id, limit, offset)
        .await
        .map_err(HttpAppError::from)?;

    Ok(Json(
        documents.into_iter().map(DocumentResponse::from).collect(),
    ))
}
