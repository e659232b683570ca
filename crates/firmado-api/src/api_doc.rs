//! OpenAPI documentation.
//! Served at `/api/openapi.json`; RapiDoc renders it at `/docs`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use firmado_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Firmado API",
        version = "0.1.0",
        description = "Document signing API: upload PDF or DOCX documents, sign them visually (stamp on every page) or digitally (embedded CMS signature), and download the results. All endpoints live under /api/."
    ),
    paths(
        // Documents
        handlers::document_upload::upload_document,
        handlers::document_get::get_document,
        handlers::document_get::list_documents,
        handlers::document_download::download_document,
        handlers::document_download::download_signed_document,
        handlers::document_delete::delete_document,
        // Signing
        handlers::document_sign::sign_document,
        handlers::document_signed::register_signed_document,
        // Health
        handlers::health::health_check,
    ),
    components(
        schemas(
            models::DocumentResponse,
            models::SigningMode,
            handlers::document_sign::SignRequest,
            handlers::document_get::ListQuery,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "documents", description = "Document upload, signing, and download operations"),
        (name = "health", description = "Service health checks")
    )
)]
pub struct ApiDoc;
