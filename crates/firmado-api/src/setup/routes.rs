//! Route configuration and setup.

use crate::constants::API_PREFIX;
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{delete, get, post},
    Json, Router,
};
use firmado_core::Config;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

/// Setup all application routes
pub fn setup_routes(state: Arc<AppState>) -> Router<()> {
    let cors = setup_cors(&state.config);

    let http_concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(10_000)
        .max(1);
    tracing::info!(
        http_concurrency_limit = http_concurrency_limit,
        "HTTP concurrency limit layer enabled"
    );

    let max_body_bytes = state.config.max_file_size_bytes;

    document_routes(state.clone())
        .route(
            &format!("{}/health", API_PREFIX),
            get(handlers::health::health_check),
        )
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::ApiDoc::openapi()) }),
        )
        .merge(RapiDoc::new("/api/openapi.json").path("/docs"))
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn setup_cors(config: &Config) -> CorsLayer {
    if config.cors_origins.contains(&"*".to_string()) {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins: Result<Vec<HeaderValue>, _> =
            config.cors_origins.iter().map(|o| o.parse()).collect();
        CorsLayer::new()
            .allow_origin(origins.unwrap_or_default())
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers(Any)
    }
}

fn document_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/documents", API_PREFIX),
            post(handlers::document_upload::upload_document),
        )
        .route(
            &format!("{}/documents", API_PREFIX),
            get(handlers::document_get::list_documents),
        )
        .route(
            &format!("{}/documents/signed", API_PREFIX),
            post(handlers::document_signed::register_signed_document),
        )
        .route(
            &format!("{}/documents/{{id}}", API_PREFIX),
            get(handlers::document_get::get_document),
        )
        .route(
            &format!("{}/documents/{{id}}", API_PREFIX),
            delete(handlers::document_delete::delete_document),
        )
        .route(
            &format!("{}/documents/{{id}}/sign", API_PREFIX),
            post(handlers::document_sign::sign_document),
        )
        .route(
            &format!("{}/documents/{{id}}/file", API_PREFIX),
            get(handlers::document_download::download_document),
        )
        .route(
            &format!("{}/documents/{{id}}/signed-file", API_PREFIX),
            get(handlers::document_download::download_signed_document),
        )
        .with_state(state)
}
