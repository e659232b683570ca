//! Application setup and initialization
//!
//! This module contains all application initialization logic extracted from main.rs
//! for better organization and testability.

pub mod database;
pub mod routes;
pub mod server;

use crate::state::{AppState, DbState, DocumentsConfig, SigningState};
use anyhow::{Context, Result};
use firmado_core::Config;
use firmado_db::{DocumentRepository, PgDocumentRepository};
use firmado_signing::{Converter, SigningPipeline, SofficeConverter};
use firmado_storage::{LocalStorage, Storage};
use std::sync::Arc;
use std::time::Duration;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;

    // Initialize telemetry first
    crate::telemetry::init_telemetry();

    tracing::info!("Configuration loaded and validated successfully");

    // Setup database
    let pool = database::setup_database(&config).await?;

    // Setup storage
    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(&config.upload_dir)
            .await
            .context("Failed to initialize local storage")?,
    );

    let repository: Arc<dyn DocumentRepository> =
        Arc::new(PgDocumentRepository::new(pool.clone()));

    let converter: Arc<dyn Converter> = Arc::new(SofficeConverter::new(
        config.soffice_path.clone(),
        Duration::from_secs(config.convert_timeout_secs),
    ));

    let key_material = config.key_material();
    let digital_enabled = key_material.is_some();
    if digital_enabled {
        tracing::info!("Signing key store configured, digital signing enabled");
    } else {
        tracing::info!("No signing key store configured, digital signing disabled");
    }

    let pipeline = Arc::new(SigningPipeline::new(
        storage.clone(),
        repository.clone(),
        converter,
        key_material,
        config.signing_reason.clone(),
    ));

    let state = Arc::new(AppState {
        db: DbState {
            pool: Some(pool),
            repository,
        },
        documents: DocumentsConfig {
            storage,
            max_file_size: config.max_file_size_bytes,
            allowed_content_types: config.allowed_content_types.clone(),
        },
        signing: SigningState {
            pipeline,
            digital_enabled,
        },
        config,
    });

    // Setup routes
    let router = routes::setup_routes(state.clone());

    Ok((state, router))
}
