//! Application state and domain sub-states.
//!
//! AppState is split into domain sub-states so the setup code stays readable
//! and handlers only reach through the group they actually need.

use firmado_core::Config;
use firmado_db::DocumentRepository;
use firmado_signing::SigningPipeline;
use firmado_storage::Storage;
use sqlx::PgPool;
use std::sync::Arc;

// ----- Sub-state types -----

/// Database pool and document repository.
///
/// `pool` is `None` when the state is assembled over an in-memory repository
/// (integration tests); the health check then reports the database as not
/// configured instead of probing it.
#[derive(Clone)]
pub struct DbState {
    pub pool: Option<PgPool>,
    pub repository: Arc<dyn DocumentRepository>,
}

/// Blob store plus the upload limits enforced before anything is written.
#[derive(Clone)]
pub struct DocumentsConfig {
    pub storage: Arc<dyn Storage>,
    pub max_file_size: usize,
    pub allowed_content_types: Vec<String>,
}

/// Signing pipeline and whether digital signing is configured.
#[derive(Clone)]
pub struct SigningState {
    pub pipeline: Arc<SigningPipeline>,
    pub digital_enabled: bool,
}

// ----- AppState -----

/// Main application state: aggregates sub-states for dependency injection.
#[derive(Clone)]
pub struct AppState {
    pub db: DbState,
    pub documents: DocumentsConfig,
    pub signing: SigningState,
    pub config: Config,
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
