//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p firmado-api --test documents_test`.
//! The app is assembled over the in-memory repository and a tempdir-backed
//! local store, so no database or external converter is needed.

pub mod fixtures;

use async_trait::async_trait;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use firmado_api::constants;
use firmado_api::setup::routes;
use firmado_api::state::{AppState, DbState, DocumentsConfig, SigningState};
use firmado_core::models::KeyMaterial;
use firmado_core::Config;
use firmado_db::{DocumentRepository, InMemoryDocumentRepository};
use firmado_signing::{Converter, SigningPipeline, SigningResult};
use firmado_storage::{LocalStorage, Storage};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

/// API path prefix for tests (e.g. `/api`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Converter stand-in: hands back a fixed one-page PDF without shelling out.
struct FakeConverter;

#[async_trait]
impl Converter for FakeConverter {
    async fn convert_to_pdf(&self, _data: &[u8]) -> SigningResult<Vec<u8>> {
        Ok(fixtures::create_test_pdf(1))
    }
}

/// Test application: server plus owned storage directory.
pub struct TestApp {
    pub server: TestServer,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

/// Key material pointing at the PKCS#12 test store committed next to the
/// signing crate.
pub fn test_key_material() -> KeyMaterial {
    KeyMaterial {
        store_path: PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../firmado-signing/testdata/signing.p12"),
        passphrase: "firmado-test".to_string(),
        alias: None,
    }
}

/// Setup test app without digital signing configured.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(None).await
}

/// Setup test app; pass key material to enable digital signing.
pub async fn setup_test_app_with(key_material: Option<KeyMaterial>) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(temp_dir.path().join("uploads"))
            .await
            .expect("Failed to create local storage"),
    );
    let repository: Arc<dyn DocumentRepository> = Arc::new(InMemoryDocumentRepository::new());

    let digital_enabled = key_material.is_some();
    let pipeline = Arc::new(SigningPipeline::new(
        storage.clone(),
        repository.clone(),
        Arc::new(FakeConverter),
        key_material,
        "Firmado electronicamente".to_string(),
    ));

    let config = create_test_config(temp_dir.path().join("uploads"));

    let state = Arc::new(AppState {
        db: DbState {
            pool: None,
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

    let app = routes::setup_routes(state);
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        _temp_dir: temp_dir,
    }
}

/// Upload a document through the API; panics on non-200 so test bodies stay
/// focused on their own assertions.
pub async fn upload_test_document(
    client: &TestServer,
    owner_id: Uuid,
    file_name: &str,
    content_type: &str,
    data: Vec<u8>,
) -> serde_json::Value {
    let part = Part::bytes(bytes::Bytes::from(data))
        .file_name(file_name)
        .mime_type(content_type);
    let form = MultipartForm::new()
        .add_text("owner_id", owner_id.to_string())
        .add_part("file", part);

    let response = client.post(&api_path("/documents")).multipart(form).await;
    assert_eq!(
        response.status_code(),
        200,
        "upload failed: {}",
        response.text()
    );
    response.json()
}

fn create_test_config(upload_dir: PathBuf) -> Config {
    Config {
        server_port: 4000,
        cors_origins: vec!["*".to_string()],
        db_max_connections: 5,
        db_timeout_seconds: 30,
        environment: "test".to_string(),
        database_url: "postgresql://localhost/firmado-test".to_string(),
        upload_dir: upload_dir.to_string_lossy().into_owned(),
        max_file_size_bytes: 10 * 1024 * 1024,
        allowed_content_types: vec![
            "application/pdf".to_string(),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document".to_string(),
        ],
        soffice_path: "soffice".to_string(),
        convert_timeout_secs: 120,
        signing_key_store: None,
        signing_key_store_passphrase: None,
        signing_key_alias: None,
        signing_reason: "Firmado electronicamente".to_string(),
    }
}
