//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use async_trait::async_trait;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// The signing pipeline and the API work against this trait so they stay
/// decoupled from the concrete backend.
///
/// **Key format:** Keys are flat: `{uuid}_{sanitized_filename}`. See the
/// crate root documentation.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store a file under a freshly generated unique key and return that key.
    ///
    /// The key is derived from `original_name` by sanitizing it and prefixing
    /// a random UUID, so concurrent uploads of same-named files never collide.
    async fn store(&self, original_name: &str, data: Vec<u8>) -> StorageResult<String>;

    /// Store data under a caller-provided key (signed artifacts reuse the
    /// stored name of their source document plus a suffix).
    async fn store_as(&self, storage_key: &str, data: Vec<u8>) -> StorageResult<()>;

    /// Load a file by its storage key
    async fn load(&self, storage_key: &str) -> StorageResult<Vec<u8>>;

    /// Delete a file by its storage key
    ///
    /// Returns `false` when the file did not exist. Missing files are not an
    /// error so cleanup paths can run unconditionally.
    async fn delete(&self, storage_key: &str) -> StorageResult<bool>;

    /// Check if a file exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;
}
