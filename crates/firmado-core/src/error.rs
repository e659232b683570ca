//! Error types module
//!
//! This module provides the core error types used throughout the Firmado application.
//! All errors are unified under the `AppError` enum which covers the signing pipeline
//! taxonomy (conversion, stamping, key store, signature generation) alongside
//! database, storage, and input errors.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx` feature.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
/// This trait allows errors to self-describe their HTTP response characteristics
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "CONVERSION_FAILED")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Storage write failed: {0}")]
    StorageWriteFailed(String),

    #[error("Conversion failed: {0}")]
    ConversionFailed(String),

    #[error("Document corrupt: {0}")]
    DocumentCorrupt(String),

    #[error("Signing not configured: {0}")]
    SigningNotConfigured(String),

    #[error("Key store access failed: {0}")]
    KeyStoreAccessFailed(String),

    #[error("Signature generation failed: {0}")]
    SignatureGenerationFailed(String),

    #[error("Unknown signing mode: {0}")]
    UnknownMode(String),

    #[error("Already signed: {0}")]
    AlreadySigned(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

// Error conversion implementations following Rust best practices
#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("UUID parsing error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
/// Reduces duplication in ErrorMetadata impl; client_message stays per-variant for dynamic content.
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::Database(_) => (
            500,
            "DATABASE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Storage(_) => (
            500,
            "STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::StorageWriteFailed(_) => (
            500,
            "STORAGE_WRITE_FAILED",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::ConversionFailed(_) => (
            500,
            "CONVERSION_FAILED",
            true,
            Some("Retry, or upload the document as PDF"),
            true,
            LogLevel::Error,
        ),
        AppError::DocumentCorrupt(_) => (
            422,
            "DOCUMENT_CORRUPT",
            false,
            Some("Check that the file is a well-formed PDF"),
            false,
            LogLevel::Warn,
        ),
        AppError::SigningNotConfigured(_) => (
            500,
            "SIGNING_NOT_CONFIGURED",
            false,
            Some("Configure the signing key store on the server"),
            true,
            LogLevel::Error,
        ),
        AppError::KeyStoreAccessFailed(_) => (
            500,
            "KEY_STORE_ACCESS_FAILED",
            false,
            Some("Check the key store passphrase and alias"),
            true,
            LogLevel::Error,
        ),
        AppError::SignatureGenerationFailed(_) => (
            500,
            "SIGNATURE_GENERATION_FAILED",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::UnknownMode(_) => (
            400,
            "UNKNOWN_MODE",
            false,
            Some("Use signing mode 'visual' or 'digital'"),
            false,
            LogLevel::Debug,
        ),
        AppError::AlreadySigned(_) => (
            400,
            "ALREADY_SIGNED",
            false,
            Some("The document has already been signed"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::BadRequest(_) => (
            400,
            "BAD_REQUEST",
            false,
            Some("Check request format and parameters"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the resource ID exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::PayloadTooLarge(_) => (
            413,
            "PAYLOAD_TOO_LARGE",
            false,
            Some("Reduce file size and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::Internal(_) => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Database(_) => "Database",
            AppError::Storage(_) => "Storage",
            AppError::StorageWriteFailed(_) => "StorageWriteFailed",
            AppError::ConversionFailed(_) => "ConversionFailed",
            AppError::DocumentCorrupt(_) => "DocumentCorrupt",
            AppError::SigningNotConfigured(_) => "SigningNotConfigured",
            AppError::KeyStoreAccessFailed(_) => "KeyStoreAccessFailed",
            AppError::SignatureGenerationFailed(_) => "SignatureGenerationFailed",
            AppError::UnknownMode(_) => "UnknownMode",
            AppError::AlreadySigned(_) => "AlreadySigned",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::BadRequest(_) => "BadRequest",
            AppError::NotFound(_) => "NotFound",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        // Add source error chain
        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::StorageWriteFailed(_) => "Failed to write file to storage".to_string(),
            AppError::ConversionFailed(_) => "Failed to convert document to PDF".to_string(),
            AppError::DocumentCorrupt(ref msg) => msg.clone(),
            AppError::SigningNotConfigured(_) => {
                "Digital signing is not configured on this server".to_string()
            }
            AppError::KeyStoreAccessFailed(_) => {
                "Failed to access the signing key store".to_string()
            }
            AppError::SignatureGenerationFailed(_) => "Failed to generate signature".to_string(),
            AppError::UnknownMode(ref msg) => msg.clone(),
            AppError::AlreadySigned(ref msg) => msg.clone(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::BadRequest(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::PayloadTooLarge(ref msg) => msg.clone(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}
