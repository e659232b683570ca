//! Signing errors
//!
//! Leaf modules in this crate return [`SigningError`]; the pipeline converts
//! them into the application error taxonomy via the `From` impl below so that
//! HTTP status mapping stays in one place.

use firmado_core::AppError;
use thiserror::Error;

/// Errors produced while converting, stamping, or digitally signing a document
#[derive(Debug, Error)]
pub enum SigningError {
    #[error("Conversion failed: {0}")]
    ConversionFailed(String),

    #[error("Document corrupt: {0}")]
    DocumentCorrupt(String),

    #[error("Signing not configured: {0}")]
    NotConfigured(String),

    #[error("Key store access failed: {0}")]
    KeyStoreAccessFailed(String),

    #[error("Signature generation failed: {0}")]
    SignatureGenerationFailed(String),
}

pub type SigningResult<T> = Result<T, SigningError>;

impl From<SigningError> for AppError {
    fn from(err: SigningError) -> Self {
        match err {
            SigningError::ConversionFailed(msg) => AppError::ConversionFailed(msg),
            SigningError::DocumentCorrupt(msg) => AppError::DocumentCorrupt(msg),
            SigningError::NotConfigured(msg) => AppError::SigningNotConfigured(msg),
            SigningError::KeyStoreAccessFailed(msg) => AppError::KeyStoreAccessFailed(msg),
            SigningError::SignatureGenerationFailed(msg) => {
                AppError::SignatureGenerationFailed(msg)
            }
        }
    }
}
