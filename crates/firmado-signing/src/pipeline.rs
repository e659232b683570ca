//! Signing pipeline
//!
//! Orchestrates one signing attempt end to end: load the stored artifact,
//! convert DOCX sources to PDF, apply the requested signature, persist the
//! signed artifact, and commit the result with a conditional update. Nothing
//! is durable until that final update succeeds; artifacts written along the
//! way are removed again when a later step fails.

use std::sync::Arc;
use std::time::Instant;

use firmado_core::models::PDF_CONTENT_TYPE;
use firmado_core::{AppError, Document, KeyMaterial, SigningMode};
use firmado_db::DocumentRepository;
use firmado_storage::Storage;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::converter::Converter;
use crate::keystore;
use crate::naming;
use crate::signer;
use crate::stamper;

/// Working state of one signing attempt.
///
/// Conversion swaps the artifact the signature applies to without touching
/// the durable record; the swap becomes durable only when the attempt
/// commits.
#[derive(Debug, Clone)]
struct PendingSigningContext {
    document: Document,
    stored_name: String,
    content_type: String,
}

impl PendingSigningContext {
    fn new(document: Document) -> Self {
        let stored_name = document.stored_name.clone();
        let content_type = document.content_type.clone();
        Self {
            document,
            stored_name,
            content_type,
        }
    }

    fn converted(self, stored_name: String) -> Self {
        Self {
            stored_name,
            content_type: PDF_CONTENT_TYPE.to_string(),
            ..self
        }
    }
}

/// Document signing orchestrator
pub struct SigningPipeline {
    storage: Arc<dyn Storage>,
    repository: Arc<dyn DocumentRepository>,
    converter: Arc<dyn Converter>,
    key_material: Option<KeyMaterial>,
    signing_reason: String,
}

impl SigningPipeline {
    pub fn new(
        storage: Arc<dyn Storage>,
        repository: Arc<dyn DocumentRepository>,
        converter: Arc<dyn Converter>,
        key_material: Option<KeyMaterial>,
        signing_reason: String,
    ) -> Self {
        Self {
            storage,
            repository,
            converter,
            key_material,
            signing_reason,
        }
    }

    /// Sign a document at most once.
    ///
    /// Fails with `AlreadySigned` when the document has a committed signature
    /// and with `NotFound` when it does not exist. On any failure, artifacts
    /// written by this attempt are deleted again on a best-effort basis.
    pub async fn sign(
        &self,
        document_id: Uuid,
        signer_label: &str,
        mode: SigningMode,
    ) -> Result<Document, AppError> {
        let signer_label = signer_label.trim();
        if signer_label.is_empty() {
            return Err(AppError::InvalidInput(
                "signer_label must not be empty".to_string(),
            ));
        }

        let document = self
            .repository
            .find(document_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", document_id)))?;

        if document.signed {
            return Err(AppError::AlreadySigned(format!(
                "Document {} is already signed",
                document_id
            )));
        }

        tracing::info!(
            document_id = %document_id,
            mode = %mode,
            "Starting signing attempt"
        );

        let mut created_artifacts: Vec<String> = Vec::new();
        let result = self
            .sign_inner(document, signer_label, mode, &mut created_artifacts)
            .await;

        if result.is_err() && !created_artifacts.is_empty() {
            self.remove_artifacts(&created_artifacts).await;
        }

        result
    }

    async fn sign_inner(
        &self,
        document: Document,
        signer_label: &str,
        mode: SigningMode,
        created_artifacts: &mut Vec<String>,
    ) -> Result<Document, AppError> {
        let start = Instant::now();
        let mut context = PendingSigningContext::new(document);

        let mut source = self
            .storage
            .load(&context.stored_name)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        if context.document.needs_conversion() {
            tracing::info!(
                document_id = %context.document.id,
                stored_name = %context.stored_name,
                "Converting DOCX to PDF"
            );
            let pdf = self.converter.convert_to_pdf(&source).await?;
            let pdf_name = naming::pdf_file_name(&context.document.original_name);
            let converted_key = self
                .storage
                .store(&pdf_name, pdf.clone())
                .await
                .map_err(|e| AppError::StorageWriteFailed(e.to_string()))?;
            created_artifacts.push(converted_key.clone());
            context = context.converted(converted_key);
            source = pdf;
        }

        let signed_bytes = match mode {
            SigningMode::Visual => stamper::stamp_visual(&source, signer_label)?,
            SigningMode::Digital => {
                let key_material = self.key_material.as_ref().ok_or_else(|| {
                    AppError::SigningNotConfigured(
                        "No signing key store is configured".to_string(),
                    )
                })?;
                let signing_key = keystore::load_signing_key(key_material).await?;
                signer::sign_digital(&source, signer_label, &self.signing_reason, &signing_key)?
            }
        };

        let signed_name = naming::signed_file_name(&context.stored_name, mode);
        let signature_hash = hex::encode(Sha256::digest(&signed_bytes));

        self.storage
            .store_as(&signed_name, signed_bytes)
            .await
            .map_err(|e| AppError::StorageWriteFailed(e.to_string()))?;
        created_artifacts.push(signed_name.clone());

        let updated = self
            .repository
            .mark_signed(
                context.document.id,
                &context.stored_name,
                &context.content_type,
                &signed_name,
                &signature_hash,
            )
            .await?;

        tracing::info!(
            document_id = %updated.id,
            signed_name = %signed_name,
            mode = %mode,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Document signed"
        );

        Ok(updated)
    }

    async fn remove_artifacts(&self, keys: &[String]) {
        for key in keys {
            if let Err(err) = self.storage.delete(key).await {
                tracing::debug!(
                    key = %key,
                    error = %err,
                    "Failed to remove signing artifact"
                );
            }
        }
    }
}
