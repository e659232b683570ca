use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Document {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub original_name: String,
    pub stored_name: String,
    pub content_type: String,
    pub size: i64,
    pub signed: bool,
    pub signed_name: Option<String>,
    pub signature_hash: Option<String>,
    pub signed_at: Option<DateTime<Utc>>,
    pub uploaded_at: DateTime<Utc>,
}

impl Document {
    /// Whether the stored artifact still needs DOCX-to-PDF conversion before signing.
    pub fn needs_conversion(&self) -> bool {
        self.content_type.eq_ignore_ascii_case(DOCX_CONTENT_TYPE)
    }
}

/// How a signing request wants the document signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SigningMode {
    /// Text stamp appended to every page.
    Visual,
    /// Detached CMS/PKCS#7 signature embedded via incremental update.
    Digital,
}

impl SigningMode {
    /// Parse a request-supplied mode string. `None` defaults to visual;
    /// anything other than `visual` or `digital` is rejected.
    pub fn parse(mode: Option<&str>) -> Result<Self, AppError> {
        match mode {
            None => Ok(SigningMode::Visual),
            Some(s) => match s.trim().to_lowercase().as_str() {
                "visual" => Ok(SigningMode::Visual),
                "digital" => Ok(SigningMode::Digital),
                other => Err(AppError::UnknownMode(format!(
                    "Unknown signing mode: {}",
                    other
                ))),
            },
        }
    }
}

impl fmt::Display for SigningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningMode::Visual => write!(f, "visual"),
            SigningMode::Digital => write!(f, "digital"),
        }
    }
}

/// Key store location and credentials for digital signing, injected at startup.
#[derive(Clone)]
pub struct KeyMaterial {
    pub store_path: PathBuf,
    pub passphrase: String,
    pub alias: Option<String>,
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("store_path", &self.store_path)
            .field("passphrase", &"[REDACTED]")
            .field("alias", &self.alias)
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub original_name: String,
    pub stored_name: String,
    pub content_type: String,
    pub size: i64,
    pub signed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signed_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signed_at: Option<DateTime<Utc>>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Document> for DocumentResponse {
    fn from(doc: Document) -> Self {
        DocumentResponse {
            id: doc.id,
            owner_id: doc.owner_id,
            original_name: doc.original_name,
            stored_name: doc.stored_name,
            content_type: doc.content_type,
            size: doc.size,
            signed: doc.signed,
            signed_name: doc.signed_name,
            signature_hash: doc.signature_hash,
            signed_at: doc.signed_at,
            uploaded_at: doc.uploaded_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_document(content_type: &str) -> Document {
        Document {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            original_name: "contrato.docx".to_string(),
            stored_name: format!("{}_contrato.docx", Uuid::new_v4()),
            content_type: content_type.to_string(),
            size: 2048,
            signed: false,
            signed_name: None,
            signature_hash: None,
            signed_at: None,
            uploaded_at: Utc::now(),
        }
    }

    #[test]
    fn test_needs_conversion_for_docx() {
        let doc = test_document(DOCX_CONTENT_TYPE);
        assert!(doc.needs_conversion());
    }

    #[test]
    fn test_no_conversion_for_pdf() {
        let doc = test_document(PDF_CONTENT_TYPE);
        assert!(!doc.needs_conversion());
    }

    #[test]
    fn test_signing_mode_parse_defaults_to_visual() {
        assert_eq!(SigningMode::parse(None).unwrap(), SigningMode::Visual);
    }

    #[test]
    fn test_signing_mode_parse_known_modes() {
        assert_eq!(
            SigningMode::parse(Some("visual")).unwrap(),
            SigningMode::Visual
        );
        assert_eq!(
            SigningMode::parse(Some("digital")).unwrap(),
            SigningMode::Digital
        );
        assert_eq!(
            SigningMode::parse(Some(" Digital ")).unwrap(),
            SigningMode::Digital
        );
    }

    #[test]
    fn test_signing_mode_parse_rejects_unknown() {
        let err = SigningMode::parse(Some("stamped")).unwrap_err();
        assert!(matches!(err, AppError::UnknownMode(_)));
        assert!(err.to_string().contains("stamped"));
    }

    #[test]
    fn test_key_material_debug_redacts_passphrase() {
        let material = KeyMaterial {
            store_path: PathBuf::from("/etc/firmado/keystore.p12"),
            passphrase: "hunter2".to_string(),
            alias: None,
        };
        let debug = format!("{:?}", material);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_document_response_from_document() {
        let signed_at = Utc::now();
        let mut doc = test_document(PDF_CONTENT_TYPE);
        doc.signed = true;
        doc.signed_name = Some("abc_contrato_Firmado.pdf".to_string());
        doc.signature_hash = Some("a".repeat(64));
        doc.signed_at = Some(signed_at);

        let response = DocumentResponse::from(doc.clone());

        assert_eq!(response.id, doc.id);
        assert_eq!(response.owner_id, doc.owner_id);
        assert_eq!(response.original_name, "contrato.docx");
        assert!(response.signed);
        assert_eq!(
            response.signed_name.as_deref(),
            Some("abc_contrato_Firmado.pdf")
        );
        assert_eq!(response.signature_hash, Some("a".repeat(64)));
        assert_eq!(response.signed_at, Some(signed_at));
    }

    #[test]
    fn test_document_response_omits_unset_signature_fields() {
        let doc = test_document(PDF_CONTENT_TYPE);
        let response = DocumentResponse::from(doc);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["signed"], serde_json::json!(false));
        assert!(json.get("signed_name").is_none());
        assert!(json.get("signature_hash").is_none());
        assert!(json.get("signed_at").is_none());
    }
}
