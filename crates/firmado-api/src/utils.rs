//! Common utilities for file upload handlers

use axum::extract::Multipart;
use firmado_core::AppError;
use std::collections::HashMap;

/// A parsed multipart form: the file part plus any accompanying text fields.
#[derive(Debug)]
pub struct MultipartUpload {
    pub data: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
    text_fields: HashMap<String, String>,
}

impl MultipartUpload {
    /// Required text field; missing fields are a 400.
    pub fn text_field(&self, name: &str) -> Result<&str, AppError> {
        self.text_fields
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| AppError::InvalidInput(format!("Missing form field '{}'", name)))
    }

}

/// Read a multipart form into memory.
/// Only one field named "file" is accepted; multiple file fields are rejected.
/// All other fields are read as text.
pub async fn read_multipart_upload(mut multipart: Multipart) -> Result<MultipartUpload, AppError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut content_type: Option<String> = None;
    let mut text_fields = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart: {}", e)))?
    {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        if field_name == "file" {
            if file_data.is_some() {
                return Err(AppError::InvalidInput(
                    "Multiple file fields are not allowed; send exactly one field named 'file'"
                        .to_string(),
                ));
            }
            file_name = field.file_name().map(|s: &str| s.to_string());
            content_type = field.content_type().map(|s: &str| s.to_string());

            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::InvalidInput(format!("Failed to read file data: {}", e)))?;

            file_data = Some(data.to_vec());
        } else {
            let value = field.text().await.map_err(|e| {
                AppError::InvalidInput(format!("Failed to read field '{}': {}", field_name, e))
            })?;
            text_fields.insert(field_name, value);
        }
    }

    let data = file_data.ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))?;

    Ok(MultipartUpload {
        data,
        file_name: file_name.unwrap_or_else(|| "unknown".to_string()),
        content_type: content_type.unwrap_or_else(|| "application/octet-stream".to_string()),
        text_fields,
    })
}
