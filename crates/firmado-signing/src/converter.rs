//! DOCX to PDF conversion
//!
//! Conversion shells out to a LibreOffice-compatible `soffice` binary in
//! headless mode. The input is written to a temporary working directory and
//! the converter is expected to drop `input.pdf` next to it.

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::process::Command;

use crate::error::{SigningError, SigningResult};

/// Converts office documents to PDF
#[async_trait]
pub trait Converter: Send + Sync {
    async fn convert_to_pdf(&self, data: &[u8]) -> SigningResult<Vec<u8>>;
}

/// Converter backed by an external `soffice` process
#[derive(Clone)]
pub struct SofficeConverter {
    soffice_path: String,
    timeout: Duration,
}

impl SofficeConverter {
    pub fn new(soffice_path: String, timeout: Duration) -> Self {
        Self {
            soffice_path,
            timeout,
        }
    }
}

#[async_trait]
impl Converter for SofficeConverter {
    async fn convert_to_pdf(&self, data: &[u8]) -> SigningResult<Vec<u8>> {
        let start = Instant::now();

        let work_dir = TempDir::new().map_err(|e| {
            SigningError::ConversionFailed(format!("Failed to create temp directory: {}", e))
        })?;
        let input_path = work_dir.path().join("input.docx");
        tokio::fs::write(&input_path, data).await.map_err(|e| {
            SigningError::ConversionFailed(format!(
                "Failed to write temp file {}: {}",
                input_path.display(),
                e
            ))
        })?;

        let mut command = Command::new(&self.soffice_path);
        command
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(work_dir.path())
            .arg(&input_path)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(result) => result.map_err(|e| {
                SigningError::ConversionFailed(format!(
                    "Failed to execute {}: {}",
                    self.soffice_path, e
                ))
            })?,
            Err(_) => {
                return Err(SigningError::ConversionFailed(format!(
                    "Conversion timed out after {}s",
                    self.timeout.as_secs()
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SigningError::ConversionFailed(format!(
                "{} exited with {}: {}",
                self.soffice_path,
                output.status,
                stderr.trim()
            )));
        }

        let output_path = work_dir.path().join("input.pdf");
        let pdf = tokio::fs::read(&output_path).await.map_err(|_| {
            SigningError::ConversionFailed(format!(
                "Converter produced no output at {}",
                output_path.display()
            ))
        })?;

        tracing::info!(
            input_bytes = data.len(),
            output_bytes = pdf.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "DOCX converted to PDF"
        );

        Ok(pdf)
    }
}
