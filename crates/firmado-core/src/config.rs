//! Configuration module
//!
//! Environment-sourced configuration for the API: server, database, storage,
//! upload limits, the external converter, and signing key material.

use std::env;
use std::path::PathBuf;

use crate::models::KeyMaterial;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub environment: String,
    pub database_url: String,
    pub upload_dir: String,
    pub max_file_size_bytes: usize,
    pub allowed_content_types: Vec<String>,
    pub soffice_path: String,
    pub convert_timeout_secs: u64,
    pub signing_key_store: Option<String>,
    pub signing_key_store_passphrase: Option<String>,
    pub signing_key_alias: Option<String>,
    pub signing_reason: String,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        const MAX_FILE_SIZE_MB: usize = 10;
        const CONVERT_TIMEOUT_SECS: u64 = 120;

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let max_file_size_mb = env::var("MAX_FILE_SIZE_MB")
            .unwrap_or_else(|_| MAX_FILE_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_FILE_SIZE_MB);

        let allowed_content_types = env::var("ALLOWED_CONTENT_TYPES")
            .unwrap_or_else(|_| {
                "application/pdf,application/vnd.openxmlformats-officedocument.wordprocessingml.document"
                    .to_string()
            })
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .collect();

        let config = Config {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            environment,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string()),
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            allowed_content_types,
            soffice_path: env::var("SOFFICE_PATH").unwrap_or_else(|_| "soffice".to_string()),
            convert_timeout_secs: env::var("CONVERT_TIMEOUT_SECS")
                .unwrap_or_else(|_| CONVERT_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONVERT_TIMEOUT_SECS),
            signing_key_store: env::var("SIGNING_KEY_STORE").ok().filter(|s| !s.is_empty()),
            signing_key_store_passphrase: env::var("SIGNING_KEY_STORE_PASSPHRASE")
                .ok()
                .filter(|s| !s.is_empty()),
            signing_key_alias: env::var("SIGNING_KEY_ALIAS").ok().filter(|s| !s.is_empty()),
            signing_reason: env::var("SIGNING_REASON")
                .unwrap_or_else(|_| "Firmado electronicamente".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.database_url.starts_with("postgresql://")
            && !self.database_url.starts_with("postgres://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }

        if self.signing_key_store.is_some() && self.signing_key_store_passphrase.is_none() {
            return Err(anyhow::anyhow!(
                "SIGNING_KEY_STORE_PASSPHRASE must be set when SIGNING_KEY_STORE is configured"
            ));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase().eq("production") || self.environment.to_lowercase().eq("prod")
    }

    /// Key material for digital signing, when configured.
    ///
    /// Returns `None` when no key store is set; digital signing requests then
    /// fail with `SigningNotConfigured` before touching any file.
    pub fn key_material(&self) -> Option<KeyMaterial> {
        let store_path = self.signing_key_store.as_ref()?;
        let passphrase = self.signing_key_store_passphrase.as_ref()?;
        Some(KeyMaterial {
            store_path: PathBuf::from(store_path),
            passphrase: passphrase.clone(),
            alias: self.signing_key_alias.clone(),
        })
    }
}
