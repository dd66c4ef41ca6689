//! Configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Always
//! - `ADMIN_SECRET` - shared secret expected in the `x-admin-secret` header
//! - `CATALOG_BACKEND` - `sheets` (default) or `database`
//! - `PORT` - listen port (default: 3001)
//! - `CORS_ORIGIN` - allowed browser origin (default: http://localhost:3000)
//! - `CACHE_TTL_SECS` - snapshot lifetime for the sheets backend (default: 300)
//!
//! ## Sheets backend
//! - `GOOGLE_SERVICE_ACCOUNT_EMAIL`, `GOOGLE_PRIVATE_KEY`, `GOOGLE_SHEET_ID`
//!
//! ## Database backend
//! - `DATABASE_URL`, `SUPABASE_URL`, `SUPABASE_SERVICE_ROLE_KEY`
//! - `STORAGE_BUCKET` - image bucket (default: product-images)

use std::net::SocketAddr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use crate::catalog::DEFAULT_CACHE_TTL;
use crate::storage::DEFAULT_BUCKET;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub cors_origin: String,
    pub admin_secret: SecretString,
    pub backend: Backend,
}

#[derive(Debug, Clone)]
pub enum Backend {
    Sheets(SheetsConfig),
    Database(DatabaseConfig),
}

#[derive(Clone)]
pub struct SheetsConfig {
    pub service_account_email: String,
    pub private_key: SecretString,
    pub sheet_id: String,
    pub cache_ttl: Duration,
}

impl std::fmt::Debug for SheetsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsConfig")
            .field("service_account_email", &self.service_account_email)
            .field("private_key", &"[REDACTED]")
            .field("sheet_id", &self.sheet_id)
            .field("cache_ttl", &self.cache_ttl)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub database_url: SecretString,
    pub supabase_url: String,
    pub supabase_key: SecretString,
    pub bucket: String,
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| get(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()));

        let port = match get("PORT") {
            Some(v) => v.parse().map_err(|e: std::num::ParseIntError| ConfigError::InvalidEnvVar("PORT".into(), e.to_string()))?,
            None => 3001,
        };
        let cors_origin = get("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());
        let admin_secret = SecretString::new(required("ADMIN_SECRET")?);

        let backend = match get("CATALOG_BACKEND").as_deref().unwrap_or("sheets") {
            "sheets" => {
                let cache_ttl = match get("CACHE_TTL_SECS") {
                    Some(v) => Duration::from_secs(v.parse().map_err(|e: std::num::ParseIntError| {
                        ConfigError::InvalidEnvVar("CACHE_TTL_SECS".into(), e.to_string())
                    })?),
                    None => DEFAULT_CACHE_TTL,
                };
                Backend::Sheets(SheetsConfig {
                    service_account_email: required("GOOGLE_SERVICE_ACCOUNT_EMAIL")?,
                    private_key: SecretString::new(required("GOOGLE_PRIVATE_KEY")?),
                    sheet_id: required("GOOGLE_SHEET_ID")?,
                    cache_ttl,
                })
            }
            "database" => Backend::Database(DatabaseConfig {
                database_url: SecretString::new(required("DATABASE_URL")?),
                supabase_url: required("SUPABASE_URL")?,
                supabase_key: SecretString::new(required("SUPABASE_SERVICE_ROLE_KEY")?),
                bucket: get("STORAGE_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            }),
            other => return Err(ConfigError::InvalidEnvVar("CATALOG_BACKEND".into(), format!("unknown backend '{other}'"))),
        };

        Ok(Self { port, cors_origin, admin_secret, backend })
    }

    pub fn socket_addr(&self) -> SocketAddr { SocketAddr::from(([0, 0, 0, 0], self.port)) }
}
