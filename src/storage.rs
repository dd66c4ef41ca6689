//! Image object storage.
//!
//! Uploads go to a Supabase Storage bucket; the API only ever needs the
//! public URL back.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, instrument};

pub const DEFAULT_BUCKET: &str = "product-images";
/// Largest accepted image upload.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Storage returned {status}: {body}")]
    Status { status: u16, body: String },
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `bytes` at `path` and returns its public URL.
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str, upsert: bool) -> Result<String, StorageError>;
}

/// File extension for an upload, taken from the MIME subtype (`image/png` → `png`).
pub fn extension_for(content_type: &str) -> &str {
    content_type
        .split('/')
        .nth(1)
        .and_then(|sub| sub.split([';', '+']).next())
        .map(str::trim)
        .filter(|ext| !ext.is_empty())
        .unwrap_or("bin")
}

pub fn product_image_path(product_id: &str, content_type: &str) -> String {
    format!("products/{product_id}.{}", extension_for(content_type))
}

pub fn variant_image_path(variant_id: &uuid::Uuid, unix_millis: i64, content_type: &str) -> String {
    format!("variants/{variant_id}-{unix_millis}.{}", extension_for(content_type))
}

#[derive(Clone)]
pub struct SupabaseStorage {
    http: reqwest::Client,
    base_url: String,
    bucket: String,
    service_key: SecretString,
}

impl SupabaseStorage {
    pub fn new(base_url: &str, bucket: impl Into<String>, service_key: SecretString) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.trim_end_matches('/').to_string(), bucket: bucket.into(), service_key }
    }

    pub fn public_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{path}", self.base_url, self.bucket)
    }
}

#[async_trait]
impl ObjectStore for SupabaseStorage {
    #[instrument(skip(self, bytes), fields(bucket = %self.bucket, size = bytes.len()))]
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str, upsert: bool) -> Result<String, StorageError> {
        let url = format!("{}/storage/v1/object/{}/{path}", self.base_url, self.bucket);
        let response = self.http
            .post(url)
            .bearer_auth(self.service_key.expose_secret())
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", if upsert { "true" } else { "false" })
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Status { status: status.as_u16(), body: body.chars().take(200).collect() });
        }
        debug!(path, "Image uploaded");
        Ok(self.public_url(path))
    }
}
