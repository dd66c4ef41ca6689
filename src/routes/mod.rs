//! HTTP routes.
//!
//! Both backends expose the same `/products` read API and response envelope;
//! the database backend adds the write routes.

pub mod database;
pub mod sheets;

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub const ADMIN_SECRET_HEADER: &str = "x-admin-secret";

/// Response envelope shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    fn empty(success: bool) -> Self {
        Self { success, data: None, count: None, error: None, url: None, message: None }
    }

    pub fn data(data: T) -> Self { Self { data: Some(data), ..Self::empty(true) } }
    pub fn error(error: impl Into<String>) -> Self { Self { error: Some(error.into()), ..Self::empty(false) } }
    pub fn url(url: String) -> Self { Self { url: Some(url), ..Self::empty(true) } }
    pub fn message(message: impl Into<String>) -> Self { Self { message: Some(message.into()), ..Self::empty(true) } }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}

impl<T> ApiResponse<Vec<T>> {
    pub fn list(items: Vec<T>) -> Self {
        let count = items.len();
        Self::data(items).with_count(count)
    }
}

/// `GET /products` filters.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub featured: Option<String>,
}

impl ListQuery {
    pub fn matches(&self, category: &str, featured: bool) -> bool {
        let category_ok = self.category.as_deref().map_or(true, |c| c == category);
        let featured_ok = self.featured.as_deref() != Some("true") || featured;
        category_ok && featured_ok
    }
}

/// Shared secret gating write routes.
#[derive(Clone)]
pub struct AdminSecret(pub Arc<SecretString>);

impl AdminSecret {
    pub fn new(secret: SecretString) -> Self { Self(Arc::new(secret)) }

    pub fn verify(&self, headers: &HeaderMap) -> bool {
        headers
            .get(ADMIN_SECRET_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == self.0.expose_secret())
    }
}

/// Extractor that rejects the request with 401 unless the admin secret header matches.
pub struct RequireAdmin;

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequireAdmin
where
    AdminSecret: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if AdminSecret::from_ref(state).verify(&parts.headers) {
            Ok(Self)
        } else {
            tracing::warn!(path = %parts.uri.path(), "Rejected admin request");
            Err(ApiError::Unauthorized)
        }
    }
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok", "timestamp": Utc::now().to_rfc3339()}))
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(ApiResponse::<()>::error("Route not found")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    #[test]
    fn test_envelope_shapes() {
        assert_eq!(serde_json::to_value(ApiResponse::list(vec![1, 2])).unwrap(), json!({"success": true, "data": [1, 2], "count": 2}));
        assert_eq!(serde_json::to_value(ApiResponse::<()>::error("Product not found")).unwrap(), json!({"success": false, "error": "Product not found"}));
        assert_eq!(serde_json::to_value(ApiResponse::<()>::url("https://x/y.png".into())).unwrap(), json!({"success": true, "url": "https://x/y.png"}));
    }

    #[test]
    fn test_list_query() {
        let all = ListQuery::default();
        assert!(all.matches("iphone", false));

        let featured = ListQuery { featured: Some("true".into()), ..Default::default() };
        assert!(featured.matches("iphone", true));
        assert!(!featured.matches("iphone", false));

        let other = ListQuery { featured: Some("yes".into()), ..Default::default() };
        assert!(other.matches("iphone", false));

        let macs = ListQuery { category: Some("macbook".into()), ..Default::default() };
        assert!(macs.matches("macbook", false));
        assert!(!macs.matches("iphone", true));
    }

    #[test]
    fn test_admin_secret_verify() {
        let secret = AdminSecret::new(SecretString::new("s3cret".into()));
        let mut headers = HeaderMap::new();
        assert!(!secret.verify(&headers));
        headers.insert(ADMIN_SECRET_HEADER, HeaderValue::from_static("wrong"));
        assert!(!secret.verify(&headers));
        headers.insert(ADMIN_SECRET_HEADER, HeaderValue::from_static("s3cret"));
        assert!(secret.verify(&headers));
    }
}
