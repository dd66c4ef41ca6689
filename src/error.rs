//! API error type.
//!
//! Every handler returns `Result<_, ApiError>`. Upstream failures (sheet
//! fetch, database, object storage) reach the client as a fixed message; the
//! underlying cause is only logged.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::routes::ApiResponse;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(&'static str),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("{message}: {source}")]
    Upstream { message: &'static str, #[source] source: BoxError },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// `map_err` adapter turning any upstream error into a 500 with `message`.
pub fn upstream<E>(message: &'static str) -> impl FnOnce(E) -> ApiError
where
    E: std::error::Error + Send + Sync + 'static,
{
    move |e| ApiError::Upstream { message, source: Box::new(e) }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self { Self::BadRequest(errors.to_string()) }
}

impl From<axum::extract::rejection::JsonRejection> for ApiError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<axum::extract::multipart::MultipartRejection> for ApiError {
    fn from(rejection: axum::extract::multipart::MultipartRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<axum::extract::multipart::MultipartError> for ApiError {
    fn from(e: axum::extract::multipart::MultipartError) -> Self { Self::BadRequest(e.body_text()) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Upstream { message, source } => {
                tracing::error!(error = %source, "{message}");
                (*message).to_string()
            }
            other => other.to_string(),
        };
        (self.status(), Json(ApiResponse::<()>::error(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::SheetsError;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::NotFound("Product not found").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Conflict("Product already exists").status(), StatusCode::CONFLICT);
        let err = upstream("Failed to fetch products")(SheetsError::NoSheets);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_upstream_hides_cause() {
        let err = upstream("Failed to fetch products")(SheetsError::Status { status: 403, body: "PERMISSION_DENIED".into() });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({"success": false, "error": "Failed to fetch products"}));
    }
}
