//! Catalog CRUD backed by PostgreSQL, with images in object storage.
//!
//! Reads are public; every write requires the admin secret header.

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection, DefaultBodyLimit, FromRef, Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use sqlx::{error::ErrorKind, PgPool};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::{AdminSecret, ApiResponse, ListQuery, RequireAdmin};
use crate::error::{upstream, ApiError};
use crate::storage::{product_image_path, variant_image_path, ObjectStore, MAX_IMAGE_BYTES};
use crate::store::{self, NewProduct, NewVariant, ProductUpdate, ProductView, VariantImage, VariantRow, VariantUpdate};

const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct DatabaseState {
    pub db: PgPool,
    pub images: Arc<dyn ObjectStore>,
    pub admin_secret: AdminSecret,
}

impl FromRef<DatabaseState> for AdminSecret {
    fn from_ref(state: &DatabaseState) -> Self { state.admin_secret.clone() }
}

pub fn router(state: DatabaseState) -> Router {
    let upload_limit = DefaultBodyLimit::max(MAX_IMAGE_BYTES + MULTIPART_OVERHEAD);
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/:id", get(get_product).put(update_product).delete(delete_product))
        .route("/products/:id/image", post(upload_product_image).layer(upload_limit.clone()))
        .route("/products/:id/variants", post(create_variant))
        .route("/products/:id/variants/:variant_id", put(update_variant).delete(delete_variant))
        .route("/products/:id/variants/:variant_id/images", get(list_variant_images).post(upload_variant_image).layer(upload_limit))
        .route("/products/:id/variants/:variant_id/images/:image_id", axum::routing::delete(delete_variant_image))
        .with_state(state)
}

fn db_error_kind(e: &sqlx::Error) -> Option<ErrorKind> {
    match e {
        sqlx::Error::Database(db) => Some(db.kind()),
        _ => None,
    }
}

async fn load_view(db: &PgPool, id: &str) -> Result<ProductView, ApiError> {
    store::find_product(db, id)
        .await
        .map_err(upstream("Failed to fetch product"))?
        .map(ProductView::from)
        .ok_or(ApiError::NotFound("Product not found"))
}

async fn list_products(State(s): State<DatabaseState>, Query(query): Query<ListQuery>) -> Result<Json<ApiResponse<Vec<ProductView>>>, ApiError> {
    let products = store::list_active_products(&s.db).await.map_err(upstream("Failed to fetch products"))?;
    let views: Vec<ProductView> = products
        .into_iter()
        .map(ProductView::from)
        .filter(|p| query.matches(&p.category, p.featured))
        .collect();
    Ok(Json(ApiResponse::list(views)))
}

async fn get_product(State(s): State<DatabaseState>, Path(id): Path<String>) -> Result<Json<ApiResponse<ProductView>>, ApiError> {
    Ok(Json(ApiResponse::data(load_view(&s.db, &id).await?)))
}

async fn create_product(
    _admin: RequireAdmin,
    State(s): State<DatabaseState>,
    body: Result<Json<NewProduct>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ProductView>>), ApiError> {
    let Json(new) = body?;
    new.validate()?;
    let product = store::insert_product(&s.db, &new).await.map_err(|e| match db_error_kind(&e) {
        Some(ErrorKind::UniqueViolation) => ApiError::Conflict("Product already exists"),
        _ => upstream("Failed to create product")(e),
    })?;
    info!(product_id = %product.id, variants = new.variants.len(), "Product created");
    Ok((StatusCode::CREATED, Json(ApiResponse::data(load_view(&s.db, &product.id).await?))))
}

async fn update_product(
    _admin: RequireAdmin,
    State(s): State<DatabaseState>,
    Path(id): Path<String>,
    body: Result<Json<ProductUpdate>, JsonRejection>,
) -> Result<Json<ApiResponse<ProductView>>, ApiError> {
    let Json(update) = body?;
    update.validate()?;
    store::update_product(&s.db, &id, &update)
        .await
        .map_err(upstream("Failed to update product"))?
        .ok_or(ApiError::NotFound("Product not found"))?;
    Ok(Json(ApiResponse::data(load_view(&s.db, &id).await?)))
}

async fn delete_product(_admin: RequireAdmin, State(s): State<DatabaseState>, Path(id): Path<String>) -> Result<Json<ApiResponse<()>>, ApiError> {
    if !store::delete_product(&s.db, &id).await.map_err(upstream("Failed to delete product"))? {
        return Err(ApiError::NotFound("Product not found"));
    }
    info!(product_id = %id, "Product deleted");
    Ok(Json(ApiResponse::message("Product deleted")))
}

struct ImageUpload { bytes: Vec<u8>, content_type: String }

/// Pulls the `image` field out of a multipart form.
async fn read_image(multipart: Result<Multipart, MultipartRejection>) -> Result<ImageUpload, ApiError> {
    let mut multipart = multipart?;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("image") { continue; }
        let content_type = field.content_type().unwrap_or_default().to_string();
        if !content_type.starts_with("image/") {
            return Err(ApiError::BadRequest("Only image uploads are accepted".into()));
        }
        let bytes = field.bytes().await?;
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(ApiError::BadRequest("Image exceeds 5 MB".into()));
        }
        if !bytes.is_empty() {
            return Ok(ImageUpload { bytes: bytes.to_vec(), content_type });
        }
    }
    Err(ApiError::BadRequest("No image provided".into()))
}

async fn upload_product_image(
    _admin: RequireAdmin,
    State(s): State<DatabaseState>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let image = read_image(multipart).await?;
    if !store::product_exists(&s.db, &id).await.map_err(upstream("Failed to upload image"))? {
        return Err(ApiError::NotFound("Product not found"));
    }
    let path = product_image_path(&id, &image.content_type);
    let url = s.images.upload(&path, image.bytes, &image.content_type, true).await.map_err(upstream("Failed to upload image"))?;
    store::set_product_image(&s.db, &id, &url).await.map_err(upstream("Failed to upload image"))?;
    Ok(Json(ApiResponse::url(url)))
}

async fn create_variant(
    _admin: RequireAdmin,
    State(s): State<DatabaseState>,
    Path(id): Path<String>,
    body: Result<Json<NewVariant>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<VariantRow>>), ApiError> {
    let Json(new) = body?;
    new.validate()?;
    let variant = store::insert_variant(&s.db, &id, &new).await.map_err(|e| match db_error_kind(&e) {
        Some(ErrorKind::ForeignKeyViolation) => ApiError::NotFound("Product not found"),
        _ => upstream("Failed to create variant")(e),
    })?;
    Ok((StatusCode::CREATED, Json(ApiResponse::data(variant))))
}

async fn update_variant(
    _admin: RequireAdmin,
    State(s): State<DatabaseState>,
    Path((id, variant_id)): Path<(String, Uuid)>,
    body: Result<Json<VariantUpdate>, JsonRejection>,
) -> Result<Json<ApiResponse<VariantRow>>, ApiError> {
    let Json(update) = body?;
    update.validate()?;
    let variant = store::update_variant(&s.db, &id, variant_id, &update)
        .await
        .map_err(upstream("Failed to update variant"))?
        .ok_or(ApiError::NotFound("Variant not found"))?;
    Ok(Json(ApiResponse::data(variant)))
}

async fn delete_variant(
    _admin: RequireAdmin,
    State(s): State<DatabaseState>,
    Path((id, variant_id)): Path<(String, Uuid)>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    if !store::delete_variant(&s.db, &id, variant_id).await.map_err(upstream("Failed to delete variant"))? {
        return Err(ApiError::NotFound("Variant not found"));
    }
    Ok(Json(ApiResponse::message("Variant deleted")))
}

async fn list_variant_images(
    State(s): State<DatabaseState>,
    Path((_id, variant_id)): Path<(String, Uuid)>,
) -> Result<Json<ApiResponse<Vec<VariantImage>>>, ApiError> {
    let images = store::list_variant_images(&s.db, variant_id).await.map_err(upstream("Failed to fetch images"))?;
    Ok(Json(ApiResponse::data(images)))
}

async fn upload_variant_image(
    _admin: RequireAdmin,
    State(s): State<DatabaseState>,
    Path((id, variant_id)): Path<(String, Uuid)>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let image = read_image(multipart).await?;
    if !store::variant_exists(&s.db, &id, variant_id).await.map_err(upstream("Failed to upload image"))? {
        return Err(ApiError::NotFound("Variant not found"));
    }
    let path = variant_image_path(&variant_id, Utc::now().timestamp_millis(), &image.content_type);
    let url = s.images.upload(&path, image.bytes, &image.content_type, false).await.map_err(upstream("Failed to upload image"))?;
    store::insert_variant_image(&s.db, variant_id, &url).await.map_err(upstream("Failed to upload image"))?;
    Ok(Json(ApiResponse::url(url)))
}

async fn delete_variant_image(
    _admin: RequireAdmin,
    State(s): State<DatabaseState>,
    Path((_id, variant_id, image_id)): Path<(String, Uuid, Uuid)>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    if !store::delete_variant_image(&s.db, variant_id, image_id).await.map_err(upstream("Failed to delete image"))? {
        return Err(ApiError::NotFound("Image not found"));
    }
    Ok(Json(ApiResponse::empty(true)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use secrecy::SecretString;
    use serde_json::Value;
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// Records uploads instead of sending them anywhere.
    #[derive(Default)]
    struct MemoryStore { uploads: Mutex<Vec<String>> }

    #[async_trait]
    impl ObjectStore for MemoryStore {
        async fn upload(&self, path: &str, _bytes: Vec<u8>, _content_type: &str, _upsert: bool) -> Result<String, StorageError> {
            self.uploads.lock().unwrap().push(path.to_string());
            Ok(format!("https://cdn.example.com/{path}"))
        }
    }

    /// The pool never connects; these tests only reach code paths that
    /// reject the request before touching the database.
    fn app(images: Arc<MemoryStore>) -> Router {
        let db = PgPoolOptions::new().connect_lazy("postgres://catalog@localhost/catalog").unwrap();
        router(DatabaseState { db, images, admin_secret: AdminSecret::new(SecretString::new("s3cret".into())) })
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    fn multipart(field: &str, content_type: &str, data: &str) -> Body {
        Body::from(format!(
            "--BOUNDARY\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"photo\"\r\nContent-Type: {content_type}\r\n\r\n{data}\r\n--BOUNDARY--\r\n"
        ))
    }

    #[tokio::test]
    async fn test_writes_require_secret() {
        let requests = [
            Request::post("/products").header("content-type", "application/json").body(Body::from("{}")).unwrap(),
            Request::put("/products/ip15").header("content-type", "application/json").body(Body::from("{}")).unwrap(),
            Request::delete("/products/ip15").body(Body::empty()).unwrap(),
            Request::post("/products/ip15/variants").header("x-admin-secret", "wrong").body(Body::empty()).unwrap(),
            Request::delete(format!("/products/ip15/variants/{}", Uuid::nil())).body(Body::empty()).unwrap(),
        ];
        for request in requests {
            let (status, body) = send(app(Arc::default()), request).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body, serde_json::json!({"success": false, "error": "Unauthorized"}));
        }
    }

    #[tokio::test]
    async fn test_invalid_body_is_400() {
        let request = Request::post("/products")
            .header("x-admin-secret", "s3cret")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name": "", "category": "iphone"}"#))
            .unwrap();
        let (status, body) = send(app(Arc::default()), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let request = Request::post("/products")
            .header("x-admin-secret", "s3cret")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name": "iPad", "category": "ipad"}"#))
            .unwrap();
        let (status, _) = send(app(Arc::default()), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_without_image_is_400() {
        let images = Arc::new(MemoryStore::default());
        let request = Request::post("/products/ip15/image")
            .header("x-admin-secret", "s3cret")
            .header("content-type", "multipart/form-data; boundary=BOUNDARY")
            .body(multipart("document", "image/png", "png-bytes"))
            .unwrap();
        let (status, body) = send(app(images.clone()), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({"success": false, "error": "No image provided"}));
        assert!(images.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_rejects_non_image() {
        let request = Request::post("/products/ip15/image")
            .header("x-admin-secret", "s3cret")
            .header("content-type", "multipart/form-data; boundary=BOUNDARY")
            .body(multipart("image", "text/plain", "hello"))
            .unwrap();
        let (status, body) = send(app(Arc::default()), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Only image uploads are accepted");
    }

    #[tokio::test]
    async fn test_upload_without_multipart_body_is_400() {
        for content_type in [None, Some("application/json")] {
            let mut request = Request::post("/products/ip15/image").header("x-admin-secret", "s3cret");
            if let Some(content_type) = content_type {
                request = request.header("content-type", content_type);
            }
            let (status, body) = send(app(Arc::default()), request.body(Body::from("{}")).unwrap()).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["success"], false);
            assert!(body["error"].is_string());
        }
    }

    #[tokio::test]
    async fn test_bad_variant_id_rejected() {
        let request = Request::put("/products/ip15/variants/not-a-uuid")
            .header("x-admin-secret", "s3cret")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let (status, _) = send(app(Arc::default()), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
