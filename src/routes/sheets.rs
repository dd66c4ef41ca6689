//! Read-only catalog served from the spreadsheet snapshot cache.

use std::sync::Arc;

use axum::{
    extract::{FromRef, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use tracing::info;

use super::{AdminSecret, ApiResponse, ListQuery, RequireAdmin};
use crate::catalog::ProductCache;
use crate::domain::Product;
use crate::error::{upstream, ApiError};

#[derive(Clone)]
pub struct SheetsState {
    pub cache: Arc<ProductCache>,
    pub admin_secret: AdminSecret,
}

impl FromRef<SheetsState> for AdminSecret {
    fn from_ref(state: &SheetsState) -> Self { state.admin_secret.clone() }
}

impl FromRef<SheetsState> for Arc<ProductCache> {
    fn from_ref(state: &SheetsState) -> Self { state.cache.clone() }
}

pub fn router(state: SheetsState) -> Router {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/refresh", post(refresh_products))
        .route("/products/:id", get(get_product))
        .with_state(state)
}

async fn list_products(State(cache): State<Arc<ProductCache>>, Query(query): Query<ListQuery>) -> Result<Json<ApiResponse<Vec<Product>>>, ApiError> {
    let snapshot = cache.get_products(false).await.map_err(upstream("Failed to fetch products"))?;
    let products: Vec<Product> = snapshot.iter().filter(|p| query.matches(p.category.as_str(), p.featured)).cloned().collect();
    Ok(Json(ApiResponse::list(products)))
}

async fn get_product(State(cache): State<Arc<ProductCache>>, Path(id): Path<String>) -> Result<Json<ApiResponse<Product>>, ApiError> {
    let snapshot = cache.get_products(false).await.map_err(upstream("Failed to fetch product"))?;
    let id = id.to_lowercase();
    let product = snapshot.iter().find(|p| p.id == id).cloned().ok_or(ApiError::NotFound("Product not found"))?;
    Ok(Json(ApiResponse::data(product)))
}

async fn refresh_products(_admin: RequireAdmin, State(cache): State<Arc<ProductCache>>) -> Result<Json<ApiResponse<()>>, ApiError> {
    cache.invalidate().await;
    let snapshot = cache.get_products(true).await.map_err(upstream("Failed to refresh products"))?;
    info!(products = snapshot.len(), "Catalog refreshed on request");
    Ok(Json(ApiResponse::message("Cache refreshed").with_count(snapshot.len())))
}
