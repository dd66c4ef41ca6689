//! PostgreSQL catalog store.
//!
//! Backs the read/write API when the catalog lives in a database instead of a
//! spreadsheet. Products own variants, variants own images; deleting a parent
//! cascades.

mod images;
mod products;
mod variants;
mod view;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::domain::{Category, Condition};

pub use images::{delete_variant_image, insert_variant_image, list_variant_images};
pub use products::{delete_product, find_product, insert_product, list_active_products, product_exists, set_product_image, update_product};
pub use variants::{delete_variant, insert_variant, update_variant, variant_exists};
pub use view::{ProductView, VariantView};

pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new().max_connections(10).connect(database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub category: String,
    pub image_url: Option<String>,
    pub featured: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(default)]
    pub variants: Vec<VariantRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct VariantRow {
    pub id: Uuid,
    pub product_id: String,
    pub condition: String,
    pub storage: Option<String>,
    pub price: Option<Decimal>,
    pub color: Option<String>,
    pub active: bool,
    #[sqlx(skip)]
    #[serde(default)]
    pub variant_images: Vec<VariantImage>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct VariantImage { pub id: Uuid, pub variant_id: Uuid, pub image_url: String, pub created_at: DateTime<Utc> }

#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "non_blank_slug"))]
pub struct NewProduct {
    #[validate(length(min = 1, max = 100))]
    pub id: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(custom = "known_category")]
    pub category: Category,
    #[validate(url)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    #[validate]
    pub variants: Vec<NewVariant>,
}

impl NewProduct {
    /// Explicit id, or a slug of the name.
    pub fn slug(&self) -> String {
        match &self.id {
            Some(id) => id.trim().to_lowercase(),
            None => self.name.trim().to_lowercase().split_whitespace().collect::<Vec<_>>().join("-"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProductUpdate {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(custom = "known_category")]
    pub category: Option<Category>,
    #[validate(url)]
    pub image_url: Option<String>,
    pub featured: Option<bool>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewVariant {
    pub condition: Condition,
    #[validate(length(min = 1, max = 50))]
    pub storage: Option<String>,
    #[validate(custom = "non_negative")]
    pub price: Option<Decimal>,
    #[validate(length(min = 1, max = 50))]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct VariantUpdate {
    pub condition: Option<Condition>,
    #[validate(length(min = 1, max = 50))]
    pub storage: Option<String>,
    #[validate(custom = "non_negative")]
    pub price: Option<Decimal>,
    #[validate(length(min = 1, max = 50))]
    pub color: Option<String>,
    pub active: Option<bool>,
}

fn default_active() -> bool { true }

fn non_blank_slug(product: &NewProduct) -> Result<(), ValidationError> {
    if product.slug().is_empty() { Err(ValidationError::new("blank_id")) } else { Ok(()) }
}

fn known_category(category: &Category) -> Result<(), ValidationError> {
    if category.is_known() { Ok(()) } else { Err(ValidationError::new("unknown_category")) }
}

fn non_negative(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() { Err(ValidationError::new("negative_price")) } else { Ok(()) }
}
