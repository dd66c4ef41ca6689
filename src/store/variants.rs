//! Variant queries

use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::{NewVariant, VariantRow, VariantUpdate};

pub async fn insert_variant<'e>(exec: impl PgExecutor<'e>, product_id: &str, new: &NewVariant) -> Result<VariantRow, sqlx::Error> {
    sqlx::query_as::<_, VariantRow>(
        "INSERT INTO variants (id, product_id, condition, storage, price, color, active, created_at) VALUES ($1, $2, $3, $4, $5, $6, TRUE, NOW()) RETURNING *")
        .bind(Uuid::now_v7()).bind(product_id).bind(new.condition.as_str()).bind(&new.storage).bind(new.price).bind(&new.color)
        .fetch_one(exec).await
}

pub async fn variant_exists(pool: &PgPool, product_id: &str, id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM variants WHERE id = $1 AND product_id = $2)")
        .bind(id).bind(product_id).fetch_one(pool).await
}

/// Only touches a variant that belongs to `product_id`.
pub async fn update_variant(pool: &PgPool, product_id: &str, id: Uuid, update: &VariantUpdate) -> Result<Option<VariantRow>, sqlx::Error> {
    sqlx::query_as::<_, VariantRow>(
        "UPDATE variants SET condition = COALESCE($3, condition), storage = COALESCE($4, storage), price = COALESCE($5, price), \
         color = COALESCE($6, color), active = COALESCE($7, active) WHERE id = $1 AND product_id = $2 RETURNING *")
        .bind(id).bind(product_id).bind(update.condition.map(|c| c.as_str())).bind(&update.storage).bind(update.price).bind(&update.color).bind(update.active)
        .fetch_optional(pool).await
}

pub async fn delete_variant(pool: &PgPool, product_id: &str, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM variants WHERE id = $1 AND product_id = $2").bind(id).bind(product_id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
