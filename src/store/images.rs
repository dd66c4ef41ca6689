//! Variant image rows. The files themselves live in object storage.

use sqlx::PgPool;
use uuid::Uuid;

use super::VariantImage;

pub async fn list_variant_images(pool: &PgPool, variant_id: Uuid) -> Result<Vec<VariantImage>, sqlx::Error> {
    sqlx::query_as::<_, VariantImage>("SELECT * FROM variant_images WHERE variant_id = $1 ORDER BY created_at, id")
        .bind(variant_id).fetch_all(pool).await
}

pub async fn insert_variant_image(pool: &PgPool, variant_id: Uuid, image_url: &str) -> Result<VariantImage, sqlx::Error> {
    sqlx::query_as::<_, VariantImage>("INSERT INTO variant_images (id, variant_id, image_url, created_at) VALUES ($1, $2, $3, NOW()) RETURNING *")
        .bind(Uuid::now_v7()).bind(variant_id).bind(image_url)
        .fetch_one(pool).await
}

pub async fn delete_variant_image(pool: &PgPool, variant_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM variant_images WHERE id = $1 AND variant_id = $2").bind(id).bind(variant_id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
