//! Product queries

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::Category;

use super::{insert_variant, NewProduct, ProductRow, ProductUpdate, VariantImage, VariantRow};

pub async fn list_active_products(pool: &PgPool) -> Result<Vec<ProductRow>, sqlx::Error> {
    let products = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE active = TRUE ORDER BY featured DESC, name")
        .fetch_all(pool).await?;
    attach_variants(pool, products).await
}

pub async fn find_product(pool: &PgPool, id: &str) -> Result<Option<ProductRow>, sqlx::Error> {
    let Some(product) = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1")
        .bind(id).fetch_optional(pool).await?
    else {
        return Ok(None);
    };
    Ok(attach_variants(pool, vec![product]).await?.pop())
}

pub async fn product_exists(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)").bind(id).fetch_one(pool).await
}

/// Inserts the product and any nested variants in one transaction.
pub async fn insert_product(pool: &PgPool, new: &NewProduct) -> Result<ProductRow, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let product = sqlx::query_as::<_, ProductRow>(
        "INSERT INTO products (id, name, category, image_url, featured, active, created_at) VALUES ($1, $2, $3, $4, $5, $6, NOW()) RETURNING *")
        .bind(new.slug()).bind(&new.name).bind(new.category.as_str()).bind(&new.image_url).bind(new.featured).bind(new.active)
        .fetch_one(&mut *tx).await?;
    for variant in &new.variants {
        insert_variant(&mut *tx, &product.id, variant).await?;
    }
    tx.commit().await?;
    Ok(product)
}

pub async fn update_product(pool: &PgPool, id: &str, update: &ProductUpdate) -> Result<Option<ProductRow>, sqlx::Error> {
    sqlx::query_as::<_, ProductRow>(
        "UPDATE products SET name = COALESCE($2, name), category = COALESCE($3, category), image_url = COALESCE($4, image_url), \
         featured = COALESCE($5, featured), active = COALESCE($6, active) WHERE id = $1 RETURNING *")
        .bind(id).bind(&update.name).bind(update.category.as_ref().map(Category::as_str)).bind(&update.image_url).bind(update.featured).bind(update.active)
        .fetch_optional(pool).await
}

pub async fn set_product_image(pool: &PgPool, id: &str, url: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE products SET image_url = $2 WHERE id = $1").bind(id).bind(url).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

/// Returns false when no product had that id.
pub async fn delete_product(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

async fn attach_variants(pool: &PgPool, mut products: Vec<ProductRow>) -> Result<Vec<ProductRow>, sqlx::Error> {
    if products.is_empty() { return Ok(products); }
    let ids: Vec<String> = products.iter().map(|p| p.id.clone()).collect();
    let variants = sqlx::query_as::<_, VariantRow>("SELECT * FROM variants WHERE product_id = ANY($1) ORDER BY created_at, id")
        .bind(&ids).fetch_all(pool).await?;

    let variant_ids: Vec<Uuid> = variants.iter().map(|v| v.id).collect();
    let images = sqlx::query_as::<_, VariantImage>("SELECT * FROM variant_images WHERE variant_id = ANY($1) ORDER BY created_at, id")
        .bind(&variant_ids).fetch_all(pool).await?;

    let mut images_by_variant: HashMap<Uuid, Vec<VariantImage>> = HashMap::new();
    for image in images {
        images_by_variant.entry(image.variant_id).or_default().push(image);
    }
    let mut variants_by_product: HashMap<String, Vec<VariantRow>> = HashMap::new();
    for mut variant in variants {
        variant.variant_images = images_by_variant.remove(&variant.id).unwrap_or_default();
        variants_by_product.entry(variant.product_id.clone()).or_default().push(variant);
    }
    for product in &mut products {
        product.variants = variants_by_product.remove(&product.id).unwrap_or_default();
    }
    Ok(products)
}
