//! API shape of a stored product.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::{ProductRow, VariantRow};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantView {
    pub id: Uuid,
    pub condition: String,
    pub storage: Option<String>,
    pub price: Option<Decimal>,
    pub color: Option<String>,
}

/// A product with only its active variants plus the price range and option
/// lists the storefront filters on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub category: String,
    pub image: Option<String>,
    pub featured: bool,
    pub variants: Vec<VariantView>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub storage_options: Vec<String>,
    pub colors: Vec<String>,
}

impl From<&VariantRow> for VariantView {
    fn from(v: &VariantRow) -> Self {
        Self { id: v.id, condition: v.condition.clone(), storage: v.storage.clone(), price: v.price, color: v.color.clone() }
    }
}

impl From<ProductRow> for ProductView {
    fn from(p: ProductRow) -> Self {
        let active: Vec<&VariantRow> = p.variants.iter().filter(|v| v.active).collect();
        let prices = active.iter().filter_map(|v| v.price).filter(|price| !price.is_zero());
        let price_min = prices.clone().min();
        let price_max = prices.max();
        let storage_options = distinct(active.iter().filter_map(|v| v.storage.as_deref()));
        let colors = distinct(active.iter().filter_map(|v| v.color.as_deref()));

        Self {
            variants: active.iter().map(|v| VariantView::from(*v)).collect(),
            id: p.id,
            name: p.name,
            category: p.category,
            image: p.image_url,
            featured: p.featured,
            price_min,
            price_max,
            storage_options,
            colors,
        }
    }
}

/// Non-empty values in first-seen order, without repeats.
fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values.filter(|v| !v.is_empty()) {
        if !out.iter().any(|seen| seen == value) {
            out.push(value.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn variant(storage: &str, price: Option<i64>, color: Option<&str>, active: bool) -> VariantRow {
        VariantRow {
            id: Uuid::now_v7(),
            product_id: "ip15".into(),
            condition: "sealed".into(),
            storage: Some(storage.into()),
            price: price.map(Decimal::from),
            color: color.map(String::from),
            active,
            variant_images: vec![],
        }
    }

    fn product(variants: Vec<VariantRow>) -> ProductRow {
        ProductRow {
            id: "ip15".into(), name: "iPhone 15".into(), category: "iphone".into(),
            image_url: Some("https://cdn.example.com/ip15.png".into()), featured: true, active: true,
            created_at: Utc::now(), variants,
        }
    }

    #[test]
    fn test_inactive_variants_hidden() {
        let view = ProductView::from(product(vec![
            variant("128GB", Some(900), Some("Negro"), true),
            variant("256GB", Some(1100), Some("Azul"), false),
        ]));
        assert_eq!(view.variants.len(), 1);
        assert_eq!(view.price_max, Some(Decimal::from(900)));
        assert_eq!(view.colors, vec!["Negro"]);
    }

    #[test]
    fn test_price_range_and_options() {
        let view = ProductView::from(product(vec![
            variant("128GB", Some(900), Some("Negro"), true),
            variant("256GB", None, Some("Negro"), true),
            variant("128GB", Some(750), None, true),
            variant("512GB", Some(0), Some("Azul"), true),
        ]));
        assert_eq!(view.price_min, Some(Decimal::from(750)));
        assert_eq!(view.price_max, Some(Decimal::from(900)));
        assert_eq!(view.storage_options, vec!["128GB", "256GB", "512GB"]);
        assert_eq!(view.colors, vec!["Negro", "Azul"]);
    }

    #[test]
    fn test_no_prices() {
        let view = ProductView::from(product(vec![variant("64GB", None, None, true)]));
        assert_eq!(view.price_min, None);
        let json = serde_json::to_value(&view).unwrap();
        assert!(json["priceMin"].is_null());
        assert_eq!(json["storageOptions"], serde_json::json!(["64GB"]));
        assert_eq!(json["image"], "https://cdn.example.com/ip15.png");
    }
}
