//! Sheet rows to catalog products.

use std::collections::HashMap;

use tracing::debug;

use crate::domain::{parse_boolean_cell, Category, Condition, Product, Variant};
use crate::sheets::SheetRow;

/// Fields of a row that passed validation.
struct ValidRow<'a> {
    key: String,
    name: &'a str,
    category: Category,
    variant: Variant,
    image: Option<&'a str>,
    featured: bool,
}

fn required(cell: &Option<String>) -> Option<&str> {
    cell.as_deref().filter(|v| !v.is_empty())
}

fn validate(row: &SheetRow) -> Option<ValidRow<'_>> {
    if !parse_boolean_cell(row.active.as_deref()) { return None; }
    let model_id = required(&row.model_id)?;
    let name = required(&row.name)?;
    let category = required(&row.category)?;
    let storage = required(&row.storage)?;
    let condition = required(&row.condition)?;

    let condition = Condition::from_label(condition)?;
    let category = Category::from_cell(category);
    Some(ValidRow {
        key: model_id.to_lowercase(),
        name,
        category,
        variant: Variant { condition, storage: storage.to_string() },
        image: required(&row.image),
        featured: parse_boolean_cell(row.featured.as_deref()),
    })
}

/// Groups valid rows into products keyed by lowercased model id and sorts them
/// featured-first, then by name. Invalid rows are dropped.
pub fn build_products(rows: &[SheetRow]) -> Vec<Product> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut products: Vec<Product> = Vec::new();
    let mut skipped = 0usize;

    for row in rows {
        let Some(valid) = validate(row) else {
            skipped += 1;
            continue;
        };
        match index.get(&valid.key) {
            Some(&i) => products[i].variants.push(valid.variant),
            None => {
                index.insert(valid.key.clone(), products.len());
                products.push(Product {
                    id: valid.key,
                    name: valid.name.to_string(),
                    category: valid.category,
                    image: valid.image.map(str::to_string),
                    variants: vec![valid.variant],
                    featured: valid.featured,
                });
            }
        }
    }

    if skipped > 0 {
        debug!(skipped, "Dropped invalid catalog rows");
    }
    products.sort_by(Product::display_order);
    products
}
