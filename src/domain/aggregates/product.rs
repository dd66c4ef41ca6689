//! Product Aggregate

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::domain::value_objects::{Category, Condition};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant { pub condition: Condition, pub storage: String }

/// A catalog product grouping every variant row sharing one model id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub variants: Vec<Variant>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub featured: bool,
}

impl Product {
    /// Featured products first, then by name.
    pub fn display_order(&self, other: &Self) -> Ordering {
        other.featured.cmp(&self.featured).then_with(|| compare_names(&self.name, &other.name))
    }
}

/// Collation-style name ordering: base letters first, ignoring accents and
/// case; then unaccented before accented; then lowercase before uppercase.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(base_letters(b))
        .then_with(|| folded(a).cmp(folded(b)))
        .then_with(|| b.cmp(a))
}

fn base_letters(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfd().filter(|c| !is_combining_mark(*c)).flat_map(char::to_lowercase)
}

fn folded(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfd().flat_map(char::to_lowercase)
}
