//! Aggregates module
pub mod product;

pub use product::{compare_names, Product, Variant};
