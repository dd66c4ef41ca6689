//! Catalog domain model
pub mod aggregates;
pub mod value_objects;

pub use aggregates::{Product, Variant};
pub use value_objects::{parse_boolean_cell, Category, Condition};
