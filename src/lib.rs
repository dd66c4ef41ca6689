//! Reseller Catalog
//!
//! Product catalog API for a device reseller, served from one of two backends.
//!
//! ## Backends
//! - **sheets**: read-only catalog built from a Google Sheet, one row per
//!   variant, cached in memory for five minutes
//! - **database**: PostgreSQL catalog with product/variant CRUD and image
//!   uploads to object storage
//!
//! Writes and cache refreshes are gated by a shared admin secret header.

pub mod catalog;
pub mod config;
pub mod domain;
pub mod error;
pub mod routes;
pub mod sheets;
pub mod storage;
pub mod store;

pub use catalog::{ProductCache, DEFAULT_CACHE_TTL};
pub use config::{Backend, Config, ConfigError};
pub use domain::{Category, Condition, Product, Variant};
pub use error::ApiError;
