//! Product catalog (static, immutable).
//!
//! The catalog is loaded once at startup and only read afterwards. Nothing in
//! this crate knows about facets, questions or selections; it only models the
//! product records and their attribute codes.

pub mod catalog;
pub mod product;

pub use catalog::{Catalog, CatalogError, DEFAULT_PRODUCT_BASE_URL};
pub use product::{
    Category, FillMaterial, LeafCount, OpeningSystem, Product, Shutter, ShutterDrive, WidthRange,
};
