//! Catalog loading.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::product::Product;

/// Base URL for product pages; product slugs are appended to it.
pub const DEFAULT_PRODUCT_BASE_URL: &str = "https://fabricadoaluminio.com.br/produto/";

const EMBEDDED_CATALOG: &str = include_str!("../data/catalog.json");

/// Catalog load failure.
///
/// Fatal to the configurator: without a catalog nothing can be resolved, so
/// callers surface an "unavailable" state instead of a question.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed catalog document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("catalog contains no products")]
    Empty,

    #[error("duplicate product slug '{0}'")]
    DuplicateSlug(String),
}

/// Ordered, immutable list of products.
///
/// Cheap to clone (the records are shared).
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    products: Arc<[Product]>,
}

impl Catalog {
    /// Build a catalog from already-constructed products.
    pub fn new(products: Vec<Product>) -> Result<Self, CatalogError> {
        if products.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::with_capacity(products.len());
        for p in &products {
            if !seen.insert(p.slug()) {
                return Err(CatalogError::DuplicateSlug(p.slug().to_string()));
            }
        }

        Ok(Self {
            products: products.into(),
        })
    }

    /// The catalog shipped with the crate.
    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_json(EMBEDDED_CATALOG)
    }

    /// Parse a catalog document (a JSON array of product records).
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let products: Vec<Product> = serde_json::from_str(json)?;
        let catalog = Self::new(products)?;
        tracing::debug!(products = catalog.len(), "catalog parsed");
        Ok(catalog)
    }

    /// Read and parse a catalog document from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.iter()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Product;
    type IntoIter = core::slice::Iter<'a, Product>;

    fn into_iter(self) -> Self::IntoIter {
        self.products.iter()
    }
}
