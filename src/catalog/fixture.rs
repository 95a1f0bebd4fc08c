//! Fixture catalog
//!
//! An in-memory catalog loaded from YAML, for offline use and tests.
//!
//! ```yaml
//! products:
//!   - id: 77
//!     title: Fog Linen Chambray Towel
//!     variants:
//!       - id: 1
//!         title: XS / Silver
//!         price: "49"
//! ```

use std::{fs, path::Path};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    catalog::{CatalogClient, CatalogError, SearchRequest},
    products::Product,
};

/// Fixture loading errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading the fixture file
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),
}

#[derive(Debug, Deserialize)]
struct CatalogFixture {
    #[serde(default)]
    products: Vec<Product>,
}

/// Catalog backed by a fixed product list.
///
/// Searches match the query case-insensitively against product titles; an
/// empty query matches everything.
#[derive(Debug, Clone, Default)]
pub struct FixtureCatalog {
    products: Vec<Product>,
}

impl FixtureCatalog {
    /// Create a catalog from products.
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// Parse a catalog from YAML.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::Yaml`] if the document does not parse.
    pub fn from_yaml(yaml: &str) -> Result<Self, FixtureError> {
        let fixture: CatalogFixture = serde_norway::from_str(yaml)?;

        Ok(Self::new(fixture.products))
    }

    /// Load a catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml(&contents)
    }

    /// All products in catalog order.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Products matching `request`, paginated.
    pub fn page(&self, request: &SearchRequest) -> Vec<Product> {
        let needle = request.query().to_lowercase();
        let size = usize::try_from(request.page_size()).unwrap_or(usize::MAX);
        let skip = usize::try_from(request.page())
            .unwrap_or(usize::MAX)
            .saturating_mul(size);

        self.products
            .iter()
            .filter(|product| needle.is_empty() || product.title.to_lowercase().contains(&needle))
            .skip(skip)
            .take(size)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CatalogClient for FixtureCatalog {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Product>, CatalogError> {
        Ok(self.page(request))
    }
}
