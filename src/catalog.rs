//! Product catalog collaborator.
//!
//! The scanning pipeline only needs `ProductCatalog::lookup`; where products
//! come from is up to the implementation. `JsonCatalog` is a small
//! file-backed implementation reading a JSON array of [`ProductInfo`].

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::error::{ScanError, ScanResult};

/// What the catalog knows about a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub code: u64,
    pub name: String,
    #[serde(default)]
    pub packaging: String,
    /// Nominal pack weight as printed in the catalog.
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub storage_type: String,
}

/// Errors raised while loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse catalog '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Product code {0} appears more than once in the catalog")]
    DuplicateCode(u64),

    #[error("Catalog has no backing file to reload from")]
    NoSource,
}

/// Lookup contract the dispatch step depends on.
#[cfg_attr(test, mockall::automock)]
pub trait ProductCatalog: Send + Sync {
    /// # Errors
    ///
    /// - `ScanError::UnknownProductCode` if the code is not in the catalog
    fn lookup(&self, code: u64) -> ScanResult<ProductInfo>;

    /// Re-read the catalog from its source.
    fn reload(&self) -> Result<(), CatalogError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Catalog backed by a JSON file.
#[derive(Debug)]
pub struct JsonCatalog {
    path: Option<PathBuf>,
    products: RwLock<HashMap<u64, ProductInfo>>,
}

impl JsonCatalog {
    /// Load the catalog from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref().to_path_buf();
        let products = read_products(&path)?;
        info!(path = %path.display(), products = products.len(), "Product catalog loaded");
        Ok(Self {
            path: Some(path),
            products: RwLock::new(products),
        })
    }

    /// Build an in-memory catalog with no backing file.
    pub fn from_products(products: impl IntoIterator<Item = ProductInfo>) -> Result<Self, CatalogError> {
        Ok(Self {
            path: None,
            products: RwLock::new(index(products)?),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl ProductCatalog for JsonCatalog {
    fn lookup(&self, code: u64) -> ScanResult<ProductInfo> {
        self.products
            .read()
            .get(&code)
            .cloned()
            .ok_or(ScanError::UnknownProductCode(code))
    }

    /// On failure the previously loaded products stay in place.
    fn reload(&self) -> Result<(), CatalogError> {
        let path = self.path.as_ref().ok_or(CatalogError::NoSource)?;
        let products = read_products(path)?;
        info!(path = %path.display(), products = products.len(), "Product catalog reloaded");
        *self.products.write() = products;
        Ok(())
    }

    fn len(&self) -> usize {
        self.products.read().len()
    }
}

fn read_products(path: &Path) -> Result<HashMap<u64, ProductInfo>, CatalogError> {
    let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let products: Vec<ProductInfo> =
        serde_json::from_str(&content).map_err(|e| CatalogError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
    index(products)
}

fn index(products: impl IntoIterator<Item = ProductInfo>) -> Result<HashMap<u64, ProductInfo>, CatalogError> {
    let mut map = HashMap::new();
    for product in products {
        let code = product.code;
        if map.insert(code, product).is_some() {
            return Err(CatalogError::DuplicateCode(code));
        }
    }
    Ok(map)
}
