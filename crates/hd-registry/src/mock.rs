//! In-memory metadata source for testing.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::product::ProductEntry;
use crate::source::{MetadataSource, RegistryError};

/// Metadata source backed by a replaceable in-memory map.
///
/// # Example
///
/// ```ignore
/// use hd_registry::{MockSource, ProductRegistry};
///
/// let source = MockSource::new().with_product("acme", "2024.1", "index.html");
/// let registry = ProductRegistry::load(&source)?;
///
/// source.set_product("acme", "2024.2", "index.html");
/// registry.reload(&source)?;
/// ```
#[derive(Debug, Default)]
pub struct MockSource {
    products: RwLock<HashMap<String, ProductEntry>>,
    fail: RwLock<bool>,
}

impl MockSource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a product.
    #[must_use]
    pub fn with_product(self, name: &str, default_version: &str, initial_page: &str) -> Self {
        self.set_product(name, default_version, initial_page);
        self
    }

    /// Insert or replace a product.
    pub fn set_product(&self, name: &str, default_version: &str, initial_page: &str) {
        self.products.write().unwrap().insert(
            name.to_owned(),
            ProductEntry::new(default_version, initial_page),
        );
    }

    /// Remove a product.
    pub fn remove_product(&self, name: &str) {
        self.products.write().unwrap().remove(name);
    }

    /// Make subsequent loads fail (or succeed again).
    pub fn set_failing(&self, fail: bool) {
        *self.fail.write().unwrap() = fail;
    }
}

impl MetadataSource for MockSource {
    fn load(&self) -> Result<HashMap<String, ProductEntry>, RegistryError> {
        if *self.fail.read().unwrap() {
            return Err(RegistryError::Io {
                path: "mock".into(),
                source: std::io::Error::other("mock source failure"),
            });
        }
        Ok(self.products.read().unwrap().clone())
    }
}
