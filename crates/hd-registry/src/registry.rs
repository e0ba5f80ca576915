//! Process-wide product registry.
//!
//! # Thread Safety
//!
//! `ProductRegistry` holds an `Arc<Products>` behind a single `RwLock`.
//! A reload builds the new snapshot outside the lock and swaps the `Arc`
//! under the write lock, so readers observe either the old or the new
//! mapping and never a partial one. Readers that need several consistent
//! lookups take a [`snapshot`](ProductRegistry::snapshot).

use std::sync::{Arc, RwLock};

use crate::product::{ProductEntry, Products};
use crate::source::{MetadataSource, RegistryError};

/// Registry of known products, swapped wholesale on reload.
#[derive(Debug, Default)]
pub struct ProductRegistry {
    current: RwLock<Arc<Products>>,
}

impl ProductRegistry {
    /// Create a registry holding `products`.
    #[must_use]
    pub fn new(products: Products) -> Self {
        Self {
            current: RwLock::new(Arc::new(products)),
        }
    }

    /// Create a registry from the initial contents of `source`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the source cannot be loaded.
    pub fn load(source: &dyn MetadataSource) -> Result<Self, RegistryError> {
        Ok(Self::new(Products::new(source.load()?)))
    }

    /// Replace the whole mapping with the contents of `source`.
    ///
    /// On error the current mapping is left untouched.
    ///
    /// # Returns
    ///
    /// Number of products after the reload.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the source cannot be loaded.
    pub fn reload(&self, source: &dyn MetadataSource) -> Result<usize, RegistryError> {
        let products = Products::new(source.load()?);
        Ok(self.replace(products))
    }

    /// Swap in a new snapshot and return its product count.
    pub fn replace(&self, products: Products) -> usize {
        let count = products.len();
        *self.current.write().unwrap() = Arc::new(products);
        tracing::debug!(count, "Product registry replaced");
        count
    }

    /// Current snapshot. Cheap: clones an `Arc`.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Products> {
        Arc::clone(&self.current.read().unwrap())
    }

    /// Check whether a product is known.
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.current.read().unwrap().exists(name)
    }

    /// Look up a product entry.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ProductEntry> {
        self.current.read().unwrap().get(name).cloned()
    }

    /// Current version of a product, `None` if unknown.
    #[must_use]
    pub fn default_version(&self, name: &str) -> Option<String> {
        self.current
            .read()
            .unwrap()
            .default_version(name)
            .map(str::to_owned)
    }

    /// Landing page of a product, `None` if unknown.
    #[must_use]
    pub fn initial_page(&self, name: &str) -> Option<String> {
        self.current
            .read()
            .unwrap()
            .initial_page(name)
            .map(str::to_owned)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    static_assertions::assert_impl_all!(super::ProductRegistry: Send, Sync);

    struct FixedSource(HashMap<String, ProductEntry>);

    impl MetadataSource for FixedSource {
        fn load(&self) -> Result<HashMap<String, ProductEntry>, RegistryError> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    impl MetadataSource for FailingSource {
        fn load(&self) -> Result<HashMap<String, ProductEntry>, RegistryError> {
            Err(RegistryError::InvalidName(String::new()))
        }
    }

    fn source(entries: &[(&str, &str, &str)]) -> FixedSource {
        FixedSource(
            entries
                .iter()
                .map(|(name, version, page)| ((*name).to_owned(), ProductEntry::new(*version, *page)))
                .collect(),
        )
    }

    #[test]
    fn test_unknown_product_is_absent() {
        let registry = ProductRegistry::default();

        assert!(!registry.exists("acme"));
        assert_eq!(registry.get("acme"), None);
        assert_eq!(registry.default_version("acme"), None);
        assert_eq!(registry.initial_page("acme"), None);
    }

    #[test]
    fn test_load_and_lookup() {
        let registry =
            ProductRegistry::load(&source(&[("acme", "2024.1", "index.html")])).unwrap();

        assert!(registry.exists("acme"));
        assert_eq!(registry.default_version("acme").as_deref(), Some("2024.1"));
        assert_eq!(registry.initial_page("acme").as_deref(), Some("index.html"));
    }

    #[test]
    fn test_reload_replaces_wholesale() {
        let registry = ProductRegistry::load(&source(&[
            ("acme", "2024.1", "index.html"),
            ("legacy", "2020.1", "index.html"),
        ]))
        .unwrap();

        let count = registry
            .reload(&source(&[("acme", "2024.2", "start.html")]))
            .unwrap();

        assert_eq!(count, 1);
        assert!(!registry.exists("legacy"));
        assert_eq!(
            registry.get("acme"),
            Some(ProductEntry::new("2024.2", "start.html"))
        );
    }

    #[test]
    fn test_failed_reload_keeps_previous_mapping() {
        let registry =
            ProductRegistry::load(&source(&[("acme", "2024.1", "index.html")])).unwrap();

        assert!(registry.reload(&FailingSource).is_err());

        assert_eq!(registry.default_version("acme").as_deref(), Some("2024.1"));
    }

    #[test]
    fn test_snapshot_is_stable_across_reload() {
        let registry =
            ProductRegistry::load(&source(&[("acme", "2024.1", "index.html")])).unwrap();
        let before = registry.snapshot();

        registry
            .reload(&source(&[("acme", "2024.2", "index.html")]))
            .unwrap();

        assert_eq!(before.default_version("acme"), Some("2024.1"));
        assert_eq!(registry.snapshot().default_version("acme"), Some("2024.2"));
    }

    #[test]
    fn test_concurrent_readers_see_whole_snapshots() {
        let registry = Arc::new(ProductRegistry::new(Products::default()));
        let full = source(&[
            ("a", "2024.1", "index.html"),
            ("b", "2024.1", "index.html"),
        ]);

        let reader = {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                for _ in 0..1000 {
                    let snapshot = registry.snapshot();
                    assert!(snapshot.is_empty() || snapshot.len() == 2);
                }
            })
        };

        for _ in 0..100 {
            registry.reload(&full).unwrap();
            registry.replace(Products::default());
        }

        reader.join().unwrap();
    }
}
