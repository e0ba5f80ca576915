//! Product entries and immutable product snapshots.

use std::collections::HashMap;

use serde::Deserialize;

/// Registry entry for a single documentation product.
///
/// The metadata file stores the current version as `productVersion`;
/// `defaultVersion` is accepted as well.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductEntry {
    /// Version served from the live working tree.
    #[serde(rename = "productVersion", alias = "defaultVersion")]
    pub default_version: String,
    /// Landing page, relative to the product root (e.g. `index.html`).
    pub initial_page: String,
}

impl ProductEntry {
    /// Create a new entry.
    #[must_use]
    pub fn new(default_version: impl Into<String>, initial_page: impl Into<String>) -> Self {
        Self {
            default_version: default_version.into(),
            initial_page: initial_page.into(),
        }
    }
}

/// Immutable snapshot of every known product.
///
/// Product names may contain `/`-separated nested segments
/// (e.g. `"suite/module"`); each nested product has its own entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Products {
    entries: HashMap<String, ProductEntry>,
}

impl Products {
    /// Create a snapshot from a name to entry map.
    #[must_use]
    pub fn new(entries: HashMap<String, ProductEntry>) -> Self {
        Self { entries }
    }

    /// Look up a product entry.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ProductEntry> {
        self.entries.get(name)
    }

    /// Check whether a product is known.
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Current version of a product.
    #[must_use]
    pub fn default_version(&self, name: &str) -> Option<&str> {
        self.get(name).map(|e| e.default_version.as_str())
    }

    /// Landing page of a product.
    #[must_use]
    pub fn initial_page(&self, name: &str) -> Option<&str> {
        self.get(name).map(|e| e.initial_page.as_str())
    }

    /// Number of products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no products are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, ProductEntry)> for Products {
    fn from_iter<I: IntoIterator<Item = (String, ProductEntry)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
