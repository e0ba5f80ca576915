//! Metadata sources the registry is loaded from.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::product::ProductEntry;

/// Error raised while loading product metadata.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The metadata file could not be read.
    #[error("Failed to read product list {}: {source}", .path.display())]
    Io {
        /// Metadata file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The metadata file is not a valid product list.
    #[error("Invalid product list {}: {source}", .path.display())]
    Parse {
        /// Metadata file path.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// A product name cannot be addressed by URL segments.
    #[error("Invalid product name {0:?}")]
    InvalidName(String),
}

/// External collaborator that produces the full product mapping.
pub trait MetadataSource: Send + Sync {
    /// Load every product entry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the source cannot be read or parsed.
    fn load(&self) -> Result<HashMap<String, ProductEntry>, RegistryError>;
}

/// Product list stored as a JSON object in a file.
///
/// ```json
/// {
///   "acme": { "productVersion": "2024.1", "initialPage": "index.html" },
///   "suite/module": { "productVersion": "2023.2", "initialPage": "start.html" }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    /// Create a source reading from `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the metadata file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MetadataSource for JsonFileSource {
    fn load(&self) -> Result<HashMap<String, ProductEntry>, RegistryError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| RegistryError::Io {
            path: self.path.clone(),
            source,
        })?;
        let products: HashMap<String, ProductEntry> =
            serde_json::from_str(&content).map_err(|source| RegistryError::Parse {
                path: self.path.clone(),
                source,
            })?;

        for name in products.keys() {
            validate_name(name)?;
        }

        tracing::debug!(path = %self.path.display(), count = products.len(), "Loaded product list");
        Ok(products)
    }
}

/// Reject names that no sequence of URL segments can reach.
fn validate_name(name: &str) -> Result<(), RegistryError> {
    if name.split('/').any(str::is_empty) {
        return Err(RegistryError::InvalidName(name.to_owned()));
    }
    Ok(())
}
