//! Product registry for HD documentation server.
//!
//! Keeps the mapping of product name to current version and landing page.
//! The mapping is loaded from a [`MetadataSource`] and replaced wholesale on
//! every reload.
//!
//! # Architecture
//!
//! The crate provides:
//! - [`ProductRegistry`]: shared, atomically swapped registry
//! - [`Products`]: immutable snapshot used for consistent lookups
//! - [`JsonFileSource`]: loads the product list from a JSON file
//! - [`is_version`] / [`is_page`]: lexical shapes of URL tokens
//! - [`MockSource`] for testing (behind `mock` feature flag)
//!
//! # Example
//!
//! ```ignore
//! use hd_registry::{JsonFileSource, ProductRegistry};
//!
//! let source = JsonFileSource::new("docs/products.json");
//! let registry = ProductRegistry::load(&source)?;
//! assert!(registry.exists("acme"));
//! ```

#[cfg(feature = "mock")]
mod mock;
mod product;
mod registry;
mod source;
mod version;

#[cfg(feature = "mock")]
pub use mock::MockSource;
pub use product::{ProductEntry, Products};
pub use registry::ProductRegistry;
pub use source::{JsonFileSource, MetadataSource, RegistryError};
pub use version::{is_page, is_version, version_suffix};
