//! Git-backed versioned content store for HD documentation server.
//!
//! Keeps a local mirror of the upstream docs repository, where each product
//! is a git submodule and each product version is a branch. The working tree
//! of a product always holds its current version; other versions are read
//! straight from git history.
//!
//! # Architecture
//!
//! - [`ContentStore`]: mirror lifecycle, synchronization, historical reads
//! - [`SyncReport`]: per-product outcome of a synchronization pass
//! - [`VcsError`]: lookup misses and git failures
//!
//! Working-tree mutations shell out to the `git` binary. Historical reads
//! go through gix and never touch the working tree.
//!
//! # Example
//!
//! ```ignore
//! use hd_vcs::{ContentStore, StoreConfig};
//!
//! let store = ContentStore::open(StoreConfig {
//!     mirror_root: "docs".into(),
//!     origin: Some("git@example.com:docs.git".to_owned()),
//! })?;
//! let report = store.sync(&registry.snapshot())?;
//! let html = store.fetch_historical("acme", "index.html", "2023.4")?;
//! ```

mod error;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
mod git;
mod history;
mod locks;
mod store;

pub use error::VcsError;
pub use store::{ContentStore, FailedProduct, StoreConfig, SyncReport, SyncedProduct};
