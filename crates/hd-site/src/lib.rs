//! URL resolution, dispatch and background sync for HD documentation server.
//!
//! # Architecture
//!
//! - [`resolve`]: maps `/help/<product>/<tokens...>` to a
//!   `(product, version, page)` triple using the product registry only
//! - [`DocsSite`]: answers requests, choosing between the live working tree
//!   and git history, and turning lookup misses into redirects
//! - [`Synchronizer`]: periodic registry reload and content store sync
//!
//! # Example
//!
//! ```ignore
//! use hd_site::{DocsSite, Response};
//!
//! let site = DocsSite::new(registry, store);
//! match site.handle("acme", &["2023.4", "guide.html"]) {
//!     Response::Page(page) => serve(page.bytes),
//!     Response::Redirect(location) => redirect(location),
//!     Response::NotFound(product) => not_found(product),
//! }
//! ```

mod dispatch;
mod resolver;
mod sync;

pub use dispatch::{DocsSite, Page, PageSource, Response, Retrieval, content_type};
pub use resolver::{MAX_NESTING_DEPTH, ResolvedDocument, resolve};
pub use sync::Synchronizer;
