//! Request dispatch: resolution, canonical redirects and content retrieval.
//!
//! Pages at a product's current version are read from the live working tree;
//! pages at any other version come from git history. Lookup misses turn into
//! redirects to a coarser URL, so readers never see a git error.

use std::sync::Arc;

use hd_registry::{ProductRegistry, is_page};
use hd_vcs::{ContentStore, VcsError};

use crate::resolver::{ResolvedDocument, resolve};

/// Where the bytes of a [`Page`] came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageSource {
    /// Live working tree (current version).
    Live,
    /// Git history (any other version).
    History,
}

/// Retrieved page content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    /// Raw file contents.
    pub bytes: Vec<u8>,
    /// MIME type derived from the page extension.
    pub content_type: String,
    /// Version the bytes belong to.
    pub version: String,
    /// Live tree or git history.
    pub source: PageSource,
}

/// Result of [`DocsSite::retrieve`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Retrieval {
    /// Page found.
    Content(Page),
    /// Page missing; redirect to this path.
    Redirect(String),
}

/// Result of [`DocsSite::handle`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    /// Unknown product; carries the requested product name.
    NotFound(String),
    /// Redirect to this path.
    Redirect(String),
    /// Page to serve.
    Page(Page),
}

/// Documentation site over a product registry and a content store.
#[derive(Debug)]
pub struct DocsSite {
    registry: Arc<ProductRegistry>,
    store: Arc<ContentStore>,
}

impl DocsSite {
    /// Create a site.
    #[must_use]
    pub fn new(registry: Arc<ProductRegistry>, store: Arc<ContentStore>) -> Self {
        Self { registry, store }
    }

    /// Shared product registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<ProductRegistry> {
        &self.registry
    }

    /// Answer a request for `/help/<product>/<tokens...>`.
    ///
    /// Requests that don't end in a page are redirected to the canonical URL
    /// of the resolved page. Blocks on filesystem and git reads.
    #[must_use]
    pub fn handle(&self, product: &str, tokens: &[&str]) -> Response {
        let snapshot = self.registry.snapshot();
        let Some(doc) = resolve(&snapshot, product, tokens) else {
            return Response::NotFound(product.to_owned());
        };

        if !tokens.last().is_some_and(|t| is_page(t)) {
            let location = if snapshot.default_version(&doc.product) == Some(doc.version.as_str())
            {
                format!("/help/{}/{}", doc.product, doc.page)
            } else {
                format!("/help/{}/{}/{}", doc.product, doc.version, doc.page)
            };
            return Response::Redirect(location);
        }

        match self.retrieve(&doc) {
            Retrieval::Content(page) => Response::Page(page),
            Retrieval::Redirect(location) => Response::Redirect(location),
        }
    }

    /// Fetch the content of a resolved document.
    ///
    /// Blocks on filesystem and git reads.
    #[must_use]
    pub fn retrieve(&self, doc: &ResolvedDocument) -> Retrieval {
        let product_root = format!("/help/{}", doc.product);
        let is_current =
            self.registry.default_version(&doc.product).as_deref() == Some(doc.version.as_str());

        if is_current {
            if !is_safe_page_path(&doc.page) {
                return Retrieval::Redirect(product_root);
            }
            return match std::fs::read(self.store.live_path(&doc.product, &doc.page)) {
                Ok(bytes) => Retrieval::Content(page(doc, bytes, PageSource::Live)),
                Err(e) => {
                    tracing::debug!(
                        product = %doc.product,
                        page = %doc.page,
                        error = %e,
                        "Live page not readable"
                    );
                    Retrieval::Redirect(product_root)
                }
            };
        }

        let version_root = format!("{product_root}/{}", doc.version);
        if !is_safe_page_path(&doc.page) {
            return Retrieval::Redirect(version_root);
        }
        match self
            .store
            .fetch_historical(&doc.product, &doc.page, &doc.version)
        {
            Ok(bytes) => {
                tracing::debug!(
                    product = %doc.product,
                    version = %doc.version,
                    page = %doc.page,
                    "Serving page from history"
                );
                Retrieval::Content(page(doc, bytes, PageSource::History))
            }
            Err(VcsError::InvalidPage { .. }) => Retrieval::Redirect(version_root),
            Err(e) if e.is_lookup_miss() => Retrieval::Redirect(product_root),
            Err(e) => {
                tracing::warn!(
                    product = %doc.product,
                    version = %doc.version,
                    page = %doc.page,
                    error = %e,
                    "Historical read failed"
                );
                Retrieval::Redirect(product_root)
            }
        }
    }
}

fn page(doc: &ResolvedDocument, bytes: Vec<u8>, source: PageSource) -> Page {
    Page {
        bytes,
        content_type: content_type(&doc.page),
        version: doc.version.clone(),
        source,
    }
}

/// Reject absolute paths and empty, `.` or `..` segments.
fn is_safe_page_path(page: &str) -> bool {
    !page.starts_with('/')
        && page
            .split('/')
            .all(|segment| !matches!(segment, "" | "." | ".."))
}

/// MIME type for a page path, by extension.
///
/// Text types carry an explicit UTF-8 charset.
#[must_use]
pub fn content_type(page: &str) -> String {
    let mime = mime_guess::from_path(page).first_or_octet_stream();
    if mime.type_() == mime_guess::mime::TEXT {
        format!("{mime}; charset=utf-8")
    } else {
        mime.to_string()
    }
}
