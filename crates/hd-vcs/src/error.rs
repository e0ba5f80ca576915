//! Content store error types.

use std::path::{Path, PathBuf};

/// Error returned by [`ContentStore`](crate::ContentStore) operations.
#[derive(Debug, thiserror::Error)]
pub enum VcsError {
    /// No `refs/heads/<version>` branch exists for the product.
    #[error("Version {version} does not exist for {product}")]
    InvalidVersion {
        /// Product name.
        product: String,
        /// Requested version.
        version: String,
    },
    /// The version exists but its tree has no file at `page`.
    #[error("Page {page} does not exist for {product} at version {version}")]
    InvalidPage {
        /// Product name.
        product: String,
        /// Requested version.
        version: String,
        /// Requested page path.
        page: String,
    },
    /// The mirror has no sub-repository for the product.
    #[error("Product {0} is not mirrored")]
    ProductNotMirrored(String),
    /// A `git` command exited unsuccessfully or could not be started.
    #[error("git {command} failed: {message}")]
    Git {
        /// Arguments passed to `git`.
        command: String,
        /// Captured stderr or spawn error.
        message: String,
    },
    /// The object database could not be read.
    #[error("Repository error in {}: {source}", .path.display())]
    Repository {
        /// Repository working directory.
        path: PathBuf,
        /// Underlying gix error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VcsError {
    /// True for lookup misses that callers answer with a redirect.
    #[must_use]
    pub fn is_lookup_miss(&self) -> bool {
        matches!(
            self,
            Self::InvalidVersion { .. } | Self::InvalidPage { .. } | Self::ProductNotMirrored(_)
        )
    }

    /// Wrap a gix error with the repository it came from.
    pub(crate) fn repository<E>(path: &Path) -> impl FnOnce(E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let path = path.to_path_buf();
        move |source| Self::Repository {
            path,
            source: Box::new(source),
        }
    }
}
