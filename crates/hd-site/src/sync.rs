//! Periodic background synchronization.
//!
//! Each pass pulls the parent repository, reloads the product registry from
//! the freshly pulled metadata, then pins every product to the version the
//! new registry names. Passes never overlap and never stop the loop:
//! failures, including panics, are logged and retried on the next tick.

use std::sync::Arc;
use std::time::Duration;

use hd_registry::{MetadataSource, ProductRegistry};
use hd_vcs::{ContentStore, SyncReport, VcsError};
use tokio::task::JoinHandle;

/// Drives registry reloads and store syncs on a fixed interval.
pub struct Synchronizer {
    registry: Arc<ProductRegistry>,
    source: Arc<dyn MetadataSource>,
    store: Arc<ContentStore>,
    interval: Duration,
}

impl Synchronizer {
    /// Create a synchronizer.
    #[must_use]
    pub fn new(
        registry: Arc<ProductRegistry>,
        source: Arc<dyn MetadataSource>,
        store: Arc<ContentStore>,
        interval: Duration,
    ) -> Self {
        Self {
            registry,
            source,
            store,
            interval,
        }
    }

    /// Run one pass on the current thread.
    ///
    /// The registry is reloaded between the parent pull and product pinning,
    /// so metadata committed upstream takes effect in the same pass. A reload
    /// failure is logged and the pass continues with the previous registry.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError`] if the store's parent step fails.
    pub fn run_pass(&self) -> Result<SyncReport, VcsError> {
        self.store.sync_with(|| {
            match self.registry.reload(self.source.as_ref()) {
                Ok(count) => tracing::debug!(count, "Product registry reloaded"),
                Err(e) => {
                    tracing::warn!(error = %e, "Product registry reload failed, keeping previous");
                }
            }
            self.registry.snapshot()
        })
    }

    /// Start the background loop on the tokio runtime.
    ///
    /// The first pass starts immediately. Each pass runs on the blocking
    /// pool. The returned handle never completes on its own; abort it to
    /// stop the loop.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let this = Arc::clone(&self);
                match tokio::task::spawn_blocking(move || this.run_pass()).await {
                    Ok(Ok(report)) => tracing::info!(
                        synced = report.synced.len(),
                        failed = report.failed.len(),
                        "Synchronization pass finished"
                    ),
                    Ok(Err(e)) => tracing::warn!(error = %e, "Synchronization pass failed"),
                    Err(e) => tracing::error!(error = %e, "Synchronization pass panicked"),
                }
                tokio::time::sleep(self.interval).await;
            }
        })
    }
}
