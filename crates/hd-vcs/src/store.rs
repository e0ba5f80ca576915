//! Versioned content store over a mirror of the docs repository.
//!
//! # Layout
//!
//! ```text
//! <mirror_root>/              parent clone of the upstream docs repository
//! ├── products.json           product metadata (read by the registry)
//! ├── acme/                   submodule, working tree = current version
//! └── suite/module/           nested product, also a submodule
//! ```
//!
//! # Synchronization
//!
//! One pass per call to [`ContentStore::sync`] or [`ContentStore::sync_with`]:
//!
//! 1. Under the parent lock: clone the mirror if absent, fast-forward the
//!    parent, re-read `.gitmodules`.
//! 2. Take the product list. `sync_with` builds it here, after the pull.
//! 3. Per submodule, under that product's lock: initialize if new, fetch,
//!    check out the registry's default version and move it to its remote
//!    tip, then point every other version branch at its remote tip without
//!    touching the working tree.
//!
//! A failing product is reported and skipped; the others still sync.
//!
//! # Thread Safety
//!
//! Historical reads and syncs of the same product are serialized by a
//! per-product mutex, so a reader observes a product either fully before or
//! fully after a sync. Different products never block each other. The live
//! working tree is read without the lock; it only ever holds the pinned
//! version.

use std::collections::BTreeMap;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use hd_registry::{Products, version_suffix};

use crate::error::VcsError;
use crate::git::{self, SubmoduleEntry};
use crate::history;
use crate::locks::{ProductLocks, acquire};

/// Configuration for [`ContentStore`].
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Local mirror directory.
    pub mirror_root: PathBuf,
    /// Upstream clone URL. `None` runs in static mirror mode: no clone and
    /// sync is a no-op.
    pub origin: Option<String>,
}

/// Outcome of one product within a sync pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncedProduct {
    /// Product (submodule) name.
    pub product: String,
    /// Versions found on the remote.
    pub versions: Vec<String>,
    /// Version checked out in the working tree, `None` if the product is
    /// not in the registry.
    pub pinned: Option<String>,
}

/// Product whose sync failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailedProduct {
    /// Product (submodule) name.
    pub product: String,
    /// Error description.
    pub error: String,
}

/// Result of [`ContentStore::sync`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Products synchronized successfully.
    pub synced: Vec<SyncedProduct>,
    /// Products whose pass failed.
    pub failed: Vec<FailedProduct>,
}

impl SyncReport {
    /// True if every product synced.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Git-backed store serving historical versions of product pages.
#[derive(Debug)]
pub struct ContentStore {
    config: StoreConfig,
    /// Serializes the parent clone/pull step.
    parent_lock: Mutex<()>,
    locks: ProductLocks,
    /// Submodule name to working tree path (relative to the mirror root).
    submodules: RwLock<BTreeMap<String, PathBuf>>,
}

impl ContentStore {
    /// Open the mirror, cloning it first if needed.
    ///
    /// With an origin configured and no repository at the mirror root, the
    /// origin is cloned recursively. Without an origin the mirror is used as
    /// found on disk.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError`] if the clone fails or `.gitmodules` can't be read.
    pub fn open(config: StoreConfig) -> Result<Self, VcsError> {
        let store = Self {
            config,
            parent_lock: Mutex::new(()),
            locks: ProductLocks::default(),
            submodules: RwLock::new(BTreeMap::new()),
        };

        store.ensure_mirror()?;
        if git::is_repository(store.mirror_root()) {
            store.refresh_submodules()?;
        } else {
            tracing::warn!(
                mirror = %store.mirror_root().display(),
                "Mirror is not a git repository, historical versions are unavailable"
            );
        }

        Ok(store)
    }

    /// Local mirror directory.
    #[must_use]
    pub fn mirror_root(&self) -> &Path {
        &self.config.mirror_root
    }

    /// Upstream origin, `None` in static mirror mode.
    #[must_use]
    pub fn origin(&self) -> Option<&str> {
        self.config.origin.as_deref()
    }

    /// Path of `page` in the live working tree of `product`.
    ///
    /// The live tree always holds the product's default version.
    #[must_use]
    pub fn live_path(&self, product: &str, page: &str) -> PathBuf {
        self.mirror_root().join(product).join(page)
    }

    /// Names of mirrored products (submodules), sorted.
    #[cfg(test)]
    pub(crate) fn products(&self) -> Vec<String> {
        self.submodules.read().unwrap().keys().cloned().collect()
    }

    /// Read `page` of `product` as of `version` from git history.
    ///
    /// Takes the product lock for the duration of the tree walk and blob
    /// read, so it never observes a half-finished sync of the same product.
    ///
    /// # Errors
    ///
    /// - [`VcsError::ProductNotMirrored`] if no submodule exists for `product`
    /// - [`VcsError::InvalidVersion`] if `refs/heads/<version>` is missing
    /// - [`VcsError::InvalidPage`] if the version has no file at `page`
    pub fn fetch_historical(
        &self,
        product: &str,
        page: &str,
        version: &str,
    ) -> Result<Vec<u8>, VcsError> {
        let relative = self
            .submodules
            .read()
            .unwrap()
            .get(product)
            .cloned()
            .ok_or_else(|| VcsError::ProductNotMirrored(product.to_owned()))?;
        let dir = self.mirror_root().join(relative);

        let lock = self.locks.get(product);
        let _guard = acquire(&lock);
        history::read_blob(&dir, product, version, page)
    }

    /// Run one synchronization pass against the upstream origin.
    ///
    /// `products` supplies the version each product is pinned to.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError`] only if the parent step (clone, pull, submodule
    /// listing) fails. Per-product failures are collected in the report.
    pub fn sync(&self, products: &Products) -> Result<SyncReport, VcsError> {
        self.sync_with(|| products)
    }

    /// Like [`sync`](Self::sync), with the product list taken after the
    /// parent step.
    ///
    /// `products` is called exactly once: after the parent repository has
    /// been pulled (so metadata committed upstream is on disk), or right away
    /// in static mirror mode. It is not called if the parent step fails.
    ///
    /// # Errors
    ///
    /// Same as [`sync`](Self::sync).
    pub fn sync_with<P, F>(&self, products: F) -> Result<SyncReport, VcsError>
    where
        P: Deref<Target = Products>,
        F: FnOnce() -> P,
    {
        let Some(origin) = self.origin() else {
            tracing::debug!("No origin configured, skipping sync");
            drop(products());
            return Ok(SyncReport::default());
        };

        let submodules = {
            let _parent = acquire(&self.parent_lock);
            if !self.ensure_mirror()? {
                git::git(self.mirror_root(), &["pull", "--ff-only", "--quiet"])?;
            }
            self.refresh_submodules()?
        };
        let products = products();
        tracing::debug!(origin, count = submodules.len(), "Synchronizing products");

        let mut report = SyncReport::default();
        for submodule in &submodules {
            match self.sync_product(submodule, &products) {
                Ok(synced) => {
                    tracing::info!(
                        product = %synced.product,
                        pinned = ?synced.pinned,
                        versions = synced.versions.len(),
                        "Product synchronized"
                    );
                    report.synced.push(synced);
                }
                Err(e) => {
                    tracing::warn!(product = %submodule.name, error = %e, "Product sync failed");
                    report.failed.push(FailedProduct {
                        product: submodule.name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }

    /// Clone the mirror if it is absent and an origin is configured.
    ///
    /// Returns `true` if a clone was made.
    fn ensure_mirror(&self) -> Result<bool, VcsError> {
        let root = self.mirror_root();
        let Some(origin) = self.origin() else {
            return Ok(false);
        };
        if git::is_repository(root) {
            return Ok(false);
        }

        tracing::info!(origin, mirror = %root.display(), "Cloning documentation mirror");
        git::clone_recursive(origin, root)?;
        Ok(true)
    }

    /// Re-read `.gitmodules` and publish the submodule map.
    fn refresh_submodules(&self) -> Result<Vec<SubmoduleEntry>, VcsError> {
        let entries = git::submodules(self.mirror_root())?;
        let map = entries
            .iter()
            .map(|e| (e.name.clone(), PathBuf::from(&e.path)))
            .collect();
        *self.submodules.write().unwrap() = map;
        Ok(entries)
    }

    /// Fetch one product, pin its default version and move the other branches.
    fn sync_product(
        &self,
        submodule: &SubmoduleEntry,
        products: &Products,
    ) -> Result<SyncedProduct, VcsError> {
        let lock = self.locks.get(&submodule.name);
        let _guard = acquire(&lock);

        let dir = self.mirror_root().join(&submodule.path);
        if !git::is_repository(&dir) {
            tracing::info!(product = %submodule.name, "Initializing new product submodule");
            git::git(
                self.mirror_root(),
                &["submodule", "update", "--init", "--", submodule.path.as_str()],
            )?;
        }

        git::git(&dir, &["fetch", "--prune", "--quiet", "origin"])?;

        let remotes: Vec<(String, String)> = git::remote_branches(&dir)?
            .into_iter()
            .filter_map(|remote| {
                let version = version_suffix(&remote)?.to_owned();
                Some((version, remote))
            })
            .collect();

        let pinned = products.default_version(&submodule.name).map(str::to_owned);
        if let Some(version) = pinned.as_deref() {
            let remote = remotes
                .iter()
                .find(|(v, _)| v == version)
                .map(|(_, r)| r.as_str());
            pin_branch(&dir, version, remote)?;
        }

        let current = git::current_branch(&dir)?;
        for (version, remote) in &remotes {
            if pinned.as_deref() == Some(version.as_str()) {
                continue;
            }
            if current.as_deref() == Some(version.as_str()) {
                // Unpinned product left on a version branch
                git::git(&dir, &["reset", "--hard", "--quiet", remote])?;
            } else {
                move_branch(&dir, version, remote)?;
            }
        }

        Ok(SyncedProduct {
            product: submodule.name.clone(),
            versions: remotes.into_iter().map(|(version, _)| version).collect(),
            pinned,
        })
    }
}

/// Check out `version` in the live working tree and move it to `remote`.
///
/// The only step of a sync that touches the working tree. A version with no
/// remote branch is checked out as it is locally.
fn pin_branch(dir: &Path, version: &str, remote: Option<&str>) -> Result<(), VcsError> {
    if let Some(remote) = remote
        && !git::local_branch_exists(dir, version)?
    {
        git::git(dir, &["branch", "--quiet", "--track", version, remote])?;
    }
    if git::current_branch(dir)?.as_deref() != Some(version) {
        git::git(dir, &["checkout", "--quiet", version, "--"])?;
    }
    if let Some(remote) = remote {
        git::git(dir, &["reset", "--hard", "--quiet", remote])?;
    }
    Ok(())
}

/// Point local branch `version` at `remote` without touching the working tree.
///
/// Must not be called for the checked-out branch.
fn move_branch(dir: &Path, version: &str, remote: &str) -> Result<(), VcsError> {
    if git::local_branch_exists(dir, version)? {
        git::git(dir, &["branch", "--quiet", "--force", version, remote])?;
    } else {
        tracing::debug!(version, remote, "Creating tracking branch");
        git::git(dir, &["branch", "--quiet", "--track", version, remote])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hd_registry::ProductEntry;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::fixtures::Upstream;

    static_assertions::assert_impl_all!(super::ContentStore: Send, Sync);

    fn products(entries: &[(&str, &str)]) -> Products {
        entries
            .iter()
            .map(|(name, version)| ((*name).to_owned(), ProductEntry::new(*version, "index.html")))
            .collect()
    }

    /// Upstream with `acme` at versions 2023.4 and 2024.1.
    fn acme_upstream() -> Upstream {
        let upstream = Upstream::new();
        upstream.add_product(
            "acme",
            &[
                (
                    "2023.4",
                    &[("index.html", "acme 2023.4"), ("guide.html", "guide 2023.4")],
                ),
                (
                    "2024.1",
                    &[("index.html", "acme 2024.1"), ("guide.html", "guide 2024.1")],
                ),
            ],
        );
        upstream
    }

    fn open_mirror(upstream: &Upstream) -> ContentStore {
        ContentStore::open(StoreConfig {
            mirror_root: upstream.mirror_path(),
            origin: Some(upstream.origin()),
        })
        .unwrap()
    }

    fn read_live(store: &ContentStore, product: &str, page: &str) -> String {
        std::fs::read_to_string(store.live_path(product, page)).unwrap()
    }

    #[test]
    fn test_open_clones_mirror() {
        let upstream = acme_upstream();

        let store = open_mirror(&upstream);

        assert!(store.mirror_root().join(".git").exists());
        assert_eq!(store.products(), vec!["acme".to_owned()]);
        assert!(store.live_path("acme", "index.html").exists());
    }

    #[test]
    fn test_sync_pins_default_version() {
        let upstream = acme_upstream();
        let store = open_mirror(&upstream);

        let report = store.sync(&products(&[("acme", "2024.1")])).unwrap();

        assert!(report.is_success());
        assert_eq!(report.synced.len(), 1);
        assert_eq!(report.synced[0].pinned.as_deref(), Some("2024.1"));
        let mut versions = report.synced[0].versions.clone();
        versions.sort();
        assert_eq!(versions, vec!["2023.4".to_owned(), "2024.1".to_owned()]);
        assert_eq!(read_live(&store, "acme", "guide.html"), "guide 2024.1");
    }

    #[test]
    fn test_fetch_historical_reads_other_version() {
        let upstream = acme_upstream();
        let store = open_mirror(&upstream);
        store.sync(&products(&[("acme", "2024.1")])).unwrap();

        let bytes = store.fetch_historical("acme", "guide.html", "2023.4").unwrap();

        assert_eq!(bytes, b"guide 2023.4");
        // The live tree stays on the default version
        assert_eq!(read_live(&store, "acme", "guide.html"), "guide 2024.1");
    }

    #[test]
    fn test_fetch_unknown_version() {
        let upstream = acme_upstream();
        let store = open_mirror(&upstream);
        store.sync(&products(&[("acme", "2024.1")])).unwrap();

        let err = store
            .fetch_historical("acme", "index.html", "1999.1")
            .unwrap_err();

        assert!(
            matches!(err, VcsError::InvalidVersion { ref version, .. } if version == "1999.1"),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn test_fetch_missing_page() {
        let upstream = Upstream::new();
        upstream.add_product(
            "acme",
            &[
                ("2023.4", &[("index.html", "old"), ("api/ref.html", "ref")]),
                ("2024.1", &[("index.html", "new")]),
            ],
        );
        let store = open_mirror(&upstream);
        store.sync(&products(&[("acme", "2024.1")])).unwrap();

        let missing = store
            .fetch_historical("acme", "missing.html", "2023.4")
            .unwrap_err();
        let directory = store.fetch_historical("acme", "api", "2023.4").unwrap_err();
        let nested = store.fetch_historical("acme", "api/ref.html", "2023.4").unwrap();

        assert!(matches!(missing, VcsError::InvalidPage { .. }));
        assert!(matches!(directory, VcsError::InvalidPage { .. }));
        assert_eq!(nested, b"ref");
    }

    #[test]
    fn test_fetch_unknown_product() {
        let upstream = acme_upstream();
        let store = open_mirror(&upstream);

        let err = store
            .fetch_historical("unknown", "index.html", "2023.4")
            .unwrap_err();

        assert!(matches!(err, VcsError::ProductNotMirrored(ref p) if p == "unknown"));
    }

    #[test]
    fn test_sync_is_idempotent() {
        let upstream = acme_upstream();
        let store = open_mirror(&upstream);
        let registry = products(&[("acme", "2024.1")]);

        let first = store.sync(&registry).unwrap();
        let before = store.fetch_historical("acme", "guide.html", "2023.4").unwrap();
        let second = store.sync(&registry).unwrap();
        let after = store.fetch_historical("acme", "guide.html", "2023.4").unwrap();

        assert_eq!(first.synced[0].pinned, second.synced[0].pinned);
        assert_eq!(before, after);
        let dir = store.mirror_root().join("acme");
        assert_eq!(
            git::current_branch(&dir).unwrap().as_deref(),
            Some("2024.1")
        );
    }

    #[test]
    fn test_sync_picks_up_upstream_commits() {
        let upstream = acme_upstream();
        let store = open_mirror(&upstream);
        let registry = products(&[("acme", "2024.1")]);
        store.sync(&registry).unwrap();

        upstream.commit_to_version("acme", "2023.4", &[("guide.html", "guide 2023.4 fixed")]);
        upstream.commit_to_version("acme", "2024.1", &[("guide.html", "guide 2024.1 fixed")]);
        store.sync(&registry).unwrap();

        assert_eq!(
            store.fetch_historical("acme", "guide.html", "2023.4").unwrap(),
            b"guide 2023.4 fixed"
        );
        assert_eq!(read_live(&store, "acme", "guide.html"), "guide 2024.1 fixed");
    }

    #[test]
    fn test_sync_follows_registry_default_version() {
        let upstream = acme_upstream();
        let store = open_mirror(&upstream);
        store.sync(&products(&[("acme", "2024.1")])).unwrap();

        store.sync(&products(&[("acme", "2023.4")])).unwrap();

        assert_eq!(read_live(&store, "acme", "index.html"), "acme 2023.4");
    }

    #[test]
    fn test_product_missing_from_registry_is_not_pinned() {
        let upstream = acme_upstream();
        let store = open_mirror(&upstream);

        let report = store.sync(&Products::default()).unwrap();

        assert!(report.is_success());
        assert_eq!(report.synced[0].pinned, None);
        // Branches are still reconciled, so history is readable
        assert_eq!(
            store.fetch_historical("acme", "index.html", "2024.1").unwrap(),
            b"acme 2024.1"
        );
    }

    #[test]
    fn test_failed_product_does_not_block_others() {
        let upstream = acme_upstream();
        upstream.add_product("beta", &[("2024.1", &[("index.html", "beta 2024.1")])]);
        let store = open_mirror(&upstream);

        let report = store
            .sync(&products(&[("acme", "2030.1"), ("beta", "2024.1")]))
            .unwrap();

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].product, "acme");
        assert_eq!(report.synced.len(), 1);
        assert_eq!(report.synced[0].product, "beta");
        assert_eq!(read_live(&store, "beta", "index.html"), "beta 2024.1");
    }

    #[test]
    fn test_new_upstream_product_initialized_on_sync() {
        let upstream = acme_upstream();
        let store = open_mirror(&upstream);

        upstream.add_product(
            "suite/module",
            &[("2024.1", &[("index.html", "module 2024.1")])],
        );
        let report = store
            .sync(&products(&[("acme", "2024.1"), ("suite/module", "2024.1")]))
            .unwrap();

        assert!(report.is_success(), "report: {report:?}");
        assert_eq!(
            store.products(),
            vec!["acme".to_owned(), "suite/module".to_owned()]
        );
        assert_eq!(read_live(&store, "suite/module", "index.html"), "module 2024.1");
    }

    #[test]
    fn test_reads_during_sync_see_whole_versions() {
        let upstream = acme_upstream();
        let store = Arc::new(open_mirror(&upstream));
        let registry = products(&[("acme", "2024.1")]);
        store.sync(&registry).unwrap();
        upstream.commit_to_version("acme", "2023.4", &[("guide.html", "guide 2023.4 fixed")]);

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    (0..20)
                        .map(|_| store.fetch_historical("acme", "guide.html", "2023.4").unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        store.sync(&registry).unwrap();

        for reader in readers {
            for bytes in reader.join().unwrap() {
                assert!(
                    bytes == b"guide 2023.4" || bytes == b"guide 2023.4 fixed",
                    "torn read: {}",
                    String::from_utf8_lossy(&bytes)
                );
            }
        }
    }

    #[test]
    fn test_live_tree_stays_on_default_version_during_sync() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let upstream = acme_upstream();
        let store = Arc::new(open_mirror(&upstream));
        let registry = products(&[("acme", "2024.1")]);
        store.sync(&registry).unwrap();

        let stop = Arc::new(AtomicBool::new(false));
        let reader = {
            let store = Arc::clone(&store);
            let stop = Arc::clone(&stop);
            std::thread::spawn(move || {
                let path = store.live_path("acme", "guide.html");
                let mut wrong = Vec::new();
                while !stop.load(Ordering::Relaxed) {
                    match std::fs::read_to_string(&path) {
                        Ok(contents) if contents == "guide 2024.1" => {}
                        other => wrong.push(format!("{other:?}")),
                    }
                }
                wrong
            })
        };
        for _ in 0..5 {
            assert!(store.sync(&registry).unwrap().is_success());
        }
        stop.store(true, Ordering::Relaxed);

        assert_eq!(reader.join().unwrap(), Vec::<String>::new());
        // Other versions stay readable from history
        assert_eq!(
            store.fetch_historical("acme", "guide.html", "2023.4").unwrap(),
            b"guide 2023.4"
        );
    }

    #[test]
    fn test_switching_default_version_updates_previous_branch() {
        let upstream = acme_upstream();
        let store = open_mirror(&upstream);
        store.sync(&products(&[("acme", "2024.1")])).unwrap();

        upstream.commit_to_version("acme", "2024.1", &[("guide.html", "guide 2024.1 fixed")]);
        store.sync(&products(&[("acme", "2023.4")])).unwrap();

        assert_eq!(read_live(&store, "acme", "guide.html"), "guide 2023.4");
        assert_eq!(
            store.fetch_historical("acme", "guide.html", "2024.1").unwrap(),
            b"guide 2024.1 fixed"
        );
    }

    #[test]
    fn test_sync_with_reads_products_after_pull() {
        let upstream = acme_upstream();
        let store = open_mirror(&upstream);
        upstream.write_metadata("pinned.txt", "2023.4");

        let mut calls = 0;
        let report = store
            .sync_with(|| {
                calls += 1;
                let pinned =
                    std::fs::read_to_string(store.mirror_root().join("pinned.txt")).unwrap();
                Box::new(products(&[("acme", pinned.as_str())]))
            })
            .unwrap();

        assert_eq!(calls, 1);
        assert_eq!(report.synced[0].pinned.as_deref(), Some("2023.4"));
        assert_eq!(read_live(&store, "acme", "index.html"), "acme 2023.4");
    }

    #[test]
    fn test_static_mode_sync_is_noop() {
        let temp = tempfile::tempdir().unwrap();
        let store = ContentStore::open(StoreConfig {
            mirror_root: temp.path().to_path_buf(),
            origin: None,
        })
        .unwrap();

        let report = store.sync(&products(&[("acme", "2024.1")])).unwrap();

        assert_eq!(report, SyncReport::default());
        assert!(store.products().is_empty());

        let mut calls = 0;
        store
            .sync_with(|| {
                calls += 1;
                Box::new(Products::default())
            })
            .unwrap();
        assert_eq!(calls, 1);
        assert!(matches!(
            store.fetch_historical("acme", "index.html", "2023.4"),
            Err(VcsError::ProductNotMirrored(_))
        ));
    }

    #[test]
    fn test_live_path() {
        let store = ContentStore::open(StoreConfig {
            mirror_root: PathBuf::from("/nonexistent/mirror"),
            origin: None,
        })
        .unwrap();

        assert_eq!(
            store.live_path("suite/module", "api/index.html"),
            PathBuf::from("/nonexistent/mirror/suite/module/api/index.html")
        );
    }
}
