//! Per-product mutual exclusion.
//!
//! Each product's sub-repository working tree is guarded by its own mutex.
//! Locks are created lazily on first use and kept for the lifetime of the
//! store, so two callers asking for the same product always share one lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

/// Lazily populated map of product name to lock.
#[derive(Debug, Default)]
pub(crate) struct ProductLocks {
    locks: RwLock<HashMap<String, Arc<Mutex<()>>>>,
}

impl ProductLocks {
    /// Lock handle for `product`, created on first request.
    ///
    /// Uses double-checked insertion: the common case only takes the read
    /// lock; creation re-checks under the write lock so concurrent first
    /// requests end up with the same `Arc`.
    pub(crate) fn get(&self, product: &str) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.read().unwrap().get(product) {
            return Arc::clone(lock);
        }

        let mut locks = self.locks.write().unwrap();
        Arc::clone(locks.entry(product.to_owned()).or_default())
    }

    /// Number of locks created so far.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks.read().unwrap().len()
    }
}

/// Acquire `lock`, recovering from poisoning.
///
/// The guarded data is `()`; a panic while the lock was held can leave the
/// working tree mid-checkout, which the next sync pass repairs.
pub(crate) fn acquire(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
    lock.lock().unwrap_or_else(PoisonError::into_inner)
}
