//! Storage boundary for package aggregates.
//!
//! The store is the single shared mutable resource of the engine. Handles are
//! `Arc<Mutex<Package>>`, which doubles as the per-package lock: concurrent
//! edits of the same coordinate serialize on it, so no update is lost.
//! Persistence technology stays behind this trait.

use crate::meta::package::Package;
use crate::purl::PackageId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Shared handle to one stored package.
pub type PackageHandle = Arc<Mutex<Package>>;

/// Abstraction over the package store.
pub trait PackageStore: Send + Sync {
    /// Looks a package up by coordinate.
    fn find(&self, purl: &PackageId) -> Option<PackageHandle>;

    /// Looks a package up, creating an empty one on first reference.
    fn get_or_create(&self, purl: &PackageId) -> PackageHandle;
}

/// In-memory store backed by a hash map.
#[derive(Default)]
pub struct InMemoryStore {
    packages: Mutex<HashMap<PackageId, PackageHandle>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes a package. Queued tasks targeting it are silently skipped.
    pub fn remove(&self, purl: &PackageId) -> bool {
        lock_unpoisoned(&self.packages).remove(purl).is_some()
    }

    /// Number of stored packages.
    pub fn len(&self) -> usize {
        lock_unpoisoned(&self.packages).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PackageStore for InMemoryStore {
    fn find(&self, purl: &PackageId) -> Option<PackageHandle> {
        lock_unpoisoned(&self.packages).get(purl).cloned()
    }

    fn get_or_create(&self, purl: &PackageId) -> PackageHandle {
        lock_unpoisoned(&self.packages)
            .entry(purl.clone())
            .or_insert_with(|| Arc::new(Mutex::new(Package::new(purl.clone()))))
            .clone()
    }
}

/// Locks a mutex, recovering the data from a poisoned lock. Package state is
/// kept consistent by the state machine itself, not by panic-freedom of
/// writers.
pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn purl() -> PackageId {
        PackageId::parse("pkg:deb/curl@7.88.1").unwrap()
    }

    #[test]
    fn creates_on_first_reference() {
        let store = InMemoryStore::new();
        assert!(store.find(&purl()).is_none());

        let handle = store.get_or_create(&purl());
        assert_eq!(lock_unpoisoned(&handle).purl(), &purl());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn returns_the_same_handle_for_the_same_coordinate() {
        let store = InMemoryStore::new();
        let first = store.get_or_create(&purl());
        let second = store.get_or_create(&purl());
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn removal_makes_the_package_unfindable() {
        let store = InMemoryStore::new();
        store.get_or_create(&purl());

        assert!(store.remove(&purl()));
        assert!(store.find(&purl()).is_none());
        assert!(!store.remove(&purl()));
    }
}
