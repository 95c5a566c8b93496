//! Edit/notify orchestration.
//!
//! [`MetaRegistry`] owns the transactional entry point through which external
//! callers and harvesters propose field values. Every committed edit fans a
//! change event out to the registered [`PackageListener`]s, whose follow-up
//! tasks run later on the [`QueuedTaskRunner`](crate::meta::runner::QueuedTaskRunner).
//!
//! There are exactly two mutation paths, kept deliberately distinct:
//! - [`MetaRegistry::edit`] — propose and notify;
//! - [`apply_without_notify`] — the path used by queued tasks, which never
//!   re-enters notification and thereby breaks the harvester-triggers-
//!   harvester feedback loop.

use crate::meta::field::Field;
use crate::meta::package::PackageModifier;
use crate::meta::runner::QueuedTaskRunner;
use crate::meta::store::{lock_unpoisoned, PackageStore};
use crate::meta::MetaError;
use crate::purl::PackageId;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Deferred unit of work produced by a listener.
///
/// Runs later against a fresh [`PackageModifier`] for the same coordinate,
/// outside the transaction that produced it. An `Err` marks the task failed;
/// it is logged and isolated by the runner.
pub type PackageTask =
    Box<dyn FnOnce(&mut PackageModifier<'_>) -> Result<(), MetaError> + Send + 'static>;

/// Capability implemented by harvester adapters.
///
/// Decides, from a committed change event, whether follow-up harvest work is
/// warranted. Must be fast: it runs synchronously inside the notifying
/// transaction. Slow work belongs in the returned task.
pub trait PackageListener: Send + Sync {
    /// Notifies that `updated` fields of `purl` changed; `values` is the full
    /// current snapshot. Returns an optional follow-up task.
    fn on_updated(
        &self,
        purl: &PackageId,
        updated: &BTreeSet<Field>,
        values: &BTreeMap<Field, Value>,
    ) -> Option<PackageTask>;
}

/// Orchestrates get-or-create, edit transactions and change fan-out.
///
/// Listeners are an explicit collection held by the registry; there is no
/// global registration point. The registry never caches packages across
/// transactions — every edit re-fetches, so each transaction observes the
/// latest committed state.
pub struct MetaRegistry {
    store: Arc<dyn PackageStore>,
    runner: Arc<QueuedTaskRunner>,
    listeners: RwLock<Vec<Arc<dyn PackageListener>>>,
}

impl MetaRegistry {
    /// Creates a registry with no listeners.
    pub fn new(store: Arc<dyn PackageStore>, runner: Arc<QueuedTaskRunner>) -> Self {
        Self::with_listeners(store, runner, Vec::new())
    }

    /// Creates a registry with an initial listener collection.
    pub fn with_listeners(
        store: Arc<dyn PackageStore>,
        runner: Arc<QueuedTaskRunner>,
        listeners: Vec<Arc<dyn PackageListener>>,
    ) -> Self {
        Self {
            store,
            runner,
            listeners: RwLock::new(listeners),
        }
    }

    /// Registers an observer for metadata value changes.
    ///
    /// Idempotent for the same listener identity; listeners are notified in
    /// no guaranteed order.
    pub fn add_listener(&self, listener: Arc<dyn PackageListener>) {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            listeners.push(listener);
        }
    }

    /// Runs one edit transaction and notifies listeners of the outcome.
    ///
    /// Fetches or creates the package, opens a [`PackageModifier`], and runs
    /// `mutate` synchronously under the per-package lock. On `Ok` the change
    /// delta and full snapshot are computed, the lock is released, and every
    /// listener is notified; returned follow-up tasks are queued on the
    /// runner keyed by `purl`.
    ///
    /// # Errors
    ///
    /// An `Err` from `mutate` aborts the transaction without notification.
    /// There is no rollback: updates already applied through the modifier
    /// stand, so mutators should be side-effect-free beyond calling
    /// [`PackageModifier::update`].
    pub fn edit<F>(&self, purl: &PackageId, mutate: F) -> Result<(), MetaError>
    where
        F: FnOnce(&mut PackageModifier<'_>) -> Result<(), MetaError>,
    {
        let handle = self.store.get_or_create(purl);
        let (changed, snapshot) = {
            let mut package = lock_unpoisoned(&handle);
            let mut modifier = PackageModifier::new(&mut package);
            mutate(&mut modifier)?;
            let changed = modifier.modified_fields().clone();
            (changed, package.snapshot())
        };

        debug!(%purl, changed = changed.len(), "edit committed");
        self.notify(purl, &changed, &snapshot);
        Ok(())
    }

    /// Notifies every listener, isolating individual failures.
    fn notify(&self, purl: &PackageId, changed: &BTreeSet<Field>, snapshot: &BTreeMap<Field, Value>) {
        let listeners: Vec<_> = self
            .listeners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        for listener in listeners {
            match catch_unwind(AssertUnwindSafe(|| listener.on_updated(purl, changed, snapshot))) {
                Ok(Some(task)) => self.runner.execute(purl.clone(), task),
                Ok(None) => {}
                Err(_) => warn!(%purl, "listener panicked during notification"),
            }
        }
    }
}

/// Applies a mutation to a stored package without notifying listeners.
///
/// This is the mutation path queued tasks run on: the package is re-fetched
/// by coordinate (a package deleted since submission is silently skipped)
/// and the mutation runs on a fresh [`PackageModifier`]. It never triggers
/// listener notification, so work scheduled from here cannot re-enqueue
/// itself transitively.
///
/// # Errors
///
/// Propagates the error of `apply`; already-applied field updates stand.
pub fn apply_without_notify<F>(
    store: &dyn PackageStore,
    purl: &PackageId,
    apply: F,
) -> Result<(), MetaError>
where
    F: FnOnce(&mut PackageModifier<'_>) -> Result<(), MetaError>,
{
    let Some(handle) = store.find(purl) else {
        debug!(%purl, "package no longer stored; skipping deferred mutation");
        return Ok(());
    };
    let mut package = lock_unpoisoned(&handle);
    let mut modifier = PackageModifier::new(&mut package);
    apply(&mut modifier)
}
