//! Name-keyed facade for the presentation boundary.

use crate::meta::field::{Field, Trust};
use crate::meta::registry::MetaRegistry;
use crate::meta::store::{lock_unpoisoned, PackageStore};
use crate::meta::MetaError;
use crate::purl::PackageId;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// High-level entry points used by an HTTP layer or CLI.
///
/// Reads use a strict accessor (an unknown coordinate is an error rather
/// than an implicit creation); writes run one edit transaction at maximal
/// trust, i.e. manual-correction semantics.
pub struct MetaService {
    registry: Arc<MetaRegistry>,
    store: Arc<dyn PackageStore>,
}

impl MetaService {
    pub fn new(registry: Arc<MetaRegistry>, store: Arc<dyn PackageStore>) -> Self {
        Self { registry, store }
    }

    /// Reads all present metadata of a package, keyed by wire field name.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::UnknownPackage`] if the coordinate was never
    /// referenced.
    pub fn get_attributes(&self, purl: &PackageId) -> Result<BTreeMap<String, Value>, MetaError> {
        let handle = self
            .store
            .find(purl)
            .ok_or_else(|| MetaError::UnknownPackage(purl.clone()))?;
        let package = lock_unpoisoned(&handle);
        Ok(package
            .snapshot()
            .into_iter()
            .map(|(field, value)| (field.name().to_string(), value))
            .collect())
    }

    /// Applies manual corrections, creating the package on first reference.
    ///
    /// Every entry is written at [`Trust::MAX`], which freezes the field
    /// against automated writes; a `None` value clears a prior override.
    /// Listeners are notified of the committed changes.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::UnknownField`] for a name outside the closed
    /// field set; the transaction is aborted without notification.
    pub fn set_attributes(
        &self,
        purl: &PackageId,
        values: BTreeMap<String, Option<Value>>,
    ) -> Result<(), MetaError> {
        self.registry.edit(purl, |modifier| {
            for (name, value) in values {
                let field =
                    Field::from_name(&name).ok_or_else(|| MetaError::UnknownField(name.clone()))?;
                modifier.update(field, Trust::MAX, value);
            }
            Ok(())
        })
    }
}
