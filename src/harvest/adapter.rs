//! Bridges a [`MetadataProvider`] into the registry's listener contract.

use crate::harvest::traits::MetadataProvider;
use crate::meta::field::Field;
use crate::meta::registry::{PackageListener, PackageTask};
use crate::purl::PackageId;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Listener that dispatches harvest work for one provider.
///
/// Fires when the provider supports the package type and either the package
/// is brand-new (empty snapshot — harvesting bootstraps from the first
/// reference) or one of the configured trigger fields just changed (e.g.
/// "source location appeared, scan licenses now"). The produced task fetches
/// upstream metadata and applies every reported field at the provider's
/// trust rank through the no-notify path, so one harvest never transitively
/// schedules another.
pub struct HarvesterAdapter {
    provider: Arc<dyn MetadataProvider>,
    trigger_fields: BTreeSet<Field>,
}

impl HarvesterAdapter {
    /// Wraps a provider that harvests new packages only.
    pub fn new(provider: Arc<dyn MetadataProvider>) -> Self {
        Self {
            provider,
            trigger_fields: BTreeSet::new(),
        }
    }

    /// Additionally re-harvests whenever `field` changes.
    pub fn with_trigger(mut self, field: Field) -> Self {
        self.trigger_fields.insert(field);
        self
    }

    fn wants(&self, purl: &PackageId, updated: &BTreeSet<Field>, values: &BTreeMap<Field, Value>) -> bool {
        if !self.provider.supports(&purl.pkg_type) {
            return false;
        }
        values.is_empty() || updated.iter().any(|field| self.trigger_fields.contains(field))
    }
}

impl PackageListener for HarvesterAdapter {
    fn on_updated(
        &self,
        purl: &PackageId,
        updated: &BTreeSet<Field>,
        values: &BTreeMap<Field, Value>,
    ) -> Option<PackageTask> {
        if !self.wants(purl, updated, values) {
            return None;
        }

        let provider = Arc::clone(&self.provider);
        let purl = purl.clone();
        debug!(%purl, provider = provider.name(), "scheduling harvest");

        Some(Box::new(move |modifier| {
            match provider.fetch(&purl)? {
                Some(metadata) => {
                    let trust = metadata.trust;
                    let proposals = metadata.field_values();
                    let reported = proposals.len();
                    for (field, value) in proposals {
                        modifier.update(field, trust, Some(value));
                    }
                    info!(
                        %purl,
                        provider = provider.name(),
                        reported,
                        accepted = modifier.modified_fields().len(),
                        "harvest applied"
                    );
                }
                None => debug!(%purl, provider = provider.name(), "nothing known upstream"),
            }
            Ok(())
        }))
    }
}
