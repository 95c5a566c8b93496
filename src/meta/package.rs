//! Package aggregate and the scoped mutation handle used to edit it.

use crate::meta::attribute::Attribute;
use crate::meta::field::{Field, Trust};
use crate::purl::PackageId;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Aggregate root holding the full attribute set for one coordinate.
///
/// The attribute set is fixed to [`Field::ALL`] at creation; a package is
/// never partially initialized. All mutation goes through a
/// [`PackageModifier`] obtained from an edit transaction.
#[derive(Debug, Clone)]
pub struct Package {
    purl: PackageId,
    attributes: BTreeMap<Field, Attribute>,
}

impl Package {
    /// Creates a package with one empty attribute per known field.
    pub fn new(purl: PackageId) -> Self {
        let attributes = Field::ALL
            .into_iter()
            .map(|field| (field, Attribute::new(field)))
            .collect();
        Self { purl, attributes }
    }

    /// Coordinate this package is keyed by.
    pub fn purl(&self) -> &PackageId {
        &self.purl
    }

    /// Iterates all attributes, valued or not. Finite and restartable.
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.values()
    }

    /// Looks up one attribute.
    pub fn attribute(&self, field: Field) -> &Attribute {
        // The map is total over Field::ALL from construction.
        &self.attributes[&field]
    }

    fn attribute_mut(&mut self, field: Field) -> &mut Attribute {
        self.attributes
            .get_mut(&field)
            .unwrap_or_else(|| unreachable!("attribute set is total over Field::ALL"))
    }

    /// Map of all currently accepted values, keyed by field.
    pub fn snapshot(&self) -> BTreeMap<Field, Value> {
        self.attributes()
            .filter_map(|attr| attr.value().map(|value| (attr.field(), value.clone())))
            .collect()
    }
}

/// Scoped mutation handle opened for the duration of one edit.
///
/// Records precisely which fields changed observable state, so listeners are
/// not invoked for proposals that were ignored by the trust policy. Discarded
/// at the end of the transaction.
#[derive(Debug)]
pub struct PackageModifier<'a> {
    package: &'a mut Package,
    modified: BTreeSet<Field>,
}

impl<'a> PackageModifier<'a> {
    pub(crate) fn new(package: &'a mut Package) -> Self {
        Self {
            package,
            modified: BTreeSet::new(),
        }
    }

    /// Coordinate of the package under edit.
    pub fn purl(&self) -> &PackageId {
        self.package.purl()
    }

    /// Currently accepted value of one field.
    pub fn value(&self, field: Field) -> Option<&Value> {
        self.package.attribute(field).value()
    }

    /// Proposes a value for one field at the given trust rank.
    ///
    /// The field is recorded as modified only if the attribute reports an
    /// observable state change.
    pub fn update(&mut self, field: Field, trust: Trust, proposal: Option<Value>) {
        if self.package.attribute_mut(field).update(trust, proposal) {
            self.modified.insert(field);
        }
    }

    /// Records a diagnostic error against one field.
    pub fn record_error(&mut self, field: Field, message: impl Into<String>) {
        if self.package.attribute_mut(field).record_error(message) {
            self.modified.insert(field);
        }
    }

    /// Fields whose state changed during this edit.
    pub fn modified_fields(&self) -> &BTreeSet<Field> {
        &self.modified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn purl() -> PackageId {
        PackageId::parse("pkg:npm/chalk@5.0.0").unwrap()
    }

    #[test]
    fn new_package_has_every_field() {
        let pkg = Package::new(purl());
        assert_eq!(pkg.attributes().count(), Field::ALL.len());
        assert!(pkg.snapshot().is_empty());
    }

    #[test]
    fn modifier_tracks_changed_fields_precisely() {
        let mut pkg = Package::new(purl());
        let mut modifier = PackageModifier::new(&mut pkg);

        modifier.update(Field::Title, Trust::LIKELY, Some(json!("chalk")));
        // Applied but unchanged: same value at equal trust.
        modifier.update(Field::Title, Trust::LIKELY, Some(json!("chalk")));
        // Ignored: nothing proposed.
        modifier.update(Field::HomePage, Trust::LIKELY, None);

        let modified: Vec<_> = modifier.modified_fields().iter().copied().collect();
        assert_eq!(modified, vec![Field::Title]);
    }

    #[test]
    fn modifier_tracks_rejected_lower_trust_as_unchanged() {
        let mut pkg = Package::new(purl());
        {
            let mut modifier = PackageModifier::new(&mut pkg);
            modifier.update(Field::Sha1, Trust::PROBABLY, Some(json!("abc")));
        }

        let mut modifier = PackageModifier::new(&mut pkg);
        modifier.update(Field::Sha1, Trust::GUESS, Some(json!("def")));
        assert!(modifier.modified_fields().is_empty());
    }

    #[test]
    fn snapshot_contains_only_present_values() {
        let mut pkg = Package::new(purl());
        {
            let mut modifier = PackageModifier::new(&mut pkg);
            modifier.update(Field::Title, Trust::LIKELY, Some(json!("chalk")));
            modifier.update(Field::DeclaredLicense, Trust::LIKELY, Some(json!("MIT")));
        }

        let snapshot = pkg.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[&Field::Title], json!("chalk"));
        assert_eq!(snapshot[&Field::DeclaredLicense], json!("MIT"));
    }

    #[test]
    fn error_recording_marks_the_field_modified() {
        let mut pkg = Package::new(purl());
        let mut modifier = PackageModifier::new(&mut pkg);

        modifier.record_error(Field::HomePage, "provider unreachable");

        assert!(modifier.modified_fields().contains(&Field::HomePage));
        assert_eq!(
            pkg.attribute(Field::HomePage).state().error(),
            Some("provider unreachable")
        );
    }
}
