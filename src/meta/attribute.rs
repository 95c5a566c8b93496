//! Binding of one [`Field`] to its consolidated [`FieldValue`].

use crate::meta::field::{Field, Trust};
use crate::meta::value::FieldValue;
use serde_json::Value;

/// One metadata dimension of one package.
///
/// Owned exclusively by exactly one `Package`; all writes go through
/// [`update`](Self::update), which applies the trust-based write policy.
#[derive(Debug, Clone)]
pub struct Attribute {
    field: Field,
    state: FieldValue<Value>,
}

impl Attribute {
    pub(crate) fn new(field: Field) -> Self {
        Self {
            field,
            state: FieldValue::new(),
        }
    }

    /// Dimension this attribute tracks.
    pub fn field(&self) -> Field {
        self.field
    }

    /// Currently accepted value, if any.
    pub fn value(&self) -> Option<&Value> {
        self.state.value()
    }

    /// Full consolidated state, for diagnostics and presentation.
    pub fn state(&self) -> &FieldValue<Value> {
        &self.state
    }

    /// Applies one proposal.
    ///
    /// [`Trust::MAX`] carries manual-correction semantics: the proposal is
    /// applied as an override (including override-to-empty for `None`). At
    /// any lower rank, `Some(v)` is routed through the trust policy of
    /// [`FieldValue::set_value`] and `None` proposes nothing.
    ///
    /// Returns `true` when observable state changed.
    pub fn update(&mut self, trust: Trust, proposal: Option<Value>) -> bool {
        if trust >= Trust::MAX {
            self.state.override_with(proposal)
        } else {
            match proposal {
                Some(value) => self.state.set_value(trust, value),
                None => false,
            }
        }
    }

    /// Records a diagnostic error against this attribute.
    pub fn record_error(&mut self, message: impl Into<String>) -> bool {
        self.state.error_with(message)
    }
}
