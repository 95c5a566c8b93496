//! Per-field value/trust/contest/error/override state machine.
//!
//! A [`FieldValue`] consolidates proposals for a single metadata dimension
//! reported by several untrusted sources. Competing proposals are arbitrated
//! by [`Trust`] rank; disagreement is surfaced via a retained *contest*
//! instead of a silent overwrite, diagnostic errors are orthogonal to value
//! presence, and a manual *override* freezes the field against any further
//! automated mutation.

use crate::meta::field::Trust;
use std::time::SystemTime;

/// Consolidated state of one metadata field.
///
/// # State machine
///
/// `Empty → Valued → Valued+Contest / Valued+Error → Overridden`
///
/// - [`set_value`](Self::set_value) accepts a proposal subject to the trust
///   policy and clears any diagnostic error.
/// - [`contest`](Self::contest) records a disagreeing proposal next to the
///   accepted value; it never replaces the value.
/// - [`error`](Self::error) records a diagnostic without erasing a prior
///   value, so a stale-but-valid value stays visible while a source fails.
/// - [`override_with`](Self::override_with) is the human-in-the-loop escape
///   hatch: after it, no automated write mutates the field until an explicit
///   `override_with(None)` clears the flag.
#[derive(Debug, Clone)]
pub struct FieldValue<T> {
    value: Option<T>,
    trust: Trust,
    contesting: Option<T>,
    error: Option<String>,
    overridden: bool,
    timestamp: SystemTime,
}

impl<T> Default for FieldValue<T> {
    fn default() -> Self {
        Self {
            value: None,
            trust: Trust::NONE,
            contesting: None,
            error: None,
            overridden: false,
            timestamp: SystemTime::now(),
        }
    }
}

impl<T: Clone + PartialEq> FieldValue<T> {
    /// Creates an empty field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently accepted value, if any.
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Trust rank that produced the current value.
    pub fn trust(&self) -> Trust {
        self.trust
    }

    /// Retained disagreeing proposal, if any.
    pub fn contesting(&self) -> Option<&T> {
        self.contesting.as_ref()
    }

    /// Diagnostic error reported by the most recent failing source.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the field is frozen by a manual correction.
    pub fn is_overridden(&self) -> bool {
        self.overridden
    }

    /// Moment of the last accepted change.
    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    /// Proposes a value at the given trust rank.
    ///
    /// Trust arbitration (the single comparison site for the whole engine):
    /// a proposal replaces the current value only when its trust is strictly
    /// higher; re-asserting the same value at equal trust refreshes the
    /// timestamp and clears any error; a *different* value at equal trust is
    /// recorded as a contest rather than overwriting; lower trust is ignored.
    ///
    /// Returns `true` when observable state changed.
    pub fn set_value(&mut self, trust: Trust, proposal: T) -> bool {
        if self.overridden {
            return false;
        }
        match &self.value {
            None => {
                self.value = Some(proposal);
                self.trust = trust;
                self.error = None;
                self.timestamp = SystemTime::now();
                true
            }
            Some(current) if trust > self.trust => {
                let changed = *current != proposal
                    || self.trust != trust
                    || self.error.is_some()
                    || self.contesting.is_some();
                self.value = Some(proposal);
                self.trust = trust;
                self.error = None;
                self.contesting = None;
                self.timestamp = SystemTime::now();
                changed
            }
            Some(current) if trust == self.trust => {
                if *current == proposal {
                    // Idempotent re-assertion: refresh, clear diagnostics.
                    let changed = self.error.is_some();
                    self.error = None;
                    self.timestamp = SystemTime::now();
                    changed
                } else {
                    self.contest(proposal)
                }
            }
            Some(_) => false,
        }
    }

    /// Records a disagreeing proposal, replacing any prior contest.
    ///
    /// Ignored when there is nothing to contest, while a diagnostic error is
    /// live, or while the field is overridden. Returns `true` when the
    /// contest actually changed.
    pub fn contest(&mut self, proposal: T) -> bool {
        if self.overridden || self.value.is_none() || self.error.is_some() {
            return false;
        }
        if self.contesting.as_ref() == Some(&proposal) {
            return false;
        }
        self.contesting = Some(proposal);
        true
    }

    /// Records a diagnostic error; a prior value is retained.
    ///
    /// Returns `true` when the recorded message changed.
    pub fn error_with(&mut self, message: impl Into<String>) -> bool {
        if self.overridden {
            return false;
        }
        let message = message.into();
        if self.error.as_deref() == Some(message.as_str()) {
            return false;
        }
        self.error = Some(message);
        true
    }

    /// Applies a manual correction.
    ///
    /// `Some(v)` freezes the field at `v` with maximal trust; error and
    /// contest are cleared. `None` clears the override flag and returns the
    /// field to `Empty`, after which automated writes apply again.
    pub fn override_with(&mut self, correction: Option<T>) -> bool {
        match correction {
            Some(value) => {
                let changed = !self.overridden
                    || self.value.as_ref() != Some(&value)
                    || self.error.is_some()
                    || self.contesting.is_some();
                self.value = Some(value);
                self.trust = Trust::MAX;
                self.contesting = None;
                self.error = None;
                self.overridden = true;
                self.timestamp = SystemTime::now();
                changed
            }
            None => {
                let changed = self.overridden
                    || self.value.is_some()
                    || self.error.is_some()
                    || self.contesting.is_some();
                *self = Self {
                    timestamp: SystemTime::now(),
                    ..Self::default()
                };
                changed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALUE: i64 = 42;
    const TEXT: &str = "Text";

    fn field() -> FieldValue<i64> {
        FieldValue::new()
    }

    #[test]
    fn creates_empty_instance() {
        let field = field();
        assert_eq!(field.value(), None);
        assert_eq!(field.contesting(), None);
        assert_eq!(field.error(), None);
        assert!(!field.is_overridden());
        assert!(field.timestamp() <= SystemTime::now());
    }

    mod no_prior_value {
        use super::*;

        #[test]
        fn sets_value() {
            let mut field = field();
            let previous = field.timestamp();

            assert!(field.set_value(Trust::LIKELY, VALUE));

            assert_eq!(field.value(), Some(&VALUE));
            assert_eq!(field.trust(), Trust::LIKELY);
            assert!(field.timestamp() >= previous);
        }

        #[test]
        fn ignores_contest() {
            let mut field = field();

            assert!(!field.contest(VALUE));

            assert_eq!(field.value(), None);
            assert_eq!(field.contesting(), None);
        }

        #[test]
        fn records_error() {
            let mut field = field();

            assert!(field.error_with(TEXT));

            assert_eq!(field.value(), None);
            assert_eq!(field.error(), Some(TEXT));
        }
    }

    mod has_value {
        use super::*;

        fn valued() -> FieldValue<i64> {
            let mut field = field();
            field.set_value(Trust::LIKELY, VALUE);
            field
        }

        #[test]
        fn contests_value() {
            let mut field = valued();

            assert!(field.contest(13));

            assert_eq!(field.value(), Some(&VALUE));
            assert_eq!(field.contesting(), Some(&13));
        }

        #[test]
        fn overwrites_contest() {
            let mut field = valued();
            field.contest(13);
            field.contest(14);

            assert_eq!(field.contesting(), Some(&14));
        }

        #[test]
        fn indicates_error_keeping_value() {
            let mut field = valued();

            assert!(field.error_with(TEXT));

            assert_eq!(field.value(), Some(&VALUE));
            assert_eq!(field.error(), Some(TEXT));
        }

        #[test]
        fn higher_trust_replaces_and_clears_contest() {
            let mut field = valued();
            field.contest(13);

            assert!(field.set_value(Trust::PROBABLY, 14));

            assert_eq!(field.value(), Some(&14));
            assert_eq!(field.trust(), Trust::PROBABLY);
            assert_eq!(field.contesting(), None);
        }

        #[test]
        fn equal_trust_disagreement_contests() {
            let mut field = valued();

            assert!(field.set_value(Trust::LIKELY, 13));

            assert_eq!(field.value(), Some(&VALUE));
            assert_eq!(field.contesting(), Some(&13));
        }

        #[test]
        fn equal_trust_same_value_is_idempotent() {
            let mut field = valued();

            assert!(!field.set_value(Trust::LIKELY, VALUE));

            assert_eq!(field.value(), Some(&VALUE));
            assert_eq!(field.contesting(), None);
        }

        #[test]
        fn lower_trust_is_ignored() {
            let mut field = valued();

            assert!(!field.set_value(Trust::GUESS, 13));

            assert_eq!(field.value(), Some(&VALUE));
            assert_eq!(field.trust(), Trust::LIKELY);
            assert_eq!(field.contesting(), None);
        }

        #[test]
        fn overrides_value() {
            let mut field = valued();

            assert!(field.override_with(Some(73)));

            assert_eq!(field.value(), Some(&73));
            assert!(field.is_overridden());
        }
    }

    mod has_error {
        use super::*;

        fn failing() -> FieldValue<i64> {
            let mut field = field();
            field.set_value(Trust::LIKELY, VALUE);
            field.error_with(TEXT);
            field
        }

        #[test]
        fn error_suppresses_contest() {
            let mut field = failing();

            assert!(!field.contest(13));

            assert_eq!(field.error(), Some(TEXT));
            assert_eq!(field.contesting(), None);
        }

        #[test]
        fn replaces_error_message() {
            let mut field = failing();

            assert!(field.error_with("Other"));

            assert_eq!(field.error(), Some("Other"));
            assert_eq!(field.value(), Some(&VALUE));
        }

        #[test]
        fn set_value_clears_error() {
            let mut field = failing();

            assert!(field.set_value(Trust::LIKELY, VALUE));

            assert_eq!(field.value(), Some(&VALUE));
            assert_eq!(field.error(), None);
        }
    }

    mod overridden {
        use super::*;

        fn corrected() -> FieldValue<i64> {
            let mut field = field();
            field.override_with(Some(VALUE));
            field
        }

        #[test]
        fn ignores_set_value() {
            let mut field = corrected();

            assert!(!field.set_value(Trust::MAX, 666));

            assert_eq!(field.value(), Some(&VALUE));
        }

        #[test]
        fn ignores_contest() {
            let mut field = corrected();

            assert!(!field.contest(13));

            assert_eq!(field.contesting(), None);
        }

        #[test]
        fn ignores_error() {
            let mut field = corrected();

            assert!(!field.error_with(TEXT));

            assert_eq!(field.value(), Some(&VALUE));
            assert_eq!(field.error(), None);
        }

        #[test]
        fn re_overrides() {
            let mut field = corrected();

            assert!(field.override_with(Some(73)));

            assert_eq!(field.value(), Some(&73));
            assert!(field.is_overridden());
        }

        #[test]
        fn clearing_override_returns_to_empty() {
            let mut field = corrected();

            assert!(field.override_with(None));

            assert_eq!(field.value(), None);
            assert!(!field.is_overridden());

            // Automated writes apply again after the flag is cleared.
            assert!(field.error_with(TEXT));
            assert_eq!(field.value(), None);
            assert_eq!(field.error(), Some(TEXT));
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Set(u8, i64),
            Contest(i64),
            Error(String),
            Override(Option<i64>),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0u8..=100, any::<i64>()).prop_map(|(t, v)| Op::Set(t, v)),
                any::<i64>().prop_map(Op::Contest),
                "[a-z]{0,8}".prop_map(Op::Error),
                proptest::option::of(any::<i64>()).prop_map(Op::Override),
            ]
        }

        fn apply(field: &mut FieldValue<i64>, op: &Op) {
            match op {
                Op::Set(trust, v) => {
                    field.set_value(Trust::score(*trust), *v);
                }
                Op::Contest(v) => {
                    field.contest(*v);
                }
                Op::Error(msg) => {
                    field.error_with(msg.clone());
                }
                Op::Override(v) => {
                    field.override_with(*v);
                }
            }
        }

        proptest! {
            // A contest can only ever exist next to an accepted value.
            #[test]
            fn contest_implies_value(ops in proptest::collection::vec(op(), 0..32)) {
                let mut field = FieldValue::new();
                for op in &ops {
                    apply(&mut field, op);
                    prop_assert!(field.contesting().is_none() || field.value().is_some());
                }
            }

            // After a manual correction, automated ops never move the value.
            #[test]
            fn override_is_immune_to_automated_writes(
                correction in any::<i64>(),
                ops in proptest::collection::vec(op(), 0..32),
            ) {
                let mut field = FieldValue::new();
                field.override_with(Some(correction));
                for op in &ops {
                    if matches!(op, Op::Override(_)) {
                        break;
                    }
                    apply(&mut field, op);
                    prop_assert_eq!(field.value(), Some(&correction));
                    prop_assert!(field.is_overridden());
                }
            }

            // A contest never clobbers the accepted value.
            #[test]
            fn contest_never_changes_value(
                initial in any::<i64>(),
                contested in any::<i64>(),
            ) {
                let mut field = FieldValue::new();
                field.set_value(Trust::LIKELY, initial);
                field.contest(contested);
                prop_assert_eq!(field.value(), Some(&initial));
            }
        }
    }
}
