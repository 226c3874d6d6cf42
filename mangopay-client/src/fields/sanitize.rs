//! Per-action field visibility rules.
//!
//! Rules are applied in a fixed order:
//!
//! 1. **Identifier**: `Id` is dropped for create (the service assigns it) and
//!    for update (the object is addressed through the path).
//! 2. **Server-managed**: fields the service computes are always dropped.
//! 3. **Integral numbers**: floats holding an integral value become integers.
//! 4. **Update sparsity**: on update, zero values (`""`, `0`, `null`) are dropped
//!    so that the service leaves the corresponding fields unchanged.
//!
//! A consequence of rule 4 is that a field cannot be cleared through an
//! update: an empty value is indistinguishable from "unchanged".

use crate::{
    action::{Action, Intent},
    fields::{FieldMap, ID_FIELD},
    model::Record,
};

/// Removes fields a given action must not send.
#[derive(Debug, Clone, Copy)]
pub struct Sanitizer {
    server_managed: &'static [&'static str],
}

impl Sanitizer {
    /// Creates a sanitizer dropping the given server-managed fields.
    #[must_use]
    pub const fn new(server_managed: &'static [&'static str]) -> Self {
        Self { server_managed }
    }

    /// Creates the sanitizer for a record type.
    #[must_use]
    pub const fn for_record<R: Record>() -> Self {
        Self::new(R::SERVER_MANAGED)
    }

    /// Fields this sanitizer always removes.
    #[must_use]
    pub fn server_managed(&self) -> &'static [&'static str] {
        self.server_managed
    }

    /// Applies the rules for `action` to `fields`.
    ///
    /// Fields are only ever removed or coerced, never added, and applying the
    /// same action twice gives the same result as applying it once.
    #[must_use]
    pub fn sanitize(&self, mut fields: FieldMap, action: Action) -> FieldMap {
        let intent = action.intent();

        if matches!(intent, Intent::Create | Intent::Update) {
            fields.remove(ID_FIELD);
        }

        for name in self.server_managed {
            fields.remove(name);
        }

        fields.coerce_integral();

        if intent == Intent::Update {
            fields.retain(|_, value| !value.is_zero());
        }

        fields
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::fields::FieldValue;

    const HOOK_MANAGED: &[&str] = &["Status", "Validity", "CreationDate"];

    fn hook_fields() -> FieldMap {
        FieldMap::new()
            .with("Id", "")
            .with("Url", "https://example.test/hook")
            .with("EventType", "PAYIN_NORMAL_SUCCEEDED")
            .with("Status", "")
            .with("Validity", "")
            .with("Tag", "")
            .with("CreationDate", 0_i64)
    }

    #[test]
    fn test_create_drops_identifier_and_managed_fields() {
        let sanitized = Sanitizer::new(HOOK_MANAGED).sanitize(hook_fields(), Action::CreateHook);

        assert!(!sanitized.contains("Id"));
        assert!(!sanitized.contains("Status"));
        assert!(!sanitized.contains("Validity"));
        assert!(!sanitized.contains("CreationDate"));
    }

    #[test]
    fn test_create_keeps_zero_values() {
        let sanitized = Sanitizer::new(HOOK_MANAGED).sanitize(hook_fields(), Action::CreateHook);
        assert_eq!(sanitized.get("Tag"), Some(&FieldValue::Str(String::new())));
    }

    #[test]
    fn test_create_drops_non_empty_managed_fields() {
        let fields = hook_fields().with("Id", "123").with("Status", "ENABLED").with("Validity", "VALID");
        let sanitized = Sanitizer::new(HOOK_MANAGED).sanitize(fields, Action::CreateHook);

        assert_eq!(sanitized.keys().collect::<Vec<_>>(), ["EventType", "Tag", "Url"]);
    }

    #[test]
    fn test_update_drops_zero_values() {
        let fields = hook_fields().with("Id", "123").with("Url", "");
        let sanitized = Sanitizer::new(HOOK_MANAGED).sanitize(fields, Action::UpdateHook);

        assert_eq!(sanitized.keys().collect::<Vec<_>>(), ["EventType"]);
    }

    #[test]
    fn test_update_keeps_booleans() {
        let fields = FieldMap::new().with("Active", false).with("Tag", "");
        let sanitized = Sanitizer::new(&[]).sanitize(fields, Action::UpdateWallet);
        assert_eq!(sanitized.get("Active"), Some(&FieldValue::Bool(false)));
        assert!(!sanitized.contains("Tag"));
    }

    #[test]
    fn test_fetch_keeps_identifier() {
        let fields = FieldMap::new().with("Id", "42");
        let sanitized = Sanitizer::new(HOOK_MANAGED).sanitize(fields, Action::FetchHook);
        assert!(sanitized.contains("Id"));
    }

    #[test]
    fn test_integral_floats_are_coerced() {
        let fields = FieldMap::new().with("ExecutionDate", 1_700_000_000.0);
        let sanitized = Sanitizer::new(&[]).sanitize(fields, Action::CreateTransfer);

        assert_eq!(sanitized.get("ExecutionDate"), Some(&FieldValue::Int(1_700_000_000)));
        assert_eq!(
            serde_json::to_string(&sanitized).unwrap(),
            r#"{"ExecutionDate":1700000000}"#
        );
    }

    #[test]
    fn test_zero_float_dropped_on_update_after_coercion() {
        let fields = FieldMap::new().with("CreationDate", 0.0);
        let sanitized = Sanitizer::new(&[]).sanitize(fields, Action::UpdateHook);
        assert!(sanitized.is_empty());
    }

    fn arb_value() -> impl Strategy<Value = FieldValue> {
        prop_oneof![
            Just(FieldValue::Null),
            any::<bool>().prop_map(FieldValue::Bool),
            any::<i64>().prop_map(FieldValue::Int),
            (-1.0e12..1.0e12_f64).prop_map(FieldValue::Float),
            (-1.0e9..1.0e9_f64).prop_map(|f| FieldValue::Float(f.trunc())),
            "[a-zA-Z0-9 ]{0,8}".prop_map(FieldValue::Str),
        ]
    }

    fn arb_map() -> impl Strategy<Value = FieldMap> {
        let names = prop_oneof![
            Just("Id".to_owned()),
            Just("Status".to_owned()),
            Just("Validity".to_owned()),
            Just("Url".to_owned()),
            Just("Tag".to_owned()),
            Just("CreationDate".to_owned()),
            "[A-Z][a-zA-Z]{0,10}",
        ];
        proptest::collection::vec((names, arb_value()), 0..12)
            .prop_map(|pairs| pairs.into_iter().collect())
    }

    fn arb_action() -> impl Strategy<Value = Action> {
        proptest::sample::select(Action::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_sanitize_is_idempotent(fields in arb_map(), action in arb_action()) {
            let sanitizer = Sanitizer::new(HOOK_MANAGED);
            let once = sanitizer.sanitize(fields, action);
            let twice = sanitizer.sanitize(once.clone(), action);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_update_has_no_zero_values(fields in arb_map()) {
            let sanitized = Sanitizer::new(HOOK_MANAGED).sanitize(fields, Action::UpdateHook);
            for (name, value) in &sanitized {
                prop_assert!(!value.is_zero(), "{} kept a zero value", name);
            }
            for name in ["Id", "Status", "Validity"] {
                prop_assert!(!sanitized.contains(name));
            }
        }

        #[test]
        fn prop_create_never_sends_managed_fields(fields in arb_map()) {
            let sanitized = Sanitizer::new(HOOK_MANAGED).sanitize(fields, Action::CreateHook);
            for name in ["Id", "Status", "Validity"] {
                prop_assert!(!sanitized.contains(name));
            }
        }

        #[test]
        fn prop_sanitize_never_adds_fields(fields in arb_map(), action in arb_action()) {
            let before: Vec<String> = fields.keys().map(str::to_owned).collect();
            let sanitized = Sanitizer::new(HOOK_MANAGED).sanitize(fields, action);
            for name in sanitized.keys() {
                prop_assert!(before.iter().any(|b| b == name));
            }
        }
    }
}
