//! Field definition validator.
//!
//! Checks a submitted, loosely-typed attribute object against a template's
//! field definitions before an item or inventory is created.

use serde_json::Value as JsonValue;
use thiserror::Error;

use shelfwise_core::DomainError;

use crate::field::{FieldDefinition, FieldType};

/// Raw custom-field values as submitted by a client: field name → JSON value.
pub type SubmittedValues = serde_json::Map<String, JsonValue>;

/// Why a submitted attribute set was rejected. Every variant names a field.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    RequiredFieldMissing { field: String },

    #[error("{field} is not a field of this template")]
    UnknownField { field: String },

    #[error("{field} must be a {expected} value")]
    TypeMismatch { field: String, expected: FieldType },

    #[error("{value:?} is not an allowed option for {field}")]
    OptionNotAllowed { field: String, value: String },
}

impl ValidationError {
    pub fn field(&self) -> &str {
        match self {
            ValidationError::RequiredFieldMissing { field }
            | ValidationError::UnknownField { field }
            | ValidationError::TypeMismatch { field, .. }
            | ValidationError::OptionNotAllowed { field, .. } => field,
        }
    }
}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        DomainError::field(err.field().to_string(), err.to_string())
    }
}

/// Check every required field has a value.
///
/// - Boolean fields always pass (absence means `false`).
/// - Other required fields fail when the value is absent, JSON `null`, or a
///   string made only of whitespace.
/// - Type conformance of optional fields is not checked here; see
///   [`crate::AttributeBag::from_submission`].
///
/// Fields are checked in the order given; the first failure is returned.
pub fn validate_required(
    fields: &[FieldDefinition],
    submitted: &SubmittedValues,
) -> Result<(), ValidationError> {
    for field in fields.iter().filter(|f| f.is_required()) {
        if field.field_type() == FieldType::Boolean {
            continue;
        }
        if is_blank(submitted.get(field.name())) {
            return Err(ValidationError::RequiredFieldMissing {
                field: field.name().to_string(),
            });
        }
    }
    Ok(())
}

/// Absent, null, or whitespace-only string.
pub(crate) fn is_blank(value: Option<&JsonValue>) -> bool {
    match value {
        None | Some(JsonValue::Null) => true,
        Some(JsonValue::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use shelfwise_core::{FieldId, TemplateId};

    fn field(name: &str, field_type: FieldType, required: bool) -> FieldDefinition {
        let options = (field_type == FieldType::Select).then(|| vec!["a".to_string(), "b".to_string()]);
        FieldDefinition::new(FieldId::new(), TemplateId::new(), name, field_type, options, required, 0).unwrap()
    }

    fn submitted(value: JsonValue) -> SubmittedValues {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn whitespace_serial_fails_naming_the_field() {
        let fields = vec![field("Serial", FieldType::Text, true)];

        let err = validate_required(&fields, &submitted(json!({ "Serial": "  " }))).unwrap_err();
        assert_eq!(err, ValidationError::RequiredFieldMissing { field: "Serial".to_string() });
        assert_eq!(err.to_string(), "Serial is required");

        validate_required(&fields, &submitted(json!({ "Serial": "A1" }))).unwrap();
    }

    #[test]
    fn required_boolean_passes_when_absent() {
        let fields = vec![field("Active", FieldType::Boolean, true)];
        validate_required(&fields, &submitted(json!({}))).unwrap();
        validate_required(&fields, &submitted(json!({ "Active": false }))).unwrap();
    }

    #[test]
    fn null_counts_as_missing() {
        let fields = vec![field("Price", FieldType::Number, true)];
        let err = validate_required(&fields, &submitted(json!({ "Price": null }))).unwrap_err();
        assert_eq!(err.field(), "Price");
    }

    #[test]
    fn optional_fields_are_not_type_checked() {
        let fields = vec![field("Price", FieldType::Number, false)];
        validate_required(&fields, &submitted(json!({ "Price": "not a number" }))).unwrap();
    }

    #[test]
    fn first_failing_field_is_reported() {
        let fields = vec![
            field("Serial", FieldType::Text, true),
            field("Bought", FieldType::Date, true),
        ];
        let err = validate_required(&fields, &submitted(json!({ "Serial": "X" }))).unwrap_err();
        assert_eq!(err.field(), "Bought");
    }

    #[test]
    fn converts_into_field_scoped_domain_error() {
        let err: DomainError = ValidationError::RequiredFieldMissing { field: "Serial".into() }.into();
        assert_eq!(err.offending_field(), Some("Serial"));
    }

    fn non_boolean_type() -> impl Strategy<Value = FieldType> {
        prop_oneof![
            Just(FieldType::Text),
            Just(FieldType::Number),
            Just(FieldType::Date),
            Just(FieldType::Select),
        ]
    }

    proptest! {
        #[test]
        fn blank_values_fail_required_non_boolean_fields(
            field_type in non_boolean_type(),
            name in "[A-Za-z][A-Za-z0-9 ]{0,15}",
            blank in "[ \t\n]{0,6}",
        ) {
            let fields = vec![field(&name, field_type, true)];
            let mut values = SubmittedValues::new();
            values.insert(name.clone(), JsonValue::String(blank));

            let err = validate_required(&fields, &values).unwrap_err();
            prop_assert_eq!(err.field(), name.as_str());
        }

        #[test]
        fn booleans_never_fail(name in "[A-Za-z]{1,12}", required in any::<bool>()) {
            let fields = vec![field(&name, FieldType::Boolean, required)];
            prop_assert!(validate_required(&fields, &SubmittedValues::new()).is_ok());
        }

        #[test]
        fn non_blank_text_satisfies_required(value in "[ ]{0,3}[!-~]{1,20}[ ]{0,3}") {
            let fields = vec![field("Serial", FieldType::Text, true)];
            let mut values = SubmittedValues::new();
            values.insert("Serial".to_string(), JsonValue::String(value));
            prop_assert!(validate_required(&fields, &values).is_ok());
        }
    }
}
