//! Typed attribute bag: field name → [`FieldValue`].

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::field::{FieldDefinition, FieldType};
use crate::validate::{SubmittedValues, ValidationError, is_blank};
use crate::value::FieldValue;

/// Custom-field values of one item, keyed by field name.
///
/// Keys are always a subset of the owning template's field names and each
/// value's variant matches its field's declared type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AttributeBag(BTreeMap<String, FieldValue>);

impl AttributeBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Coerce a loosely-typed submission into a typed bag.
    ///
    /// - unknown keys are rejected
    /// - blank values on non-boolean fields are treated as absent
    /// - missing boolean fields become `false`
    /// - numbers accept JSON numbers or numeric strings, dates accept
    ///   `YYYY-MM-DD` (or an RFC 3339 timestamp, truncated to its date)
    /// - select values must be one of the field's options
    ///
    /// Required-field presence is checked separately by
    /// [`crate::validate_required`].
    pub fn from_submission(
        fields: &[FieldDefinition],
        submitted: &SubmittedValues,
    ) -> Result<Self, ValidationError> {
        if let Some(unknown) = submitted
            .keys()
            .find(|key| !fields.iter().any(|f| f.name() == key.as_str()))
        {
            return Err(ValidationError::UnknownField {
                field: unknown.clone(),
            });
        }

        let mut values = BTreeMap::new();
        for field in fields {
            let raw = submitted.get(field.name());
            if field.field_type() == FieldType::Boolean {
                let value = match raw {
                    None | Some(JsonValue::Null) => false,
                    Some(JsonValue::Bool(b)) => *b,
                    Some(_) => return Err(mismatch(field)),
                };
                values.insert(field.name().to_string(), FieldValue::Boolean(value));
                continue;
            }

            if is_blank(raw) {
                continue;
            }
            let Some(raw) = raw else { continue };
            values.insert(field.name().to_string(), coerce(field, raw)?);
        }

        Ok(Self(values))
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// JSON object form, as persisted.
    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or_else(|_| JsonValue::Object(Default::default()))
    }
}

fn coerce(field: &FieldDefinition, raw: &JsonValue) -> Result<FieldValue, ValidationError> {
    match field.field_type() {
        FieldType::Text => match raw {
            JsonValue::String(s) => Ok(FieldValue::Text(s.clone())),
            _ => Err(mismatch(field)),
        },
        FieldType::Number => match raw {
            JsonValue::Number(n) => n.as_f64().map(FieldValue::Number).ok_or_else(|| mismatch(field)),
            JsonValue::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(FieldValue::Number)
                .ok_or_else(|| mismatch(field)),
            _ => Err(mismatch(field)),
        },
        FieldType::Date => match raw {
            JsonValue::String(s) => parse_date(s.trim())
                .map(FieldValue::Date)
                .ok_or_else(|| mismatch(field)),
            _ => Err(mismatch(field)),
        },
        FieldType::Select => match raw {
            JsonValue::String(s) if field.allows_option(s) => Ok(FieldValue::Select(s.clone())),
            JsonValue::String(s) => Err(ValidationError::OptionNotAllowed {
                field: field.name().to_string(),
                value: s.clone(),
            }),
            _ => Err(mismatch(field)),
        },
        FieldType::Boolean => match raw {
            JsonValue::Bool(b) => Ok(FieldValue::Boolean(*b)),
            _ => Err(mismatch(field)),
        },
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

fn mismatch(field: &FieldDefinition) -> ValidationError {
    ValidationError::TypeMismatch {
        field: field.name().to_string(),
        expected: field.field_type(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use shelfwise_core::{FieldId, TemplateId};

    fn field(name: &str, field_type: FieldType, options: Option<&[&str]>) -> FieldDefinition {
        FieldDefinition::new(
            FieldId::new(),
            TemplateId::new(),
            name,
            field_type,
            options.map(|o| o.iter().map(|s| s.to_string()).collect()),
            false,
            0,
        )
        .unwrap()
    }

    fn laptop_fields() -> Vec<FieldDefinition> {
        vec![
            field("Serial", FieldType::Text, None),
            field("Price", FieldType::Number, None),
            field("Bought", FieldType::Date, None),
            field("Active", FieldType::Boolean, None),
            field("Grade", FieldType::Select, Some(&["A", "B"])),
        ]
    }

    fn submitted(value: JsonValue) -> SubmittedValues {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn coerces_every_field_type() {
        let bag = AttributeBag::from_submission(
            &laptop_fields(),
            &submitted(json!({
                "Serial": "SN-1",
                "Price": "1299.50",
                "Bought": "2024-01-31",
                "Active": true,
                "Grade": "B"
            })),
        )
        .unwrap();

        assert_eq!(bag.get("Serial"), Some(&FieldValue::Text("SN-1".into())));
        assert_eq!(bag.get("Price"), Some(&FieldValue::Number(1299.5)));
        assert_eq!(
            bag.get("Bought"),
            Some(&FieldValue::Date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()))
        );
        assert_eq!(bag.get("Active"), Some(&FieldValue::Boolean(true)));
        assert_eq!(bag.get("Grade"), Some(&FieldValue::Select("B".into())));
    }

    #[test]
    fn missing_booleans_default_to_false_and_blanks_are_dropped() {
        let bag = AttributeBag::from_submission(
            &laptop_fields(),
            &submitted(json!({ "Serial": "  ", "Price": null })),
        )
        .unwrap();

        assert_eq!(bag.len(), 1);
        assert_eq!(bag.get("Active"), Some(&FieldValue::Boolean(false)));
        assert_eq!(bag.get("Serial"), None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = AttributeBag::from_submission(&laptop_fields(), &submitted(json!({ "Color": "red" })))
            .unwrap_err();
        assert_eq!(err, ValidationError::UnknownField { field: "Color".into() });
    }

    #[test]
    fn wrong_shapes_are_rejected() {
        let fields = laptop_fields();
        for (name, value) in [
            ("Price", json!("twelve")),
            ("Bought", json!("31/01/2024")),
            ("Active", json!("yes")),
            ("Serial", json!(42)),
        ] {
            let mut values = SubmittedValues::new();
            values.insert(name.to_string(), value);
            let err = AttributeBag::from_submission(&fields, &values).unwrap_err();
            assert!(matches!(err, ValidationError::TypeMismatch { .. }), "{name}: {err:?}");
            assert_eq!(err.field(), name);
        }
    }

    #[test]
    fn rfc3339_timestamps_are_truncated_to_dates() {
        let bag = AttributeBag::from_submission(
            &laptop_fields(),
            &submitted(json!({ "Bought": "2024-05-06T10:00:00Z" })),
        )
        .unwrap();
        assert_eq!(
            bag.get("Bought"),
            Some(&FieldValue::Date(NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()))
        );
    }

    #[test]
    fn bag_serializes_as_plain_object() {
        let bag = AttributeBag::from_submission(
            &laptop_fields(),
            &submitted(json!({ "Price": 10, "Grade": "A" })),
        )
        .unwrap();
        assert_eq!(bag.to_json(), json!({ "Active": false, "Grade": "A", "Price": 10.0 }));
    }

    proptest! {
        #[test]
        fn select_accepts_exactly_the_declared_options(value in "[A-Za-z]{1,3}") {
            let fields = vec![field("Grade", FieldType::Select, Some(&["A", "B", "C"]))];
            let mut values = SubmittedValues::new();
            values.insert("Grade".to_string(), JsonValue::String(value.clone()));

            let result = AttributeBag::from_submission(&fields, &values);
            if ["A", "B", "C"].contains(&value.as_str()) {
                let bag = result.unwrap();
                let expected = FieldValue::Select(value);
                prop_assert_eq!(bag.get("Grade"), Some(&expected));
            } else {
                let is_option_error = matches!(result, Err(ValidationError::OptionNotAllowed { .. }));
                prop_assert!(is_option_error);
            }
        }

        #[test]
        fn bag_keys_are_a_subset_of_field_names(price in proptest::option::of(-1.0e9f64..1.0e9), active in proptest::option::of(any::<bool>())) {
            let fields = laptop_fields();
            let mut values = SubmittedValues::new();
            if let Some(p) = price {
                values.insert("Price".to_string(), json!(p));
            }
            if let Some(a) = active {
                values.insert("Active".to_string(), json!(a));
            }

            let bag = AttributeBag::from_submission(&fields, &values).unwrap();
            for (name, value) in bag.iter() {
                let field = fields.iter().find(|f| f.name() == name.as_str()).unwrap();
                prop_assert_eq!(field.field_type(), value.field_type());
            }
        }
    }
}
