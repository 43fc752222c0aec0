use core::str::FromStr;

use serde::{Deserialize, Serialize};

use shelfwise_core::{DomainError, DomainResult, Entity, FieldId, TemplateId};

/// Declared type of a custom field.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Number,
    Date,
    Boolean,
    Select,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Boolean => "boolean",
            FieldType::Select => "select",
        }
    }
}

impl core::fmt::Display for FieldType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(FieldType::Text),
            "number" => Ok(FieldType::Number),
            "date" => Ok(FieldType::Date),
            "boolean" => Ok(FieldType::Boolean),
            "select" => Ok(FieldType::Select),
            other => Err(DomainError::validation(format!(
                "unknown field type '{other}' (expected one of: text, number, date, boolean, select)"
            ))),
        }
    }
}

/// One typed, optionally-required attribute declared by a template.
///
/// # Invariants
/// - `options` is `Some` and non-empty iff `field_type` is `Select`.
/// - `name` is non-empty (uniqueness within a template is checked by
///   [`crate::Template::create`]).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDefinition {
    id: FieldId,
    template_id: TemplateId,
    name: String,
    #[serde(rename = "type")]
    field_type: FieldType,
    options: Option<Vec<String>>,
    required: bool,
    display_order: i32,
}

impl FieldDefinition {
    pub fn new(
        id: FieldId,
        template_id: TemplateId,
        name: impl Into<String>,
        field_type: FieldType,
        options: Option<Vec<String>>,
        required: bool,
        display_order: i32,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::invariant("field name cannot be empty"));
        }

        let options = match (field_type, options) {
            (FieldType::Select, Some(opts)) if !opts.is_empty() => Some(opts),
            (FieldType::Select, _) => {
                return Err(DomainError::invariant(format!(
                    "select field '{name}' requires at least one option"
                )));
            }
            (_, Some(opts)) if !opts.is_empty() => {
                return Err(DomainError::invariant(format!(
                    "field '{name}' of type {field_type} cannot declare options"
                )));
            }
            (_, _) => None,
        };

        Ok(Self {
            id,
            template_id,
            name,
            field_type,
            options,
            required,
            display_order,
        })
    }

    pub fn template_id(&self) -> TemplateId {
        self.template_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Allowed values, only present for `select` fields.
    pub fn options(&self) -> Option<&[String]> {
        self.options.as_deref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn display_order(&self) -> i32 {
        self.display_order
    }

    pub fn allows_option(&self, value: &str) -> bool {
        self.options
            .as_ref()
            .is_some_and(|opts| opts.iter().any(|o| o == value))
    }
}

impl Entity for FieldDefinition {
    type Id = FieldId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(field_type: FieldType, options: Option<Vec<String>>) -> DomainResult<FieldDefinition> {
        FieldDefinition::new(FieldId::new(), TemplateId::new(), "Color", field_type, options, false, 0)
    }

    #[test]
    fn select_requires_options() {
        assert!(field(FieldType::Select, None).is_err());
        assert!(field(FieldType::Select, Some(vec![])).is_err());

        let ok = field(FieldType::Select, Some(vec!["red".into(), "blue".into()])).unwrap();
        assert!(ok.allows_option("red"));
        assert!(!ok.allows_option("green"));
    }

    #[test]
    fn non_select_rejects_options() {
        let err = field(FieldType::Text, Some(vec!["x".into()])).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));

        // An empty list is the same as no list.
        let ok = field(FieldType::Number, Some(vec![])).unwrap();
        assert_eq!(ok.options(), None);
    }

    #[test]
    fn field_type_parses_case_insensitively() {
        assert_eq!("Boolean".parse::<FieldType>().unwrap(), FieldType::Boolean);
        assert_eq!(" select ".parse::<FieldType>().unwrap(), FieldType::Select);
        assert!("checkbox".parse::<FieldType>().is_err());
    }

    #[test]
    fn field_type_uses_lowercase_wire_names() {
        let json = serde_json::to_string(&FieldType::Date).unwrap();
        assert_eq!(json, "\"date\"");
        let back: FieldType = serde_json::from_str("\"select\"").unwrap();
        assert_eq!(back, FieldType::Select);
    }
}
