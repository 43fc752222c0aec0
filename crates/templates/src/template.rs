use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shelfwise_core::{DomainError, DomainResult, Entity, FieldId, TemplateId, UserId};

use crate::field::{FieldDefinition, FieldType};

/// Draft of a single custom field, as submitted when creating a template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewField {
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub required: bool,
    /// Defaults to the field's position in the submitted list.
    #[serde(default)]
    pub display_order: Option<i32>,
}

/// Command: create a template together with its fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTemplate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub fields: Vec<NewField>,
}

/// A named, reusable schema consisting of ordered custom field definitions.
///
/// Fields are created together with the template and never edited
/// afterwards, so an inventory bound to a template always sees the same
/// field set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Template {
    id: TemplateId,
    owner_id: UserId,
    name: String,
    description: Option<String>,
    is_public: bool,
    created_at: DateTime<Utc>,
    fields: Vec<FieldDefinition>,
}

impl Template {
    /// Validate a draft and build the template with fresh field ids.
    pub fn create(
        id: TemplateId,
        owner_id: UserId,
        draft: NewTemplate,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = draft.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::field("name", "Template name is required"));
        }

        let mut seen: HashSet<String> = HashSet::new();
        let mut fields = Vec::with_capacity(draft.fields.len());

        for (position, f) in draft.fields.into_iter().enumerate() {
            let field_name = f.name.trim().to_string();
            if field_name.is_empty() {
                return Err(DomainError::field(
                    format!("fields[{position}].name"),
                    "All custom fields must have a name",
                ));
            }
            if !seen.insert(field_name.clone()) {
                return Err(DomainError::field(
                    format!("fields[{position}].name"),
                    format!("Field name \"{field_name}\" is used more than once"),
                ));
            }

            let options = match f.field_type {
                FieldType::Select => {
                    let cleaned: Vec<String> = f
                        .options
                        .unwrap_or_default()
                        .iter()
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect();
                    if cleaned.is_empty() {
                        return Err(DomainError::field(
                            format!("fields[{position}].options"),
                            format!("Select field \"{field_name}\" must have at least one option"),
                        ));
                    }
                    Some(cleaned)
                }
                _ => None,
            };

            let display_order = f.display_order.unwrap_or(position as i32);
            fields.push(FieldDefinition::new(
                FieldId::new(),
                id,
                field_name,
                f.field_type,
                options,
                f.required,
                display_order,
            )?);
        }

        Ok(Self {
            id,
            owner_id,
            name,
            description: normalize_description(draft.description),
            is_public: draft.is_public,
            created_at,
            fields,
        })
    }

    /// Rebuild a template from stored parts (fields in insertion order).
    pub fn restore(
        id: TemplateId,
        owner_id: UserId,
        name: String,
        description: Option<String>,
        is_public: bool,
        created_at: DateTime<Utc>,
        fields: Vec<FieldDefinition>,
    ) -> Self {
        Self {
            id,
            owner_id,
            name,
            description,
            is_public,
            created_at,
            fields,
        }
    }

    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_public(&self) -> bool {
        self.is_public
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Fields in insertion order.
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    /// Fields in presentation order: by `display_order`, ties by insertion order.
    pub fn ordered_fields(&self) -> Vec<&FieldDefinition> {
        let mut ordered: Vec<&FieldDefinition> = self.fields.iter().collect();
        // `sort_by_key` is stable, which keeps insertion order for ties.
        ordered.sort_by_key(|f| f.display_order());
        ordered
    }

    /// The first `n` fields in presentation order (list views show two).
    pub fn summary_fields(&self, n: usize) -> Vec<&FieldDefinition> {
        self.ordered_fields().into_iter().take(n).collect()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Public templates are usable by everyone; private ones by their owner.
    pub fn is_usable_by(&self, user: UserId) -> bool {
        self.is_public || self.owner_id == user
    }
}

impl Entity for Template {
    type Id = TemplateId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Parse a comma-separated option list: split, trim, drop empties.
pub fn parse_options(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}
