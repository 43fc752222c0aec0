use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shelfwise_core::{DomainError, DomainResult, Entity, InventoryId, TemplateId, UserId};
use shelfwise_templates::{AttributeBag, SubmittedValues, Template, validate_required};

use crate::access::Shared;
use crate::tags::deserialize_tags;

/// Command: create an inventory from a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInventory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub template_id: TemplateId,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub custom_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
    /// Values for the template's fields, checked before creation.
    #[serde(default)]
    pub custom_fields: SubmittedValues,
}

/// A named collection of items instantiated from exactly one template.
///
/// # Invariants
/// - `template_id` is fixed at creation.
/// - `name` is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inventory {
    id: InventoryId,
    owner_id: UserId,
    template_id: TemplateId,
    name: String,
    description: Option<String>,
    is_public: bool,
    custom_id: Option<String>,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
}

impl Inventory {
    /// Validate a draft against its template and build the inventory.
    ///
    /// The creator must be allowed to use the template, and the submitted
    /// custom field values must satisfy the template's field definitions.
    pub fn create(
        id: InventoryId,
        owner_id: UserId,
        draft: NewInventory,
        template: &Template,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if *template.id() != draft.template_id {
            return Err(DomainError::invariant("template does not match the requested template_id"));
        }
        if !template.is_usable_by(owner_id) {
            return Err(DomainError::forbidden("template is private"));
        }

        let name = draft.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::field("name", "Inventory name is required"));
        }

        validate_required(template.fields(), &draft.custom_fields)?;
        AttributeBag::from_submission(template.fields(), &draft.custom_fields)?;

        Ok(Self {
            id,
            owner_id,
            template_id: draft.template_id,
            name,
            description: non_blank(draft.description),
            is_public: draft.is_public,
            custom_id: non_blank(draft.custom_id),
            tags: draft.tags,
            created_at,
        })
    }

    /// Rebuild an inventory from stored columns.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: InventoryId,
        owner_id: UserId,
        template_id: TemplateId,
        name: String,
        description: Option<String>,
        is_public: bool,
        custom_id: Option<String>,
        tags: Vec<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_id,
            template_id,
            name,
            description,
            is_public,
            custom_id,
            tags,
            created_at,
        }
    }

    pub fn template_id(&self) -> TemplateId {
        self.template_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn custom_id(&self) -> Option<&str> {
        self.custom_id.as_deref()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for Inventory {
    type Id = InventoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Shared for Inventory {
    fn owner_id(&self) -> UserId {
        self.owner_id
    }

    fn is_public(&self) -> bool {
        self.is_public
    }
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
