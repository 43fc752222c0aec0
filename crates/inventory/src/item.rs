use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shelfwise_core::{DomainError, DomainResult, Entity, InventoryId, ItemId};
use shelfwise_templates::{AttributeBag, FieldValue, SubmittedValues, Template, validate_required};

use crate::inventory::{Inventory, non_blank};
use crate::tags::deserialize_tags;

fn default_quantity() -> i64 {
    1
}

/// Command: create an item inside an inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub custom_fields: SubmittedValues,
}

/// A record within an inventory: core attributes plus the template-defined
/// attribute bag.
///
/// # Invariants
/// - `quantity >= 0`
/// - `attributes` keys are a subset of the inventory template's field names
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    id: ItemId,
    inventory_id: InventoryId,
    name: String,
    description: Option<String>,
    quantity: i64,
    tags: Vec<String>,
    #[serde(rename = "custom_fields")]
    attributes: AttributeBag,
    created_at: DateTime<Utc>,
}

impl Item {
    /// Validate a draft against the inventory's template and build the item.
    ///
    /// Authorization (only the inventory owner may add items) is checked by
    /// the caller.
    pub fn create(
        id: ItemId,
        inventory: &Inventory,
        template: &Template,
        draft: NewItem,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if inventory.template_id() != *template.id() {
            return Err(DomainError::invariant("template does not belong to this inventory"));
        }

        let name = draft.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::field("name", "Item name is required"));
        }
        if draft.quantity < 0 {
            return Err(DomainError::field("quantity", "Quantity cannot be negative"));
        }

        validate_required(template.fields(), &draft.custom_fields)?;
        let attributes = AttributeBag::from_submission(template.fields(), &draft.custom_fields)?;

        Ok(Self {
            id,
            inventory_id: *inventory.id(),
            name,
            description: non_blank(draft.description),
            quantity: draft.quantity,
            tags: draft.tags,
            attributes,
            created_at,
        })
    }

    /// Rebuild an item from stored columns.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: ItemId,
        inventory_id: InventoryId,
        name: String,
        description: Option<String>,
        quantity: i64,
        tags: Vec<String>,
        attributes: AttributeBag,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            inventory_id,
            name,
            description,
            quantity,
            tags,
            attributes,
            created_at,
        }
    }

    pub fn inventory_id(&self) -> InventoryId {
        self.inventory_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn attributes(&self) -> &AttributeBag {
        &self.attributes
    }

    pub fn attribute(&self, field: &str) -> Option<&FieldValue> {
        self.attributes.get(field)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
