use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shelfwise_auth::{Principal, Profile};
use shelfwise_core::{Entity, TemplateId, UserId};
use shelfwise_infra::store::AdminStats;
use shelfwise_inventory::{Inventory, Item};
use shelfwise_templates::{FieldDefinition, FieldType, FieldValue, Template, display_or_not_set};

use crate::context::UserContext;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct DraftRequest {
    #[serde(default)]
    pub body: String,
}

// -------------------------
// Response DTOs
// -------------------------

/// The caller as seen by `/auth/session` and `/whoami`.
#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub profile: Profile,
    pub display_name: String,
    pub initials: String,
    pub permissions: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionInfo {
    pub fn from_context(user: &UserContext) -> Self {
        let profile = user.profile().clone();
        Self {
            display_name: profile.display_name().to_string(),
            initials: profile.initials(),
            permissions: permission_names(&user.principal()),
            expires_at: user.claims().expires_at(),
            profile,
        }
    }
}

fn permission_names(principal: &Principal) -> Vec<String> {
    principal
        .permissions()
        .iter()
        .map(|p| p.as_str().to_string())
        .collect()
}

#[derive(Debug, Serialize)]
pub struct LikeState {
    pub liked: bool,
    pub like_count: i64,
}

#[derive(Debug, Serialize)]
pub struct TemplateListing {
    #[serde(flatten)]
    pub template: Template,
    pub like_count: i64,
}

#[derive(Debug, Serialize)]
pub struct TemplateDetail {
    #[serde(flatten)]
    pub template: Template,
    /// Fields sorted for display.
    pub ordered_fields: Vec<FieldDefinition>,
    pub like_count: i64,
}

impl TemplateDetail {
    pub fn new(template: Template, like_count: i64) -> Self {
        let ordered_fields = template.ordered_fields().into_iter().cloned().collect();
        Self {
            template,
            ordered_fields,
            like_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InventoryListing {
    #[serde(flatten)]
    pub inventory: Inventory,
    pub template_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TemplateRef {
    pub id: TemplateId,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct InventoryDetail {
    #[serde(flatten)]
    pub inventory: Inventory,
    pub template: TemplateRef,
    pub fields: Vec<FieldDefinition>,
    pub item_count: i64,
    pub discussion_count: i64,
    pub like_count: i64,
    pub can_edit: bool,
}

/// Number of custom columns shown in item tables.
pub const SUMMARY_FIELD_COUNT: usize = 2;

#[derive(Debug, Serialize)]
pub struct ItemListing {
    pub summary_fields: Vec<String>,
    pub items: Vec<Item>,
}

impl ItemListing {
    pub fn new(template: &Template, items: Vec<Item>) -> Self {
        Self {
            summary_fields: template
                .summary_fields(SUMMARY_FIELD_COUNT)
                .iter()
                .map(|f| f.name().to_string())
                .collect(),
            items,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FieldDisplay {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    pub value: Option<FieldValue>,
    pub display: String,
}

#[derive(Debug, Serialize)]
pub struct ItemDetail {
    #[serde(flatten)]
    pub item: Item,
    pub fields: Vec<FieldDisplay>,
}

impl ItemDetail {
    /// Every template field in display order, with "Not set" for absent values.
    pub fn new(template: &Template, item: Item) -> Self {
        let fields = template
            .ordered_fields()
            .into_iter()
            .map(|field| {
                let value = item.attribute(field.name()).cloned();
                FieldDisplay {
                    name: field.name().to_string(),
                    field_type: field.field_type(),
                    required: field.is_required(),
                    display: display_or_not_set(value.as_ref()),
                    value,
                }
            })
            .collect();
        Self { item, fields }
    }
}

#[derive(Debug, Serialize)]
pub struct OwnerSummary {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
}

impl OwnerSummary {
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            id: profile.id,
            email: profile.email.clone(),
            display_name: profile.display_name().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AdminTemplateRow {
    pub id: TemplateId,
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub owner: Option<OwnerSummary>,
    pub field_count: usize,
}

impl AdminTemplateRow {
    pub fn new(template: &Template, owner: Option<&Profile>) -> Self {
        Self {
            id: *template.id(),
            name: template.name().to_string(),
            description: template.description().map(str::to_string),
            is_public: template.is_public(),
            created_at: template.created_at(),
            owner: owner.map(OwnerSummary::from_profile),
            field_count: template.fields().len(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AdminDashboard {
    pub totals: AdminStats,
    pub recent_users: Vec<Profile>,
    pub recent_templates: Vec<AdminTemplateRow>,
}
