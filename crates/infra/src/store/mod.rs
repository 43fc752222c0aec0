//! Storage boundary.
//!
//! Every page-level data call of the application goes through one of these
//! repository traits. [`memory::InMemoryBackend`] serves dev/tests and
//! [`postgres::PostgresBackend`] serves persistent deployments; the API only
//! sees `Arc<dyn Backend>`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use shelfwise_auth::Profile;
use shelfwise_core::{DomainError, InventoryId, ItemId, TemplateId, UserId};
use shelfwise_discussions::{DiscussionMessage, Draft};
use shelfwise_inventory::{Inventory, Item};
use shelfwise_templates::Template;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryBackend;
pub use postgres::PostgresBackend;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("conflict: {0}")]
    Conflict(String),

    /// A stored row no longer satisfies the domain rules it was written under.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("store lock poisoned")]
    Poisoned,
}

impl From<DomainError> for StoreError {
    fn from(err: DomainError) -> Self {
        StoreError::Corrupt(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Totals shown on the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AdminStats {
    pub users: i64,
    pub templates: i64,
    pub inventories: i64,
    pub items: i64,
    pub discussions: i64,
}

/// A profile with how much it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    #[serde(flatten)]
    pub profile: Profile,
    pub template_count: i64,
    pub inventory_count: i64,
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Insert a profile with its password hash. Duplicate emails conflict.
    async fn insert_profile(&self, profile: &Profile, password_hash: &str) -> StoreResult<()>;

    /// Profile and password hash for an (already normalized) email.
    async fn credentials_by_email(&self, email: &str) -> StoreResult<Option<(Profile, String)>>;

    async fn profile(&self, id: UserId) -> StoreResult<Option<Profile>>;

    async fn profiles(&self, ids: &[UserId]) -> StoreResult<HashMap<UserId, Profile>>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Remember a signed-out token until it would have expired anyway.
    async fn revoke_token(&self, jti: Uuid, expires_at: DateTime<Utc>) -> StoreResult<()>;

    async fn is_token_revoked(&self, jti: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Insert a template together with all its fields.
    async fn insert_template(&self, template: &Template) -> StoreResult<()>;

    async fn template(&self, id: TemplateId) -> StoreResult<Option<Template>>;

    /// Owned templates, newest first.
    async fn templates_owned_by(&self, owner: UserId) -> StoreResult<Vec<Template>>;

    /// Public or owned templates, by name.
    async fn templates_available_to(&self, user: UserId) -> StoreResult<Vec<Template>>;

    /// Every template, newest first.
    async fn all_templates(&self) -> StoreResult<Vec<Template>>;
}

#[async_trait]
pub trait InventoryRepository: Send + Sync {
    async fn insert_inventory(&self, inventory: &Inventory) -> StoreResult<()>;

    async fn inventory(&self, id: InventoryId) -> StoreResult<Option<Inventory>>;

    /// Owned inventories, newest first.
    async fn inventories_owned_by(&self, owner: UserId) -> StoreResult<Vec<Inventory>>;
}

#[async_trait]
pub trait ItemRepository: Send + Sync {
    async fn insert_item(&self, item: &Item) -> StoreResult<()>;

    /// `template` is the inventory's template; stored attribute bags are
    /// re-read against its fields.
    async fn item(&self, inventory: InventoryId, id: ItemId, template: &Template) -> StoreResult<Option<Item>>;

    /// Items of an inventory, newest first.
    async fn items_in(&self, inventory: InventoryId, template: &Template) -> StoreResult<Vec<Item>>;

    async fn count_items(&self, inventory: InventoryId) -> StoreResult<i64>;
}

#[async_trait]
pub trait DiscussionRepository: Send + Sync {
    async fn insert_message(&self, message: &DiscussionMessage) -> StoreResult<()>;

    /// Messages of an inventory in storage order; callers sort for display.
    async fn messages_in(&self, inventory: InventoryId) -> StoreResult<Vec<DiscussionMessage>>;

    async fn count_messages(&self, inventory: InventoryId) -> StoreResult<i64>;

    /// Save or replace; a blank draft clears.
    async fn save_draft(&self, draft: &Draft) -> StoreResult<()>;

    async fn draft(&self, user: UserId, inventory: InventoryId) -> StoreResult<Option<Draft>>;

    async fn clear_draft(&self, user: UserId, inventory: InventoryId) -> StoreResult<()>;
}

#[async_trait]
pub trait LikeRepository: Send + Sync {
    /// Like (`true`) or unlike (`false`); repeating either is a no-op.
    async fn set_template_like(&self, user: UserId, template: TemplateId, liked: bool) -> StoreResult<()>;

    async fn template_like_count(&self, template: TemplateId) -> StoreResult<i64>;

    async fn set_inventory_like(&self, user: UserId, inventory: InventoryId, liked: bool) -> StoreResult<()>;

    async fn inventory_like_count(&self, inventory: InventoryId) -> StoreResult<i64>;
}

#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn stats(&self) -> StoreResult<AdminStats>;

    /// The `limit` most recently created profiles.
    async fn recent_profiles(&self, limit: usize) -> StoreResult<Vec<Profile>>;

    /// Every profile with owned template/inventory counts, newest first.
    async fn user_summaries(&self) -> StoreResult<Vec<UserSummary>>;
}

/// The whole storage boundary behind one object.
pub trait Backend:
    ProfileRepository
    + SessionRepository
    + TemplateRepository
    + InventoryRepository
    + ItemRepository
    + DiscussionRepository
    + LikeRepository
    + AdminRepository
{
}

impl<T> Backend for T where
    T: ProfileRepository
        + SessionRepository
        + TemplateRepository
        + InventoryRepository
        + ItemRepository
        + DiscussionRepository
        + LikeRepository
        + AdminRepository
{
}
