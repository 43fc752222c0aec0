//! In-memory backend for tests/dev.

use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use shelfwise_auth::Profile;
use shelfwise_core::{Entity, InventoryId, ItemId, TemplateId, UserId};
use shelfwise_discussions::{DiscussionMessage, Draft, DraftBook};
use shelfwise_inventory::{Inventory, Item, Shared};
use shelfwise_templates::Template;

use super::{
    AdminRepository, AdminStats, DiscussionRepository, InventoryRepository, ItemRepository, LikeRepository,
    ProfileRepository, SessionRepository, StoreError, StoreResult, TemplateRepository, UserSummary,
};

#[derive(Debug, Default)]
struct State {
    profiles: HashMap<UserId, (Profile, String)>,
    revoked_tokens: HashMap<Uuid, DateTime<Utc>>,
    templates: HashMap<TemplateId, Template>,
    inventories: HashMap<InventoryId, Inventory>,
    items: HashMap<ItemId, Item>,
    messages: Vec<DiscussionMessage>,
    drafts: DraftBook,
    template_likes: HashSet<(UserId, TemplateId)>,
    inventory_likes: HashSet<(UserId, InventoryId)>,
}

/// Everything in one lock-guarded struct. Writes are whole-request atomic.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    state: RwLock<State>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        self.state.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        self.state.write().map_err(|_| StoreError::Poisoned)
    }
}

fn newest_first<T, K: Ord>(rows: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, K)) {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl ProfileRepository for InMemoryBackend {
    async fn insert_profile(&self, profile: &Profile, password_hash: &str) -> StoreResult<()> {
        let mut state = self.write()?;
        if state.profiles.values().any(|(p, _)| p.email == profile.email) {
            return Err(StoreError::Conflict("email already registered".to_string()));
        }
        if state.profiles.contains_key(&profile.id) {
            return Err(StoreError::Conflict(format!("profile {} already exists", profile.id)));
        }
        state
            .profiles
            .insert(profile.id, (profile.clone(), password_hash.to_string()));
        Ok(())
    }

    async fn credentials_by_email(&self, email: &str) -> StoreResult<Option<(Profile, String)>> {
        let state = self.read()?;
        Ok(state.profiles.values().find(|(p, _)| p.email == email).cloned())
    }

    async fn profile(&self, id: UserId) -> StoreResult<Option<Profile>> {
        Ok(self.read()?.profiles.get(&id).map(|(p, _)| p.clone()))
    }

    async fn profiles(&self, ids: &[UserId]) -> StoreResult<HashMap<UserId, Profile>> {
        let state = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.profiles.get(id).map(|(p, _)| (*id, p.clone())))
            .collect())
    }
}

#[async_trait]
impl SessionRepository for InMemoryBackend {
    async fn revoke_token(&self, jti: Uuid, expires_at: DateTime<Utc>) -> StoreResult<()> {
        let mut state = self.write()?;
        let now = Utc::now();
        state.revoked_tokens.retain(|_, exp| *exp > now);
        state.revoked_tokens.insert(jti, expires_at);
        Ok(())
    }

    async fn is_token_revoked(&self, jti: Uuid) -> StoreResult<bool> {
        Ok(self.read()?.revoked_tokens.contains_key(&jti))
    }
}

#[async_trait]
impl TemplateRepository for InMemoryBackend {
    async fn insert_template(&self, template: &Template) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.profiles.contains_key(&template.owner_id()) {
            return Err(StoreError::NotFound("owner profile"));
        }
        if state.templates.contains_key(template.id()) {
            return Err(StoreError::Conflict(format!("template {} already exists", template.id())));
        }
        state.templates.insert(*template.id(), template.clone());
        Ok(())
    }

    async fn template(&self, id: TemplateId) -> StoreResult<Option<Template>> {
        Ok(self.read()?.templates.get(&id).cloned())
    }

    async fn templates_owned_by(&self, owner: UserId) -> StoreResult<Vec<Template>> {
        let state = self.read()?;
        let mut rows: Vec<Template> = state
            .templates
            .values()
            .filter(|t| t.owner_id() == owner)
            .cloned()
            .collect();
        newest_first(&mut rows, |t| (t.created_at(), *t.id()));
        Ok(rows)
    }

    async fn templates_available_to(&self, user: UserId) -> StoreResult<Vec<Template>> {
        let state = self.read()?;
        let mut rows: Vec<Template> = state
            .templates
            .values()
            .filter(|t| t.is_usable_by(user))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.id().cmp(b.id())));
        Ok(rows)
    }

    async fn all_templates(&self) -> StoreResult<Vec<Template>> {
        let state = self.read()?;
        let mut rows: Vec<Template> = state.templates.values().cloned().collect();
        newest_first(&mut rows, |t| (t.created_at(), *t.id()));
        Ok(rows)
    }
}

#[async_trait]
impl InventoryRepository for InMemoryBackend {
    async fn insert_inventory(&self, inventory: &Inventory) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.templates.contains_key(&inventory.template_id()) {
            return Err(StoreError::NotFound("template"));
        }
        if state.inventories.contains_key(inventory.id()) {
            return Err(StoreError::Conflict(format!("inventory {} already exists", inventory.id())));
        }
        state.inventories.insert(*inventory.id(), inventory.clone());
        Ok(())
    }

    async fn inventory(&self, id: InventoryId) -> StoreResult<Option<Inventory>> {
        Ok(self.read()?.inventories.get(&id).cloned())
    }

    async fn inventories_owned_by(&self, owner: UserId) -> StoreResult<Vec<Inventory>> {
        let state = self.read()?;
        let mut rows: Vec<Inventory> = state
            .inventories
            .values()
            .filter(|i| i.owner_id() == owner)
            .cloned()
            .collect();
        newest_first(&mut rows, |i| (i.created_at(), *i.id()));
        Ok(rows)
    }
}

#[async_trait]
impl ItemRepository for InMemoryBackend {
    async fn insert_item(&self, item: &Item) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.inventories.contains_key(&item.inventory_id()) {
            return Err(StoreError::NotFound("inventory"));
        }
        if state.items.contains_key(item.id()) {
            return Err(StoreError::Conflict(format!("item {} already exists", item.id())));
        }
        state.items.insert(*item.id(), item.clone());
        Ok(())
    }

    async fn item(&self, inventory: InventoryId, id: ItemId, _template: &Template) -> StoreResult<Option<Item>> {
        Ok(self
            .read()?
            .items
            .get(&id)
            .filter(|i| i.inventory_id() == inventory)
            .cloned())
    }

    async fn items_in(&self, inventory: InventoryId, _template: &Template) -> StoreResult<Vec<Item>> {
        let state = self.read()?;
        let mut rows: Vec<Item> = state
            .items
            .values()
            .filter(|i| i.inventory_id() == inventory)
            .cloned()
            .collect();
        newest_first(&mut rows, |i| (i.created_at(), *i.id()));
        Ok(rows)
    }

    async fn count_items(&self, inventory: InventoryId) -> StoreResult<i64> {
        let state = self.read()?;
        Ok(state.items.values().filter(|i| i.inventory_id() == inventory).count() as i64)
    }
}

#[async_trait]
impl DiscussionRepository for InMemoryBackend {
    async fn insert_message(&self, message: &DiscussionMessage) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.inventories.contains_key(&message.inventory_id()) {
            return Err(StoreError::NotFound("inventory"));
        }
        state.messages.push(message.clone());
        Ok(())
    }

    async fn messages_in(&self, inventory: InventoryId) -> StoreResult<Vec<DiscussionMessage>> {
        let state = self.read()?;
        Ok(state
            .messages
            .iter()
            .filter(|m| m.inventory_id() == inventory)
            .cloned()
            .collect())
    }

    async fn count_messages(&self, inventory: InventoryId) -> StoreResult<i64> {
        let state = self.read()?;
        Ok(state.messages.iter().filter(|m| m.inventory_id() == inventory).count() as i64)
    }

    async fn save_draft(&self, draft: &Draft) -> StoreResult<()> {
        self.write()?.drafts.save(draft.clone());
        Ok(())
    }

    async fn draft(&self, user: UserId, inventory: InventoryId) -> StoreResult<Option<Draft>> {
        Ok(self.read()?.drafts.get(user, inventory).cloned())
    }

    async fn clear_draft(&self, user: UserId, inventory: InventoryId) -> StoreResult<()> {
        self.write()?.drafts.clear(user, inventory);
        Ok(())
    }
}

#[async_trait]
impl LikeRepository for InMemoryBackend {
    async fn set_template_like(&self, user: UserId, template: TemplateId, liked: bool) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.templates.contains_key(&template) {
            return Err(StoreError::NotFound("template"));
        }
        if liked {
            state.template_likes.insert((user, template));
        } else {
            state.template_likes.remove(&(user, template));
        }
        Ok(())
    }

    async fn template_like_count(&self, template: TemplateId) -> StoreResult<i64> {
        let state = self.read()?;
        Ok(state.template_likes.iter().filter(|(_, t)| *t == template).count() as i64)
    }

    async fn set_inventory_like(&self, user: UserId, inventory: InventoryId, liked: bool) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.inventories.contains_key(&inventory) {
            return Err(StoreError::NotFound("inventory"));
        }
        if liked {
            state.inventory_likes.insert((user, inventory));
        } else {
            state.inventory_likes.remove(&(user, inventory));
        }
        Ok(())
    }

    async fn inventory_like_count(&self, inventory: InventoryId) -> StoreResult<i64> {
        let state = self.read()?;
        Ok(state.inventory_likes.iter().filter(|(_, i)| *i == inventory).count() as i64)
    }
}

#[async_trait]
impl AdminRepository for InMemoryBackend {
    async fn stats(&self) -> StoreResult<AdminStats> {
        let state = self.read()?;
        Ok(AdminStats {
            users: state.profiles.len() as i64,
            templates: state.templates.len() as i64,
            inventories: state.inventories.len() as i64,
            items: state.items.len() as i64,
            discussions: state.messages.len() as i64,
        })
    }

    async fn recent_profiles(&self, limit: usize) -> StoreResult<Vec<Profile>> {
        let state = self.read()?;
        let mut rows: Vec<Profile> = state.profiles.values().map(|(p, _)| p.clone()).collect();
        newest_first(&mut rows, |p| (p.created_at, p.id));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn user_summaries(&self) -> StoreResult<Vec<UserSummary>> {
        let state = self.read()?;
        let mut rows: Vec<UserSummary> = state
            .profiles
            .values()
            .map(|(p, _)| UserSummary {
                profile: p.clone(),
                template_count: state.templates.values().filter(|t| t.owner_id() == p.id).count() as i64,
                inventory_count: state.inventories.values().filter(|i| i.owner_id() == p.id).count() as i64,
            })
            .collect();
        newest_first(&mut rows, |s| (s.profile.created_at, s.profile.id));
        Ok(rows)
    }
}
