//! Postgres-backed backend.
//!
//! ## Error mapping
//!
//! | SQLx error                          | code    | StoreError  |
//! |-------------------------------------|---------|-------------|
//! | Database (unique violation)         | `23505` | `Conflict`  |
//! | Database (foreign key violation)    | `23503` | `NotFound`  |
//! | Database (check violation)          | `23514` | `Conflict`  |
//! | Database (other) / pool / network   | any     | `Database`  |
//!
//! Attribute bags are stored as JSONB and re-read against the template's
//! fields, so a row that no longer fits its template surfaces as `Corrupt`.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use shelfwise_auth::{Profile, Role};
use shelfwise_core::{DomainError, Entity, FieldId, InventoryId, ItemId, MessageId, TemplateId, UserId};
use shelfwise_discussions::{DiscussionMessage, Draft};
use shelfwise_inventory::{Inventory, Item, Shared};
use shelfwise_templates::{AttributeBag, FieldDefinition, FieldType, SubmittedValues, Template};

use super::{
    AdminRepository, AdminStats, DiscussionRepository, InventoryRepository, ItemRepository, LikeRepository,
    ProfileRepository, SessionRepository, StoreError, StoreResult, TemplateRepository, UserSummary,
};

const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

#[derive(Debug, Clone)]
pub struct PostgresBackend {
    pool: PgPool,
}

impl PostgresBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Apply the schema. Every statement is idempotent.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    async fn load_templates(&self, rows: Vec<PgRow>) -> StoreResult<Vec<Template>> {
        let ids: Vec<Uuid> = rows
            .iter()
            .map(|r| r.try_get::<Uuid, _>("id"))
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("read_template_ids", e))?;

        let field_rows = sqlx::query(
            r#"
            SELECT id, template_id, name, field_type, options, required, display_order
            FROM template_fields
            WHERE template_id = ANY($1)
            ORDER BY template_id, position
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_template_fields", e))?;

        let mut fields: HashMap<Uuid, Vec<FieldDefinition>> = HashMap::new();
        for row in &field_rows {
            let template_id: Uuid = row.try_get("template_id").map_err(|e| map_sqlx_error("read_field", e))?;
            fields.entry(template_id).or_default().push(field_from_row(row)?);
        }

        rows.iter()
            .map(|row| {
                let id: Uuid = row.try_get("id").map_err(|e| map_sqlx_error("read_template", e))?;
                template_from_row(row, fields.remove(&id).unwrap_or_default())
            })
            .collect()
    }
}

#[async_trait]
impl ProfileRepository for PostgresBackend {
    #[instrument(skip(self, profile, password_hash), fields(user_id = %profile.id), err)]
    async fn insert_profile(&self, profile: &Profile, password_hash: &str) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO profiles (id, email, full_name, role, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(profile.id.as_uuid())
        .bind(&profile.email)
        .bind(&profile.full_name)
        .bind(profile.role.as_str())
        .bind(password_hash)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_profile", e))?;
        Ok(())
    }

    async fn credentials_by_email(&self, email: &str) -> StoreResult<Option<(Profile, String)>> {
        let row = sqlx::query(
            "SELECT id, email, full_name, role, created_at, password_hash FROM profiles WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("credentials_by_email", e))?;

        match row {
            Some(row) => {
                let hash: String = row
                    .try_get("password_hash")
                    .map_err(|e| map_sqlx_error("read_password_hash", e))?;
                Ok(Some((profile_from_row(&row)?, hash)))
            }
            None => Ok(None),
        }
    }

    async fn profile(&self, id: UserId) -> StoreResult<Option<Profile>> {
        sqlx::query("SELECT id, email, full_name, role, created_at FROM profiles WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("profile", e))?
            .as_ref()
            .map(profile_from_row)
            .transpose()
    }

    async fn profiles(&self, ids: &[UserId]) -> StoreResult<HashMap<UserId, Profile>> {
        let ids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows = sqlx::query("SELECT id, email, full_name, role, created_at FROM profiles WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("profiles", e))?;

        rows.iter()
            .map(|row| profile_from_row(row).map(|p| (p.id, p)))
            .collect()
    }
}

#[async_trait]
impl SessionRepository for PostgresBackend {
    async fn revoke_token(&self, jti: Uuid, expires_at: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query("DELETE FROM revoked_tokens WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("prune_revoked_tokens", e))?;

        sqlx::query("INSERT INTO revoked_tokens (jti, expires_at) VALUES ($1, $2) ON CONFLICT (jti) DO NOTHING")
            .bind(jti)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("revoke_token", e))?;
        Ok(())
    }

    async fn is_token_revoked(&self, jti: Uuid) -> StoreResult<bool> {
        let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM revoked_tokens WHERE jti = $1) AS revoked")
            .bind(jti)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("is_token_revoked", e))?;
        row.try_get("revoked").map_err(|e| map_sqlx_error("read_revoked", e))
    }
}

#[async_trait]
impl TemplateRepository for PostgresBackend {
    #[instrument(skip(self, template), fields(template_id = %template.id(), field_count = template.fields().len()), err)]
    async fn insert_template(&self, template: &Template) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO templates (id, owner_id, name, description, is_public, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(template.id().as_uuid())
        .bind(template.owner_id().as_uuid())
        .bind(template.name())
        .bind(template.description())
        .bind(template.is_public())
        .bind(template.created_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_template", e))?;

        for (position, field) in template.fields().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO template_fields
                    (id, template_id, position, name, field_type, options, required, display_order)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(field.id().as_uuid())
            .bind(template.id().as_uuid())
            .bind(position as i32)
            .bind(field.name())
            .bind(field.field_type().as_str())
            .bind(field.options().map(|o| o.to_vec()))
            .bind(field.is_required())
            .bind(field.display_order())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_template_field", e))?;
        }

        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;
        Ok(())
    }

    async fn template(&self, id: TemplateId) -> StoreResult<Option<Template>> {
        let rows = sqlx::query(
            "SELECT id, owner_id, name, description, is_public, created_at FROM templates WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("template", e))?;

        Ok(self.load_templates(rows).await?.into_iter().next())
    }

    async fn templates_owned_by(&self, owner: UserId) -> StoreResult<Vec<Template>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, name, description, is_public, created_at
            FROM templates
            WHERE owner_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("templates_owned_by", e))?;

        self.load_templates(rows).await
    }

    async fn templates_available_to(&self, user: UserId) -> StoreResult<Vec<Template>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, name, description, is_public, created_at
            FROM templates
            WHERE is_public OR owner_id = $1
            ORDER BY name, id
            "#,
        )
        .bind(user.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("templates_available_to", e))?;

        self.load_templates(rows).await
    }

    async fn all_templates(&self) -> StoreResult<Vec<Template>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, name, description, is_public, created_at
            FROM templates
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("all_templates", e))?;

        self.load_templates(rows).await
    }
}

#[async_trait]
impl InventoryRepository for PostgresBackend {
    #[instrument(skip(self, inventory), fields(inventory_id = %inventory.id()), err)]
    async fn insert_inventory(&self, inventory: &Inventory) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO inventories
                (id, owner_id, template_id, name, description, is_public, custom_id, tags, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(inventory.id().as_uuid())
        .bind(inventory.owner_id().as_uuid())
        .bind(inventory.template_id().as_uuid())
        .bind(inventory.name())
        .bind(inventory.description())
        .bind(inventory.is_public())
        .bind(inventory.custom_id())
        .bind(inventory.tags().to_vec())
        .bind(inventory.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_inventory", e))?;
        Ok(())
    }

    async fn inventory(&self, id: InventoryId) -> StoreResult<Option<Inventory>> {
        sqlx::query(
            r#"
            SELECT id, owner_id, template_id, name, description, is_public, custom_id, tags, created_at
            FROM inventories
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("inventory", e))?
        .as_ref()
        .map(inventory_from_row)
        .transpose()
    }

    async fn inventories_owned_by(&self, owner: UserId) -> StoreResult<Vec<Inventory>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, template_id, name, description, is_public, custom_id, tags, created_at
            FROM inventories
            WHERE owner_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("inventories_owned_by", e))?;

        rows.iter().map(inventory_from_row).collect()
    }
}

#[async_trait]
impl ItemRepository for PostgresBackend {
    #[instrument(skip(self, item), fields(item_id = %item.id(), inventory_id = %item.inventory_id()), err)]
    async fn insert_item(&self, item: &Item) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO items (id, inventory_id, name, description, quantity, tags, custom_fields, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(item.id().as_uuid())
        .bind(item.inventory_id().as_uuid())
        .bind(item.name())
        .bind(item.description())
        .bind(item.quantity())
        .bind(item.tags().to_vec())
        .bind(item.attributes().to_json())
        .bind(item.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_item", e))?;
        Ok(())
    }

    async fn item(&self, inventory: InventoryId, id: ItemId, template: &Template) -> StoreResult<Option<Item>> {
        sqlx::query(
            r#"
            SELECT id, inventory_id, name, description, quantity, tags, custom_fields, created_at
            FROM items
            WHERE id = $1 AND inventory_id = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(inventory.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("item", e))?
        .as_ref()
        .map(|row| item_from_row(row, template))
        .transpose()
    }

    async fn items_in(&self, inventory: InventoryId, template: &Template) -> StoreResult<Vec<Item>> {
        let rows = sqlx::query(
            r#"
            SELECT id, inventory_id, name, description, quantity, tags, custom_fields, created_at
            FROM items
            WHERE inventory_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(inventory.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("items_in", e))?;

        rows.iter().map(|row| item_from_row(row, template)).collect()
    }

    async fn count_items(&self, inventory: InventoryId) -> StoreResult<i64> {
        count(&self.pool, "SELECT COUNT(*) AS n FROM items WHERE inventory_id = $1", inventory.as_uuid()).await
    }
}

#[async_trait]
impl DiscussionRepository for PostgresBackend {
    #[instrument(skip(self, message), fields(inventory_id = %message.inventory_id()), err)]
    async fn insert_message(&self, message: &DiscussionMessage) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO discussions (id, inventory_id, author_id, body, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(message.id().as_uuid())
        .bind(message.inventory_id().as_uuid())
        .bind(message.author_id().as_uuid())
        .bind(message.body())
        .bind(message.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_message", e))?;
        Ok(())
    }

    async fn messages_in(&self, inventory: InventoryId) -> StoreResult<Vec<DiscussionMessage>> {
        let rows = sqlx::query(
            r#"
            SELECT id, inventory_id, author_id, body, created_at
            FROM discussions
            WHERE inventory_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(inventory.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("messages_in", e))?;

        rows.iter().map(message_from_row).collect()
    }

    async fn count_messages(&self, inventory: InventoryId) -> StoreResult<i64> {
        count(&self.pool, "SELECT COUNT(*) AS n FROM discussions WHERE inventory_id = $1", inventory.as_uuid()).await
    }

    async fn save_draft(&self, draft: &Draft) -> StoreResult<()> {
        if draft.is_blank() {
            return self.clear_draft(draft.user_id, draft.inventory_id).await;
        }
        sqlx::query(
            r#"
            INSERT INTO discussion_drafts (user_id, inventory_id, body, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, inventory_id)
            DO UPDATE SET body = EXCLUDED.body, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(draft.user_id.as_uuid())
        .bind(draft.inventory_id.as_uuid())
        .bind(&draft.body)
        .bind(draft.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("save_draft", e))?;
        Ok(())
    }

    async fn draft(&self, user: UserId, inventory: InventoryId) -> StoreResult<Option<Draft>> {
        let row = sqlx::query(
            "SELECT body, updated_at FROM discussion_drafts WHERE user_id = $1 AND inventory_id = $2",
        )
        .bind(user.as_uuid())
        .bind(inventory.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("draft", e))?;

        match row {
            Some(row) => Ok(Some(Draft {
                inventory_id: inventory,
                user_id: user,
                body: row.try_get("body").map_err(|e| map_sqlx_error("read_draft", e))?,
                updated_at: row.try_get("updated_at").map_err(|e| map_sqlx_error("read_draft", e))?,
            })),
            None => Ok(None),
        }
    }

    async fn clear_draft(&self, user: UserId, inventory: InventoryId) -> StoreResult<()> {
        sqlx::query("DELETE FROM discussion_drafts WHERE user_id = $1 AND inventory_id = $2")
            .bind(user.as_uuid())
            .bind(inventory.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("clear_draft", e))?;
        Ok(())
    }
}

#[async_trait]
impl LikeRepository for PostgresBackend {
    async fn set_template_like(&self, user: UserId, template: TemplateId, liked: bool) -> StoreResult<()> {
        let sql = if liked {
            "INSERT INTO template_likes (user_id, template_id) VALUES ($1, $2) ON CONFLICT DO NOTHING"
        } else {
            "DELETE FROM template_likes WHERE user_id = $1 AND template_id = $2"
        };
        sqlx::query(sql)
            .bind(user.as_uuid())
            .bind(template.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("set_template_like", e))?;
        Ok(())
    }

    async fn template_like_count(&self, template: TemplateId) -> StoreResult<i64> {
        count(&self.pool, "SELECT COUNT(*) AS n FROM template_likes WHERE template_id = $1", template.as_uuid()).await
    }

    async fn set_inventory_like(&self, user: UserId, inventory: InventoryId, liked: bool) -> StoreResult<()> {
        let sql = if liked {
            "INSERT INTO inventory_likes (user_id, inventory_id) VALUES ($1, $2) ON CONFLICT DO NOTHING"
        } else {
            "DELETE FROM inventory_likes WHERE user_id = $1 AND inventory_id = $2"
        };
        sqlx::query(sql)
            .bind(user.as_uuid())
            .bind(inventory.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("set_inventory_like", e))?;
        Ok(())
    }

    async fn inventory_like_count(&self, inventory: InventoryId) -> StoreResult<i64> {
        count(&self.pool, "SELECT COUNT(*) AS n FROM inventory_likes WHERE inventory_id = $1", inventory.as_uuid()).await
    }
}

#[async_trait]
impl AdminRepository for PostgresBackend {
    async fn stats(&self) -> StoreResult<AdminStats> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM profiles)    AS users,
                (SELECT COUNT(*) FROM templates)   AS templates,
                (SELECT COUNT(*) FROM inventories) AS inventories,
                (SELECT COUNT(*) FROM items)       AS items,
                (SELECT COUNT(*) FROM discussions) AS discussions
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("stats", e))?;

        let get = |col: &str| row.try_get::<i64, _>(col).map_err(|e| map_sqlx_error("read_stats", e));
        Ok(AdminStats {
            users: get("users")?,
            templates: get("templates")?,
            inventories: get("inventories")?,
            items: get("items")?,
            discussions: get("discussions")?,
        })
    }

    async fn recent_profiles(&self, limit: usize) -> StoreResult<Vec<Profile>> {
        let rows = sqlx::query(
            r#"
            SELECT id, email, full_name, role, created_at
            FROM profiles
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("recent_profiles", e))?;

        rows.iter().map(profile_from_row).collect()
    }

    async fn user_summaries(&self) -> StoreResult<Vec<UserSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT
                p.id, p.email, p.full_name, p.role, p.created_at,
                (SELECT COUNT(*) FROM templates t WHERE t.owner_id = p.id)   AS template_count,
                (SELECT COUNT(*) FROM inventories i WHERE i.owner_id = p.id) AS inventory_count
            FROM profiles p
            ORDER BY p.created_at DESC, p.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("user_summaries", e))?;

        rows.iter()
            .map(|row| {
                Ok(UserSummary {
                    profile: profile_from_row(row)?,
                    template_count: row.try_get("template_count").map_err(|e| map_sqlx_error("read_summary", e))?,
                    inventory_count: row.try_get("inventory_count").map_err(|e| map_sqlx_error("read_summary", e))?,
                })
            })
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Row mapping
// ─────────────────────────────────────────────────────────────────────────────

async fn count(pool: &PgPool, sql: &str, id: &Uuid) -> StoreResult<i64> {
    let row = sqlx::query(sql)
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(|e| map_sqlx_error("count", e))?;
    row.try_get("n").map_err(|e| map_sqlx_error("read_count", e))
}

fn col<'r, T>(row: &'r PgRow, name: &str) -> StoreResult<T>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name).map_err(|e| map_sqlx_error("decode_row", e))
}

fn profile_from_row(row: &PgRow) -> StoreResult<Profile> {
    let role: String = col(row, "role")?;
    Ok(Profile {
        id: UserId::from_uuid(col(row, "id")?),
        email: col(row, "email")?,
        full_name: col(row, "full_name")?,
        role: Role::from_str(&role)?,
        created_at: col(row, "created_at")?,
    })
}

fn field_from_row(row: &PgRow) -> StoreResult<FieldDefinition> {
    let field_type: String = col(row, "field_type")?;
    Ok(FieldDefinition::new(
        FieldId::from_uuid(col(row, "id")?),
        TemplateId::from_uuid(col(row, "template_id")?),
        col::<String>(row, "name")?,
        FieldType::from_str(&field_type)?,
        col(row, "options")?,
        col(row, "required")?,
        col(row, "display_order")?,
    )?)
}

fn template_from_row(row: &PgRow, fields: Vec<FieldDefinition>) -> StoreResult<Template> {
    Ok(Template::restore(
        TemplateId::from_uuid(col(row, "id")?),
        UserId::from_uuid(col(row, "owner_id")?),
        col(row, "name")?,
        col(row, "description")?,
        col(row, "is_public")?,
        col(row, "created_at")?,
        fields,
    ))
}

fn inventory_from_row(row: &PgRow) -> StoreResult<Inventory> {
    Ok(Inventory::restore(
        InventoryId::from_uuid(col(row, "id")?),
        UserId::from_uuid(col(row, "owner_id")?),
        TemplateId::from_uuid(col(row, "template_id")?),
        col(row, "name")?,
        col(row, "description")?,
        col(row, "is_public")?,
        col(row, "custom_id")?,
        col(row, "tags")?,
        col(row, "created_at")?,
    ))
}

fn item_from_row(row: &PgRow, template: &Template) -> StoreResult<Item> {
    let stored: JsonValue = col(row, "custom_fields")?;
    let submitted: SubmittedValues = match stored {
        JsonValue::Object(map) => map,
        other => return Err(StoreError::Corrupt(format!("custom_fields is not an object: {other}"))),
    };
    let attributes = AttributeBag::from_submission(template.fields(), &submitted).map_err(DomainError::from)?;

    Ok(Item::restore(
        ItemId::from_uuid(col(row, "id")?),
        InventoryId::from_uuid(col(row, "inventory_id")?),
        col(row, "name")?,
        col(row, "description")?,
        col(row, "quantity")?,
        col(row, "tags")?,
        attributes,
        col(row, "created_at")?,
    ))
}

fn message_from_row(row: &PgRow) -> StoreResult<DiscussionMessage> {
    Ok(DiscussionMessage::restore(
        MessageId::from_uuid(col(row, "id")?),
        InventoryId::from_uuid(col(row, "inventory_id")?),
        UserId::from_uuid(col(row, "author_id")?),
        col(row, "body")?,
        col(row, "created_at")?,
    ))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                Some("23503") => StoreError::NotFound("referenced record"),
                Some("23514") => StoreError::Conflict(msg),
                _ => StoreError::Database(msg),
            }
        }
        sqlx::Error::PoolClosed => StoreError::Database(format!("connection pool closed in {operation}")),
        other => StoreError::Database(format!("{operation}: {other}")),
    }
}
