use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use shelfwise_auth::permissions;
use shelfwise_core::{Entity, InventoryId, TemplateId};
use shelfwise_inventory::{Inventory, NewInventory, Shared};

use crate::app::dto::{InventoryDetail, InventoryListing, LikeState, TemplateRef};
use crate::app::errors::ApiError;
use crate::app::routes::common::{CmdAuth, parse_id};
use crate::app::services::AppServices;
use crate::authz::authorize_command;
use crate::context::UserContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_inventory).get(list_own_inventories))
        .route("/:id", get(get_inventory))
        .route("/:id/like", post(like_inventory).delete(unlike_inventory))
}

/// POST /inventories
///
/// The template must be public or the caller's own, and the submitted custom
/// field values must satisfy it.
pub async fn create_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Json(body): Json<NewInventory>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = CmdAuth::new(body, vec![permissions::inventories::WRITE]);
    authorize_command(&user, &cmd)?;

    let template = services.template(cmd.inner.template_id).await?;
    let inventory = Inventory::create(InventoryId::new(), user.user_id(), cmd.inner, &template, Utc::now())?;
    services.backend.insert_inventory(&inventory).await?;

    tracing::info!(inventory_id = %inventory.id(), template_id = %template.id(), "inventory created");
    Ok((
        StatusCode::CREATED,
        Json(InventoryListing {
            inventory,
            template_name: Some(template.name().to_string()),
        }),
    ))
}

/// GET /inventories: the caller's own inventories, newest first.
pub async fn list_own_inventories(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
) -> Result<Json<Vec<InventoryListing>>, ApiError> {
    let inventories = services.backend.inventories_owned_by(user.user_id()).await?;

    let mut template_names: HashMap<TemplateId, Option<String>> = HashMap::new();
    let mut listings = Vec::with_capacity(inventories.len());
    for inventory in inventories {
        let template_id = inventory.template_id();
        if !template_names.contains_key(&template_id) {
            let name = services
                .backend
                .template(template_id)
                .await?
                .map(|t| t.name().to_string());
            template_names.insert(template_id, name);
        }
        listings.push(InventoryListing {
            template_name: template_names.get(&template_id).cloned().flatten(),
            inventory,
        });
    }

    Ok(Json(listings))
}

/// GET /inventories/:id
pub async fn get_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<InventoryDetail>, ApiError> {
    let inventory = services.readable_inventory(parse_id(&id)?, user.user_id()).await?;
    let template = services.template(inventory.template_id()).await?;
    let inventory_id = *inventory.id();

    let item_count = services.backend.count_items(inventory_id).await?;
    let discussion_count = services.backend.count_messages(inventory_id).await?;
    let like_count = services.backend.inventory_like_count(inventory_id).await?;

    Ok(Json(InventoryDetail {
        can_edit: inventory.can_write(user.user_id()),
        template: TemplateRef {
            id: *template.id(),
            name: template.name().to_string(),
        },
        fields: template.ordered_fields().into_iter().cloned().collect(),
        item_count,
        discussion_count,
        like_count,
        inventory,
    }))
}

/// POST /inventories/:id/like
pub async fn like_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<LikeState>, ApiError> {
    set_like(&services, &user, &id, true).await.map(Json)
}

/// DELETE /inventories/:id/like
pub async fn unlike_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<LikeState>, ApiError> {
    set_like(&services, &user, &id, false).await.map(Json)
}

async fn set_like(services: &AppServices, user: &UserContext, id: &str, liked: bool) -> Result<LikeState, ApiError> {
    let inventory_id: InventoryId = parse_id(id)?;
    authorize_command(user, &CmdAuth::new(inventory_id, vec![permissions::inventories::LIKE]))?;
    services.readable_inventory(inventory_id, user.user_id()).await?;

    services.backend.set_inventory_like(user.user_id(), inventory_id, liked).await?;
    let like_count = services.backend.inventory_like_count(inventory_id).await?;
    Ok(LikeState { liked, like_count })
}
