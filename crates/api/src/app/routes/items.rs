use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;

use shelfwise_auth::permissions;
use shelfwise_core::{Entity, ItemId};
use shelfwise_inventory::{Item, NewItem};

use crate::app::dto::{ItemDetail, ItemListing};
use crate::app::errors::ApiError;
use crate::app::routes::common::{CmdAuth, parse_id};
use crate::app::services::AppServices;
use crate::authz::authorize_command;
use crate::context::UserContext;

pub fn router() -> Router {
    Router::new()
        .route("/:id/items", get(list_items).post(create_item))
        .route("/:id/items/:item_id", get(get_item))
}

/// POST /inventories/:id/items
///
/// Only the inventory owner adds items. Custom fields are checked for
/// required values and then coerced to the template's field types.
pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
    Json(body): Json<NewItem>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = CmdAuth::new(body, vec![permissions::inventories::WRITE]);
    authorize_command(&user, &cmd)?;

    let inventory = services.writable_inventory(parse_id(&id)?, user.user_id()).await?;
    let template = services.template(inventory.template_id()).await?;

    let item = Item::create(ItemId::new(), &inventory, &template, cmd.inner, Utc::now())?;
    services.backend.insert_item(&item).await?;

    tracing::info!(item_id = %item.id(), inventory_id = %inventory.id(), "item created");
    Ok((StatusCode::CREATED, Json(ItemDetail::new(&template, item))))
}

/// GET /inventories/:id/items: newest first.
pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<ItemListing>, ApiError> {
    let inventory = services.readable_inventory(parse_id(&id)?, user.user_id()).await?;
    let template = services.template(inventory.template_id()).await?;

    let items = services.backend.items_in(*inventory.id(), &template).await?;
    Ok(Json(ItemListing::new(&template, items)))
}

/// GET /inventories/:id/items/:item_id
pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path((id, item_id)): Path<(String, String)>,
) -> Result<Json<ItemDetail>, ApiError> {
    let inventory = services.readable_inventory(parse_id(&id)?, user.user_id()).await?;
    let item_id: ItemId = parse_id(&item_id)?;
    let template = services.template(inventory.template_id()).await?;

    let item = services
        .backend
        .item(*inventory.id(), item_id, &template)
        .await?
        .ok_or_else(|| ApiError::not_found("item"))?;
    Ok(Json(ItemDetail::new(&template, item)))
}
