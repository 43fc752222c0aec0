//! Per-inventory discussion threads: history, posting, live push and drafts.
//!
//! Anyone who can read an inventory can take part in its discussion.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event as SseEvent, Sse},
    },
    routing::get,
};
use chrono::Utc;
use tokio_stream::Stream;

use shelfwise_auth::permissions;
use shelfwise_core::{Entity, InventoryId, MessageId, UserId};
use shelfwise_discussions::{
    AuthorSummary, DiscussionEvent, DiscussionMessage, Draft, NewMessage, ThreadEntry, assemble_thread,
};
use shelfwise_events::Topic;

use crate::app::dto::DraftRequest;
use crate::app::errors::ApiError;
use crate::app::routes::common::{CmdAuth, parse_id};
use crate::app::services::{AppServices, topic_sse_stream};
use crate::authz::authorize_command;
use crate::context::UserContext;

pub fn router() -> Router {
    Router::new()
        .route("/:id/discussions", get(list_messages).post(post_message))
        .route("/:id/discussions/stream", get(stream_messages))
        .route(
            "/:id/discussions/draft",
            get(get_draft).put(save_draft).delete(clear_draft),
        )
}

/// GET /inventories/:id/discussions: oldest first, with author display info.
pub async fn list_messages(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ThreadEntry>>, ApiError> {
    let inventory = services.readable_inventory(parse_id(&id)?, user.user_id()).await?;

    let messages = services.backend.messages_in(*inventory.id()).await?;
    let mut author_ids: Vec<UserId> = messages.iter().map(|m| m.author_id()).collect();
    author_ids.sort();
    author_ids.dedup();
    let authors = services.backend.profiles(&author_ids).await?;

    Ok(Json(assemble_thread(messages, &authors)))
}

/// POST /inventories/:id/discussions
///
/// Stores the message, clears the poster's draft and pushes the message to
/// live subscribers. A failed push is reported after the message is stored.
pub async fn post_message(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
    Json(body): Json<NewMessage>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = CmdAuth::new(body, vec![permissions::discussions::POST]);
    authorize_command(&user, &cmd)?;

    let inventory = services.readable_inventory(parse_id(&id)?, user.user_id()).await?;
    let inventory_id = *inventory.id();

    let message = DiscussionMessage::post(MessageId::new(), inventory_id, user.user_id(), cmd.inner, Utc::now())?;
    services.backend.insert_message(&message).await?;
    services.backend.clear_draft(user.user_id(), inventory_id).await?;

    let entry = ThreadEntry::new(&message, AuthorSummary::from_profile(user.profile()));
    services.realtime.publish_discussion(&DiscussionEvent::MessagePosted {
        message: entry.clone(),
    })?;

    tracing::debug!(message_id = %message.id(), %inventory_id, "discussion message posted");
    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /inventories/:id/discussions/stream: SSE push of new messages.
pub async fn stream_messages(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    let inventory = services.readable_inventory(parse_id(&id)?, user.user_id()).await?;
    Ok(topic_sse_stream(&services, Topic::discussions(*inventory.id())))
}

/// GET /inventories/:id/discussions/draft: the caller's draft, or `null`.
pub async fn get_draft(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<Option<Draft>>, ApiError> {
    let inventory_id = readable_id(&services, &user, &id).await?;
    let draft = services.backend.draft(user.user_id(), inventory_id).await?;
    Ok(Json(draft))
}

/// PUT /inventories/:id/discussions/draft
///
/// Saving a blank draft clears it.
pub async fn save_draft(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
    Json(body): Json<DraftRequest>,
) -> Result<Response, ApiError> {
    let inventory_id = readable_id(&services, &user, &id).await?;

    let draft = Draft::new(inventory_id, user.user_id(), body.body, Utc::now())?;
    services.backend.save_draft(&draft).await?;

    if draft.is_blank() {
        Ok(StatusCode::NO_CONTENT.into_response())
    } else {
        Ok(Json(draft).into_response())
    }
}

/// DELETE /inventories/:id/discussions/draft
pub async fn clear_draft(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let inventory_id = readable_id(&services, &user, &id).await?;
    services.backend.clear_draft(user.user_id(), inventory_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn readable_id(services: &AppServices, user: &UserContext, raw: &str) -> Result<InventoryId, ApiError> {
    let inventory = services.readable_inventory(parse_id(raw)?, user.user_id()).await?;
    Ok(*inventory.id())
}
