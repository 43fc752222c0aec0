use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    response::sse::{Event as SseEvent, KeepAlive, Sse},
    routing::get,
};
use chrono::Utc;
use tokio_stream::{Stream, StreamExt, wrappers::BroadcastStream};

use shelfwise_core::Entity;
use shelfwise_discussions::Viewer;
use shelfwise_events::Topic;
use shelfwise_infra::presence_subject;

use crate::app::errors::ApiError;
use crate::app::routes::common::parse_id;
use crate::app::services::{AppServices, SSE_KEEP_ALIVE, to_sse_event};
use crate::context::UserContext;

pub fn router() -> Router {
    Router::new()
        .route("/:id/presence", get(list_viewers))
        .route("/:id/presence/stream", get(stream_presence))
}

/// GET /inventories/:id/presence: who else is looking right now.
pub async fn list_viewers(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Viewer>>, ApiError> {
    let inventory = services.readable_inventory(parse_id(&id)?, user.user_id()).await?;
    let viewers = services.realtime.others(*inventory.id(), user.user_id())?;
    Ok(Json(viewers))
}

/// GET /inventories/:id/presence/stream
///
/// The caller counts as viewing the inventory while this stream is open.
/// The first event is a `presence.sync` listing the other viewers, followed
/// by `presence.join` / `presence.leave` as others come and go. The caller's
/// own joins and leaves are not echoed back.
pub async fn stream_presence(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    let inventory = services.readable_inventory(parse_id(&id)?, user.user_id()).await?;
    let inventory_id = *inventory.id();
    let me = user.user_id();
    let topic = Topic::presence(inventory_id);

    // Subscribe before joining so no delta between the two is lost.
    let rx = services.realtime.subscribe();
    let (guard, sync) = services.realtime.join_presence(
        inventory_id,
        me,
        user.profile().display_name(),
        Utc::now(),
    )?;

    let initial = tokio_stream::once(Ok::<_, Infallible>(to_sse_event(&sync)));
    let updates = BroadcastStream::new(rx).filter_map(move |msg| {
        // Dropped together with the stream when the client disconnects.
        let _connection = &guard;
        match msg {
            Ok(m) if m.topic() == topic && presence_subject(&m) != Some(me) => Some(Ok(to_sse_event(&m))),
            _ => None,
        }
    });

    Ok(Sse::new(initial.chain(updates)).keep_alive(KeepAlive::new().interval(SSE_KEEP_ALIVE)))
}
