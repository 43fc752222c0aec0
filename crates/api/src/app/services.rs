//! Service wiring: storage backend, auth provider and realtime hub, plus the
//! lookups most handlers start with.

use std::{convert::Infallible, sync::Arc, time::Duration};

use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use tokio_stream::{Stream, StreamExt, wrappers::BroadcastStream};

use shelfwise_auth::Hs256JwtValidator;
use shelfwise_core::{InventoryId, TemplateId, UserId};
use shelfwise_events::{ChannelMessage, Topic};
use shelfwise_infra::{AppConfig, AuthProvider, Backend, RealtimeHub};
use shelfwise_infra::store::{InMemoryBackend, PostgresBackend};
use shelfwise_inventory::{Inventory, Shared};
use shelfwise_templates::Template;

use crate::app::errors::ApiError;

pub const SSE_KEEP_ALIVE: Duration = Duration::from_secs(15);

#[derive(Clone)]
pub struct AppServices {
    pub backend: Arc<dyn Backend>,
    pub auth: Arc<AuthProvider>,
    pub realtime: RealtimeHub,
}

impl AppServices {
    /// Wire services from configuration. Persistent mode connects to Postgres
    /// and applies the schema before serving.
    pub async fn build(config: &AppConfig) -> anyhow::Result<Self> {
        let backend: Arc<dyn Backend> = match (&config.database_url, config.use_persistent_stores) {
            (Some(url), true) => {
                let pg = PostgresBackend::connect(url, config.database_max_connections).await?;
                pg.migrate().await?;
                tracing::info!("using Postgres backend");
                Arc::new(pg)
            }
            _ => {
                tracing::info!("using in-memory backend");
                Arc::new(InMemoryBackend::new())
            }
        };

        Ok(Self::with_backend(backend, config))
    }

    pub fn with_backend(backend: Arc<dyn Backend>, config: &AppConfig) -> Self {
        let auth = AuthProvider::new(
            backend.clone(),
            Hs256JwtValidator::new(config.jwt_secret.as_bytes()),
            config.token_ttl(),
            config.admin_emails.iter().cloned(),
        );

        Self {
            backend,
            auth: Arc::new(auth),
            realtime: RealtimeHub::start(config.realtime_capacity),
        }
    }

    pub async fn template(&self, id: TemplateId) -> Result<Template, ApiError> {
        self.backend
            .template(id)
            .await?
            .ok_or_else(|| ApiError::not_found("template"))
    }

    pub async fn inventory(&self, id: InventoryId) -> Result<Inventory, ApiError> {
        self.backend
            .inventory(id)
            .await?
            .ok_or_else(|| ApiError::not_found("inventory"))
    }

    /// An inventory the viewer may read: public, or their own.
    pub async fn readable_inventory(&self, id: InventoryId, viewer: UserId) -> Result<Inventory, ApiError> {
        let inventory = self.inventory(id).await?;
        inventory.ensure_readable(viewer)?;
        Ok(inventory)
    }

    /// An inventory the viewer may modify: their own.
    pub async fn writable_inventory(&self, id: InventoryId, viewer: UserId) -> Result<Inventory, ApiError> {
        let inventory = self.inventory(id).await?;
        inventory.ensure_writable(viewer)?;
        Ok(inventory)
    }

    /// A template the viewer may see: public, or their own.
    pub async fn visible_template(&self, id: TemplateId, viewer: UserId) -> Result<Template, ApiError> {
        let template = self.template(id).await?;
        if !template.is_usable_by(viewer) {
            return Err(ApiError::Forbidden("this template is private".to_string()));
        }
        Ok(template)
    }
}

/// SSE stream of the realtime messages published on `topic`.
///
/// Each message goes out as an SSE event named after its event type, with the
/// event payload as data. Messages dropped because the subscriber lagged are
/// skipped.
pub fn topic_sse_stream(
    services: &AppServices,
    topic: Topic,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>> + use<>> {
    let rx = services.realtime.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(move |msg| match msg {
        Ok(m) if m.topic() == topic => Some(Ok(to_sse_event(&m))),
        _ => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(SSE_KEEP_ALIVE))
}

pub fn to_sse_event(msg: &ChannelMessage) -> SseEvent {
    let data = serde_json::to_string(msg.payload()).unwrap_or_else(|_| "{}".to_string());
    SseEvent::default()
        .event(msg.event_type())
        .id(msg.event_id().to_string())
        .data(data)
}
