//! Realtime delivery for discussion threads and presence.
//!
//! Publishers push [`ChannelMessage`]s onto an in-process event bus. A
//! blocking forwarder drains the bus into a tokio broadcast channel that
//! SSE handlers subscribe to and filter by topic.
//!
//! Presence is connection-scoped: [`RealtimeHub::join_presence`] registers a
//! connection and hands back a [`PresenceGuard`]; dropping the guard (the
//! stream closed) unregisters it and announces the leave.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use shelfwise_core::{InventoryId, UserId};
use shelfwise_discussions::{DiscussionEvent, PresenceEvent, PresenceRoster, Viewer};
use shelfwise_events::{ChannelMessage, EventBus, InMemoryBusError, InMemoryEventBus};

#[derive(Debug, Error)]
pub enum RealtimeError {
    #[error("publish failed: {0}")]
    Publish(#[from] InMemoryBusError),

    #[error("event serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("presence roster lock poisoned")]
    Poisoned,
}

struct HubInner {
    bus: InMemoryEventBus<ChannelMessage>,
    tx: broadcast::Sender<ChannelMessage>,
    roster: Mutex<PresenceRoster>,
}

#[derive(Clone)]
pub struct RealtimeHub {
    inner: Arc<HubInner>,
}

impl RealtimeHub {
    /// Create the hub and its forwarder. Must run inside a tokio runtime.
    ///
    /// Slow subscribers that fall more than `capacity` messages behind lose
    /// the oldest ones.
    pub fn start(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        let inner = Arc::new(HubInner {
            bus: InMemoryEventBus::new(),
            tx: tx.clone(),
            roster: Mutex::new(PresenceRoster::new()),
        });

        let sub = inner.bus.subscribe();
        tokio::task::spawn_blocking(move || {
            // Ends once the hub (and with it the bus) is dropped.
            while let Ok(msg) = sub.recv() {
                debug!(topic = %msg.topic(), event_type = msg.event_type(), "forwarding realtime message");
                // No receivers is fine; nobody is watching that topic right now.
                let _ = tx.send(msg);
            }
        });

        Self { inner }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChannelMessage> {
        self.inner.tx.subscribe()
    }

    pub fn publish_discussion(&self, event: &DiscussionEvent) -> Result<(), RealtimeError> {
        let msg = ChannelMessage::from_event(event.topic(), event)?;
        self.inner.bus.publish(msg)?;
        Ok(())
    }

    /// Register a presence connection.
    ///
    /// Announces a join to other viewers when this is the user's first
    /// connection, and returns the guard plus a `presence.sync` message
    /// listing everyone else already viewing the inventory.
    pub fn join_presence(
        &self,
        inventory_id: InventoryId,
        user_id: UserId,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<(PresenceGuard, ChannelMessage), RealtimeError> {
        let (joined, viewers) = {
            let mut roster = self.inner.roster.lock().map_err(|_| RealtimeError::Poisoned)?;
            let joined = roster.join(inventory_id, user_id, display_name, now);
            (joined, roster.others(inventory_id, user_id))
        };
        let guard = PresenceGuard {
            hub: self.clone(),
            inventory_id,
            user_id,
        };

        if let Some(viewer) = joined {
            self.inner.publish_presence(&PresenceEvent::Join {
                inventory_id,
                viewer,
                at: now,
            })?;
        }

        let sync = PresenceEvent::Sync {
            inventory_id,
            viewers,
            at: now,
        };
        Ok((guard, ChannelMessage::from_event(sync.topic(), &sync)?))
    }

    /// Viewers of an inventory other than `requester`.
    pub fn others(&self, inventory_id: InventoryId, requester: UserId) -> Result<Vec<Viewer>, RealtimeError> {
        let roster = self.inner.roster.lock().map_err(|_| RealtimeError::Poisoned)?;
        Ok(roster.others(inventory_id, requester))
    }
}

/// The user a `presence.join` / `presence.leave` message is about.
///
/// `None` for any other message, including `presence.sync`.
pub fn presence_subject(msg: &ChannelMessage) -> Option<UserId> {
    match serde_json::from_value::<PresenceEvent>(msg.payload().clone()).ok()? {
        PresenceEvent::Join { viewer, .. } | PresenceEvent::Leave { viewer, .. } => Some(viewer.user_id),
        PresenceEvent::Sync { .. } => None,
    }
}

impl HubInner {
    fn publish_presence(&self, event: &PresenceEvent) -> Result<(), RealtimeError> {
        let msg = ChannelMessage::from_event(event.topic(), event)?;
        self.bus.publish(msg)?;
        Ok(())
    }
}

impl core::fmt::Debug for RealtimeHub {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RealtimeHub")
            .field("receivers", &self.inner.tx.receiver_count())
            .finish_non_exhaustive()
    }
}

/// One open presence connection. Leaves on drop.
pub struct PresenceGuard {
    hub: RealtimeHub,
    inventory_id: InventoryId,
    user_id: UserId,
}

impl PresenceGuard {
    pub fn inventory_id(&self) -> InventoryId {
        self.inventory_id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}

impl Drop for PresenceGuard {
    fn drop(&mut self) {
        let left = match self.hub.inner.roster.lock() {
            Ok(mut roster) => roster.leave(self.inventory_id, self.user_id),
            Err(_) => {
                warn!(inventory_id = %self.inventory_id, "presence roster poisoned; leave not recorded");
                return;
            }
        };

        if let Some(viewer) = left {
            let event = PresenceEvent::Leave {
                inventory_id: self.inventory_id,
                viewer,
                at: Utc::now(),
            };
            if let Err(e) = self.hub.inner.publish_presence(&event) {
                warn!(error = %e, inventory_id = %self.inventory_id, "failed to announce presence leave");
            }
        }
    }
}

impl core::fmt::Debug for PresenceGuard {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PresenceGuard")
            .field("inventory_id", &self.inventory_id)
            .field("user_id", &self.user_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use shelfwise_core::MessageId;
    use shelfwise_discussions::{AuthorSummary, ThreadEntry};
    use shelfwise_events::Topic;

    async fn next(rx: &mut broadcast::Receiver<ChannelMessage>) -> ChannelMessage {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for a realtime message")
            .expect("channel closed")
    }

    #[tokio::test]
    async fn discussion_posts_reach_subscribers_on_their_topic() {
        let hub = RealtimeHub::start(16);
        let mut rx = hub.subscribe();
        let inventory_id = InventoryId::new();
        let author = UserId::new();

        let event = DiscussionEvent::MessagePosted {
            message: ThreadEntry {
                id: MessageId::new(),
                inventory_id,
                body: "anyone seen the label maker?".to_string(),
                created_at: Utc::now(),
                author: AuthorSummary::unknown(author),
            },
        };
        hub.publish_discussion(&event).unwrap();

        let msg = next(&mut rx).await;
        assert_eq!(msg.topic(), Topic::discussions(inventory_id));
        assert_eq!(msg.event_type(), "discussion.message_posted");
        assert_eq!(msg.payload()["message"]["body"], "anyone seen the label maker?");
    }

    #[tokio::test]
    async fn first_connection_joins_and_last_one_leaves() {
        let hub = RealtimeHub::start(16);
        let mut rx = hub.subscribe();
        let inventory_id = InventoryId::new();
        let ada = UserId::new();
        let now = Utc::now();

        let (first, sync) = hub.join_presence(inventory_id, ada, "Ada", now).unwrap();
        assert_eq!(sync.event_type(), "presence.sync");
        let joined = next(&mut rx).await;
        assert_eq!(joined.event_type(), "presence.join");
        assert_eq!(presence_subject(&joined), Some(ada));

        // A second tab neither joins nor leaves.
        let (second, _) = hub.join_presence(inventory_id, ada, "Ada", now).unwrap();
        drop(second);
        assert!(rx.try_recv().is_err());

        drop(first);
        let left = next(&mut rx).await;
        assert_eq!(left.event_type(), "presence.leave");
        assert_eq!(left.topic(), Topic::presence(inventory_id));
        assert_eq!(presence_subject(&left), Some(ada));
        assert!(hub.others(inventory_id, UserId::new()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn others_excludes_the_requester() {
        let hub = RealtimeHub::start(16);
        let inventory_id = InventoryId::new();
        let (ada, bob) = (UserId::new(), UserId::new());
        let now = Utc::now();

        let _a = hub.join_presence(inventory_id, ada, "Ada", now).unwrap();
        let _b = hub.join_presence(inventory_id, bob, "Bob", now).unwrap();

        let others = hub.others(inventory_id, ada).unwrap();
        assert_eq!(others.len(), 1);
        assert_eq!(others[0].display_name, "Bob");
    }

    #[tokio::test]
    async fn sync_lists_only_the_other_viewers() {
        let hub = RealtimeHub::start(16);
        let inventory_id = InventoryId::new();
        let (ada, bob) = (UserId::new(), UserId::new());
        let now = Utc::now();

        let (_a, alone) = hub.join_presence(inventory_id, ada, "Ada", now).unwrap();
        assert_eq!(alone.payload()["viewers"], serde_json::json!([]));
        assert_eq!(presence_subject(&alone), None);

        let (_b, sync) = hub.join_presence(inventory_id, bob, "Bob", now).unwrap();
        let viewers = sync.payload()["viewers"].as_array().unwrap().clone();
        assert_eq!(viewers.len(), 1);
        assert_eq!(viewers[0]["display_name"], "Ada");
        assert_eq!(viewers[0]["user_id"], ada.to_string());
    }
}
