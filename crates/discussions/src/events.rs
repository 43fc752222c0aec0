use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shelfwise_core::InventoryId;
use shelfwise_events::{Event, Topic};

use crate::{ThreadEntry, Viewer};

/// Pushed on `discussions:{inventory_id}` for every new message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiscussionEvent {
    MessagePosted { message: ThreadEntry },
}

impl DiscussionEvent {
    pub fn topic(&self) -> Topic {
        match self {
            DiscussionEvent::MessagePosted { message } => Topic::discussions(message.inventory_id),
        }
    }
}

impl Event for DiscussionEvent {
    fn event_type(&self) -> &'static str {
        match self {
            DiscussionEvent::MessagePosted { .. } => "discussion.message_posted",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            DiscussionEvent::MessagePosted { message } => message.created_at,
        }
    }
}

/// Pushed on `presence:{inventory_id}` when viewers come and go.
///
/// `Sync` carries the full roster and is sent to a viewer right after they
/// join; `Join`/`Leave` are deltas for everyone else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PresenceEvent {
    Join {
        inventory_id: InventoryId,
        viewer: Viewer,
        at: DateTime<Utc>,
    },
    Leave {
        inventory_id: InventoryId,
        viewer: Viewer,
        at: DateTime<Utc>,
    },
    Sync {
        inventory_id: InventoryId,
        viewers: Vec<Viewer>,
        at: DateTime<Utc>,
    },
}

impl PresenceEvent {
    pub fn inventory_id(&self) -> InventoryId {
        match self {
            PresenceEvent::Join { inventory_id, .. }
            | PresenceEvent::Leave { inventory_id, .. }
            | PresenceEvent::Sync { inventory_id, .. } => *inventory_id,
        }
    }

    pub fn topic(&self) -> Topic {
        Topic::presence(self.inventory_id())
    }
}

impl Event for PresenceEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PresenceEvent::Join { .. } => "presence.join",
            PresenceEvent::Leave { .. } => "presence.leave",
            PresenceEvent::Sync { .. } => "presence.sync",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            PresenceEvent::Join { at, .. } | PresenceEvent::Leave { at, .. } | PresenceEvent::Sync { at, .. } => *at,
        }
    }
}
