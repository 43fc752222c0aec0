use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::{Event, Topic};

/// Envelope for a realtime event on its way to subscribers.
///
/// The payload is stored as JSON so one bus can carry every event type;
/// subscribers filter on `topic` and forward `payload` as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMessage {
    event_id: Uuid,
    topic: Topic,
    event_type: String,
    occurred_at: DateTime<Utc>,
    payload: JsonValue,
}

impl ChannelMessage {
    pub fn new(
        topic: Topic,
        event_type: impl Into<String>,
        occurred_at: DateTime<Utc>,
        payload: JsonValue,
    ) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            topic,
            event_type: event_type.into(),
            occurred_at,
            payload,
        }
    }

    /// Wrap a typed event for publication on `topic`.
    pub fn from_event<E>(topic: Topic, event: &E) -> Result<Self, serde_json::Error>
    where
        E: Event + Serialize,
    {
        Ok(Self::new(
            topic,
            event.event_type(),
            event.occurred_at(),
            serde_json::to_value(event)?,
        ))
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn payload(&self) -> &JsonValue {
        &self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelfwise_core::InventoryId;

    #[derive(Debug, Clone, Serialize)]
    struct Pinged {
        at: DateTime<Utc>,
        note: String,
    }

    impl Event for Pinged {
        fn event_type(&self) -> &'static str {
            "test.pinged"
        }

        fn occurred_at(&self) -> DateTime<Utc> {
            self.at
        }
    }

    #[test]
    fn from_event_copies_metadata_and_serializes_payload() {
        let at = Utc::now();
        let topic = Topic::discussions(InventoryId::new());
        let msg = ChannelMessage::from_event(topic, &Pinged { at, note: "hi".into() }).unwrap();

        assert_eq!(msg.topic(), topic);
        assert_eq!(msg.event_type(), "test.pinged");
        assert_eq!(msg.occurred_at(), at);
        assert_eq!(msg.payload()["note"], "hi");
    }
}
