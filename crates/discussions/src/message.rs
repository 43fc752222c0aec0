use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shelfwise_core::{DomainError, DomainResult, Entity, InventoryId, MessageId, UserId};

/// Longest accepted message body, in characters.
pub const MAX_MESSAGE_LENGTH: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    pub body: String,
}

/// One message in an inventory's thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscussionMessage {
    id: MessageId,
    inventory_id: InventoryId,
    author_id: UserId,
    body: String,
    created_at: DateTime<Utc>,
}

impl DiscussionMessage {
    /// Validate and build a message. The body is trimmed first.
    ///
    /// Whether `author` may post to this inventory is decided by the caller.
    pub fn post(
        id: MessageId,
        inventory_id: InventoryId,
        author_id: UserId,
        draft: NewMessage,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let body = draft.body.trim();
        if body.is_empty() {
            return Err(DomainError::field("body", "Message cannot be empty"));
        }
        if body.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(DomainError::field(
                "body",
                format!("Message cannot exceed {MAX_MESSAGE_LENGTH} characters"),
            ));
        }

        Ok(Self {
            id,
            inventory_id,
            author_id,
            body: body.to_string(),
            created_at,
        })
    }

    pub fn restore(
        id: MessageId,
        inventory_id: InventoryId,
        author_id: UserId,
        body: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            inventory_id,
            author_id,
            body,
            created_at,
        }
    }

    pub fn inventory_id(&self) -> InventoryId {
        self.inventory_id
    }

    pub fn author_id(&self) -> UserId {
        self.author_id
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for DiscussionMessage {
    type Id = MessageId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
