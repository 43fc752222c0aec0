use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shelfwise_core::{DomainError, DomainResult, InventoryId, UserId};

use crate::MAX_MESSAGE_LENGTH;

/// An unsent message, one per (user, inventory).
///
/// Stored verbatim (not trimmed) so the text box comes back as the user left
/// it. Cleared after a successful post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub inventory_id: InventoryId,
    pub user_id: UserId,
    pub body: String,
    pub updated_at: DateTime<Utc>,
}

impl Draft {
    pub fn new(
        inventory_id: InventoryId,
        user_id: UserId,
        body: impl Into<String>,
        updated_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let body = body.into();
        if body.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(DomainError::field(
                "body",
                format!("Message cannot exceed {MAX_MESSAGE_LENGTH} characters"),
            ));
        }
        Ok(Self {
            inventory_id,
            user_id,
            body,
            updated_at,
        })
    }

    /// Nothing worth keeping.
    pub fn is_blank(&self) -> bool {
        self.body.trim().is_empty()
    }
}

/// In-memory draft storage keyed by (user, inventory).
#[derive(Debug, Default)]
pub struct DraftBook {
    drafts: HashMap<(UserId, InventoryId), Draft>,
}

impl DraftBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Save a draft, replacing any earlier one. A blank draft clears instead.
    pub fn save(&mut self, draft: Draft) {
        let key = (draft.user_id, draft.inventory_id);
        if draft.is_blank() {
            self.drafts.remove(&key);
        } else {
            self.drafts.insert(key, draft);
        }
    }

    pub fn get(&self, user_id: UserId, inventory_id: InventoryId) -> Option<&Draft> {
        self.drafts.get(&(user_id, inventory_id))
    }

    pub fn clear(&mut self, user_id: UserId, inventory_id: InventoryId) -> Option<Draft> {
        self.drafts.remove(&(user_id, inventory_id))
    }
}
