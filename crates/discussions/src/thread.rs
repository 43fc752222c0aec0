use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shelfwise_auth::Profile;
use shelfwise_core::{Entity, InventoryId, MessageId, UserId};

use crate::DiscussionMessage;

/// How a message author is shown next to their messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub id: UserId,
    pub display_name: String,
    pub initials: String,
}

impl AuthorSummary {
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            id: profile.id,
            display_name: profile.display_name().to_string(),
            initials: profile.initials(),
        }
    }

    /// Placeholder for an author whose profile no longer resolves.
    pub fn unknown(id: UserId) -> Self {
        Self {
            id,
            display_name: "Unknown user".to_string(),
            initials: "?".to_string(),
        }
    }
}

/// A message as rendered in a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadEntry {
    pub id: MessageId,
    pub inventory_id: InventoryId,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub author: AuthorSummary,
}

impl ThreadEntry {
    pub fn new(message: &DiscussionMessage, author: AuthorSummary) -> Self {
        Self {
            id: *message.id(),
            inventory_id: message.inventory_id(),
            body: message.body().to_string(),
            created_at: message.created_at(),
            author,
        }
    }
}

/// Join messages with their authors and order them oldest first.
///
/// Ties on `created_at` fall back to the message id.
pub fn assemble_thread(
    mut messages: Vec<DiscussionMessage>,
    profiles: &HashMap<UserId, Profile>,
) -> Vec<ThreadEntry> {
    messages.sort_by(|a, b| a.created_at().cmp(&b.created_at()).then_with(|| a.id().cmp(b.id())));
    messages
        .iter()
        .map(|m| {
            let author = profiles
                .get(&m.author_id())
                .map(AuthorSummary::from_profile)
                .unwrap_or_else(|| AuthorSummary::unknown(m.author_id()));
            ThreadEntry::new(m, author)
        })
        .collect()
}
