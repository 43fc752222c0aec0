use core::str::FromStr;

use serde::{Deserialize, Serialize};

use shelfwise_core::{DomainError, InventoryId};

/// Which per-inventory channel a message travels on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicKind {
    Discussions,
    Presence,
}

impl TopicKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopicKind::Discussions => "discussions",
            TopicKind::Presence => "presence",
        }
    }
}

/// A realtime channel name, rendered as `"{kind}:{inventory_id}"`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Topic {
    kind: TopicKind,
    inventory_id: InventoryId,
}

impl Topic {
    pub fn discussions(inventory_id: InventoryId) -> Self {
        Self {
            kind: TopicKind::Discussions,
            inventory_id,
        }
    }

    pub fn presence(inventory_id: InventoryId) -> Self {
        Self {
            kind: TopicKind::Presence,
            inventory_id,
        }
    }

    pub fn kind(&self) -> TopicKind {
        self.kind
    }

    pub fn inventory_id(&self) -> InventoryId {
        self.inventory_id
    }
}

impl core::fmt::Display for Topic {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.inventory_id)
    }
}

impl FromStr for Topic {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| DomainError::validation(format!("malformed topic: {s}")))?;
        let inventory_id = id.parse::<InventoryId>()?;
        match kind {
            "discussions" => Ok(Topic::discussions(inventory_id)),
            "presence" => Ok(Topic::presence(inventory_id)),
            other => Err(DomainError::validation(format!("unknown topic kind: {other}"))),
        }
    }
}
