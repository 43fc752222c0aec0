//! Who is currently looking at which inventory.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shelfwise_core::{InventoryId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    pub user_id: UserId,
    pub display_name: String,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct Presence {
    viewer: Viewer,
    connections: usize,
}

/// Presence state for every inventory.
///
/// A user may hold several connections to the same inventory (several tabs);
/// they join on the first and leave when the last one closes.
#[derive(Debug, Default)]
pub struct PresenceRoster {
    inventories: HashMap<InventoryId, HashMap<UserId, Presence>>,
}

impl PresenceRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection. Returns the viewer when this is their first one.
    pub fn join(
        &mut self,
        inventory_id: InventoryId,
        user_id: UserId,
        display_name: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Option<Viewer> {
        let viewers = self.inventories.entry(inventory_id).or_default();
        match viewers.get_mut(&user_id) {
            Some(presence) => {
                presence.connections += 1;
                None
            }
            None => {
                let viewer = Viewer {
                    user_id,
                    display_name: display_name.into(),
                    joined_at: now,
                };
                viewers.insert(
                    user_id,
                    Presence {
                        viewer: viewer.clone(),
                        connections: 1,
                    },
                );
                Some(viewer)
            }
        }
    }

    /// Drop a connection. Returns the viewer when their last one closed.
    pub fn leave(&mut self, inventory_id: InventoryId, user_id: UserId) -> Option<Viewer> {
        let viewers = self.inventories.get_mut(&inventory_id)?;
        let presence = viewers.get_mut(&user_id)?;
        presence.connections = presence.connections.saturating_sub(1);
        if presence.connections > 0 {
            return None;
        }

        let left = viewers.remove(&user_id).map(|p| p.viewer);
        if viewers.is_empty() {
            self.inventories.remove(&inventory_id);
        }
        left
    }

    /// Every current viewer, earliest arrival first.
    pub fn viewers(&self, inventory_id: InventoryId) -> Vec<Viewer> {
        let mut viewers: Vec<Viewer> = self
            .inventories
            .get(&inventory_id)
            .map(|v| v.values().map(|p| p.viewer.clone()).collect())
            .unwrap_or_default();
        viewers.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then_with(|| a.user_id.cmp(&b.user_id)));
        viewers
    }

    /// Current viewers other than `requester`.
    pub fn others(&self, inventory_id: InventoryId, requester: UserId) -> Vec<Viewer> {
        self.viewers(inventory_id)
            .into_iter()
            .filter(|v| v.user_id != requester)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn join_and_leave_are_reported_once_per_user() {
        let mut roster = PresenceRoster::new();
        let inv = InventoryId::new();
        let ada = UserId::new();

        assert!(roster.join(inv, ada, "ada", Utc::now()).is_some());
        assert!(roster.join(inv, ada, "ada", Utc::now()).is_none());

        assert!(roster.leave(inv, ada).is_none());
        assert_eq!(roster.viewers(inv).len(), 1);

        let left = roster.leave(inv, ada).unwrap();
        assert_eq!(left.user_id, ada);
        assert!(roster.viewers(inv).is_empty());
    }

    #[test]
    fn others_excludes_the_requester() {
        let mut roster = PresenceRoster::new();
        let inv = InventoryId::new();
        let (ada, bob) = (UserId::new(), UserId::new());
        roster.join(inv, ada, "ada", Utc::now());
        roster.join(inv, bob, "bob", Utc::now());

        let others = roster.others(inv, ada);
        assert_eq!(others.len(), 1);
        assert_eq!(others[0].user_id, bob);
    }

    #[test]
    fn inventories_are_independent() {
        let mut roster = PresenceRoster::new();
        let (a, b) = (InventoryId::new(), InventoryId::new());
        let ada = UserId::new();
        roster.join(a, ada, "ada", Utc::now());

        assert!(roster.viewers(b).is_empty());
        assert!(roster.leave(b, ada).is_none());
        assert_eq!(roster.viewers(a).len(), 1);
    }

    proptest! {
        #[test]
        fn balanced_joins_and_leaves_empty_the_roster(connections in proptest::collection::vec(1usize..4, 1..6)) {
            let mut roster = PresenceRoster::new();
            let inv = InventoryId::new();
            let users: Vec<UserId> = connections.iter().map(|_| UserId::new()).collect();

            for (user, n) in users.iter().zip(&connections) {
                for _ in 0..*n {
                    roster.join(inv, *user, "u", Utc::now());
                }
            }
            prop_assert_eq!(roster.viewers(inv).len(), users.len());

            let mut leaves = 0;
            for (user, n) in users.iter().zip(&connections) {
                for _ in 0..*n {
                    if roster.leave(inv, *user).is_some() {
                        leaves += 1;
                    }
                }
            }
            prop_assert_eq!(leaves, users.len());
            prop_assert!(roster.viewers(inv).is_empty());
        }
    }
}
