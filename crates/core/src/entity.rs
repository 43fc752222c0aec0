//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Templates, inventories, items and discussion messages are entities: two
/// records with the same identifier are the same record even if other
/// attributes differ.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
