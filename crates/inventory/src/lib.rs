//! Inventory domain module.
//!
//! Inventories are named collections instantiated from exactly one template;
//! items are the records inside them. This crate holds the creation rules,
//! the access policy and tag handling, implemented purely as deterministic
//! domain logic (no IO, no HTTP, no storage).

pub mod access;
pub mod inventory;
pub mod item;
pub mod tags;

pub use access::Shared;
pub use inventory::{Inventory, NewInventory};
pub use item::{Item, NewItem};
pub use tags::{normalize_tags, parse_tags};
