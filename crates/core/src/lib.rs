//! `shelfwise-core`: shared domain building blocks.
//!
//! Identifiers, the domain error model and the small entity/value-object
//! vocabulary used by the template, inventory and discussion crates.
//! Nothing here performs IO.

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{FieldId, InventoryId, ItemId, MessageId, TemplateId, UserId};
pub use value_object::ValueObject;
