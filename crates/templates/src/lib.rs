//! Template / custom-field domain module.
//!
//! A template is a reusable schema: an ordered list of typed field
//! definitions. Inventories are instantiated from templates and every item
//! stored in an inventory carries an attribute bag shaped by those fields.
//!
//! This crate is pure domain logic (no IO, no HTTP, no storage):
//! - [`field`]: field types and definitions
//! - [`template`]: template drafting and field ordering
//! - [`validate`]: the required-field validator
//! - [`value`] / [`bag`]: typed field values and the attribute bag

pub mod bag;
pub mod field;
pub mod template;
pub mod validate;
pub mod value;

pub use bag::AttributeBag;
pub use field::{FieldDefinition, FieldType};
pub use template::{NewField, NewTemplate, Template, parse_options};
pub use validate::{SubmittedValues, ValidationError, validate_required};
pub use value::{FieldValue, display_or_not_set};
