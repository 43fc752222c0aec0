//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Field values and tags are value objects: they carry no identity and two
/// of them are interchangeable whenever their contents are equal.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
