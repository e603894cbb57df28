//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity and are compared by their attribute
/// values. They are captured by copy: a category snapshot embedded in a menu
/// item is a value object, immune to later edits of the category record it
/// was copied from.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
