//! Type Classifier - pure shape predicates
//!
//! Stateless classification of a declared value shape. Callers cache the
//! aggregate `TypeFlags` inside a member descriptor; nothing here caches.
//!
//! A "basic" shape is an atomic, directly formattable value (primitive,
//! text, date/time, guid, enum) that generic member access never traverses
//! further. A shape that is both iterable and a mapping classifies as a
//! dictionary, never as a collection - the mapping contract is the more
//! specific one.

use bitflags::bitflags;

use crate::shape::TypeShape;

bitflags! {
    /// Aggregate classification flags derived once per member
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct TypeFlags: u16 {
        const BASIC      = 1 << 0;
        const NUMERIC    = 1 << 1;
        const BOOLEAN    = 1 << 2;
        const NULLABLE   = 1 << 3;
        const COLLECTION = 1 << 4;
        const DICTIONARY = 1 << 5;
        const TUPLE      = 1 << 6;
        const DELEGATE   = 1 << 7;
        const OBJECT     = 1 << 8;
    }
}

impl TypeFlags {
    /// Derive the full flag set for a shape
    pub fn classify(shape: &TypeShape) -> Self {
        let mut flags = Self::empty();

        if is_basic(shape) {
            flags |= Self::BASIC;
        }
        if is_numeric(shape) {
            flags |= Self::NUMERIC;
        }
        if is_boolean(shape) {
            flags |= Self::BOOLEAN;
        }
        if is_nullable(shape) {
            flags |= Self::NULLABLE;
        }
        if is_dictionary(shape) {
            flags |= Self::DICTIONARY;
        } else if is_collection(shape) {
            flags |= Self::COLLECTION;
        }
        if is_tuple(shape) {
            flags |= Self::TUPLE;
        }
        if is_delegate(shape) {
            flags |= Self::DELEGATE;
        }
        if matches!(shape.unwrap_optional(), TypeShape::Struct { .. } | TypeShape::Unit) {
            flags |= Self::OBJECT;
        }

        flags
    }
}

/// Atomic, directly formattable value
pub fn is_basic(shape: &TypeShape) -> bool {
    matches!(
        shape.unwrap_optional(),
        TypeShape::Bool
            | TypeShape::Int
            | TypeShape::UInt
            | TypeShape::Float
            | TypeShape::Text
            | TypeShape::Bytes
            | TypeShape::DateTime
            | TypeShape::TimeSpan
            | TypeShape::Guid
            | TypeShape::Enum { .. }
    )
}

pub fn is_numeric(shape: &TypeShape) -> bool {
    matches!(
        shape.unwrap_optional(),
        TypeShape::Int | TypeShape::UInt | TypeShape::Float
    )
}

pub fn is_boolean(shape: &TypeShape) -> bool {
    matches!(shape.unwrap_optional(), TypeShape::Bool)
}

/// Explicitly optional value
pub fn is_nullable(shape: &TypeShape) -> bool {
    matches!(shape, TypeShape::Optional(_))
}

/// Sequence shape; mappings are excluded even though they iterate
pub fn is_collection(shape: &TypeShape) -> bool {
    matches!(shape.unwrap_optional(), TypeShape::List(_))
}

pub fn is_dictionary(shape: &TypeShape) -> bool {
    matches!(shape.unwrap_optional(), TypeShape::Map { .. })
}

pub fn is_tuple(shape: &TypeShape) -> bool {
    matches!(shape.unwrap_optional(), TypeShape::Tuple(_))
}

pub fn is_delegate(shape: &TypeShape) -> bool {
    matches!(shape.unwrap_optional(), TypeShape::Delegate { .. })
}

/// Declared element type of a sequence, or the value type of a mapping
pub fn element_type(shape: &TypeShape) -> Option<&TypeShape> {
    match shape.unwrap_optional() {
        TypeShape::List(elem) => Some(elem),
        TypeShape::Map { value, .. } => Some(value),
        _ => None,
    }
}
