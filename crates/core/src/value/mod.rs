//! Type-erased value model
//!
//! `Value` is the currency of the generic object facade: compiled accessors
//! read members into it, setters and constructors accept it, and the
//! conversion table in [`convert`] moves between its variants. One variant
//! exists per basic shape plus list/map/tuple composites; struct-valued
//! members surface as a `Map` of their convertible fields.

mod convert;
mod guid;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::shape::TypeShape;

pub use convert::{add_custom_type_converter, change_type, try_change_type, CustomConverter};
pub use guid::{Guid, ParseGuidError};

/// Opaque binary value
///
/// Distinct from `Vec<u8>` so byte blobs classify as basic instead of as a
/// sequence of integers.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Serialize)]
pub struct Bytes(pub Vec<u8>);

/// Enum value carried by name and ordinal
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize)]
pub struct EnumValue {
    /// Fully-qualified enum type path
    pub type_name: String,
    /// Variant name
    pub variant: String,
    /// Zero-based declaration ordinal
    pub ordinal: u64,
}

impl EnumValue {
    /// Last path segment of the enum type name
    pub fn short_type_name(&self) -> &str {
        self.type_name
            .rsplit("::")
            .next()
            .unwrap_or(&self.type_name)
    }
}

/// Type-erased value passed through the get/set/convert/construct surface
///
/// `Null` is the absent/none value; `Unit` is the result of a void-returning
/// method, not a real data value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Bytes),
    DateTime(SystemTime),
    TimeSpan(Duration),
    Guid(Guid),
    Enum(EnumValue),
    List(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Tuple(Vec<Value>),
    Unit,
}

/// Fieldless discriminant of a `Value`, used as converter-registry key
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ValueTag {
    Null,
    Bool,
    Int,
    UInt,
    Float,
    Text,
    Bytes,
    DateTime,
    TimeSpan,
    Guid,
    Enum,
    List,
    Map,
    Tuple,
    Unit,
}

impl Value {
    pub const fn tag(&self) -> ValueTag {
        match self {
            Self::Null => ValueTag::Null,
            Self::Bool(_) => ValueTag::Bool,
            Self::Int(_) => ValueTag::Int,
            Self::UInt(_) => ValueTag::UInt,
            Self::Float(_) => ValueTag::Float,
            Self::Text(_) => ValueTag::Text,
            Self::Bytes(_) => ValueTag::Bytes,
            Self::DateTime(_) => ValueTag::DateTime,
            Self::TimeSpan(_) => ValueTag::TimeSpan,
            Self::Guid(_) => ValueTag::Guid,
            Self::Enum(_) => ValueTag::Enum,
            Self::List(_) => ValueTag::List,
            Self::Map(_) => ValueTag::Map,
            Self::Tuple(_) => ValueTag::Tuple,
            Self::Unit => ValueTag::Unit,
        }
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Zero/default value for a shape
    ///
    /// Value-type shapes degrade to this instead of failing construction.
    /// Shapes with no zero representation (structs, delegates) yield `Null`.
    pub fn zero_of(shape: &TypeShape) -> Self {
        match shape {
            TypeShape::Bool => Self::Bool(false),
            TypeShape::Int => Self::Int(0),
            TypeShape::UInt => Self::UInt(0),
            TypeShape::Float => Self::Float(0.0),
            TypeShape::Text => Self::Text(String::new()),
            TypeShape::Bytes => Self::Bytes(Bytes::default()),
            TypeShape::DateTime => Self::DateTime(UNIX_EPOCH),
            TypeShape::TimeSpan => Self::TimeSpan(Duration::ZERO),
            TypeShape::Guid => Self::Guid(Guid::zero()),
            TypeShape::Enum { name, variants } => Self::Enum(EnumValue {
                type_name: name.clone(),
                variant: variants.first().cloned().unwrap_or_default(),
                ordinal: 0,
            }),
            TypeShape::Unit => Self::Unit,
            TypeShape::Optional(_) => Self::Null,
            TypeShape::List(_) => Self::List(Vec::new()),
            TypeShape::Map { .. } => Self::Map(Vec::new()),
            TypeShape::Tuple(items) => Self::Tuple(items.iter().map(Self::zero_of).collect()),
            TypeShape::Delegate { .. } | TypeShape::Struct { .. } => Self::Null,
        }
    }

    /// Whether this value already fits a shape without conversion
    pub fn matches_shape(&self, shape: &TypeShape) -> bool {
        match (self, shape) {
            (Self::Null, TypeShape::Optional(_)) => true,
            (value, TypeShape::Optional(inner)) => value.matches_shape(inner),
            (Self::Bool(_), TypeShape::Bool)
            | (Self::Int(_), TypeShape::Int)
            | (Self::UInt(_), TypeShape::UInt)
            | (Self::Float(_), TypeShape::Float)
            | (Self::Text(_), TypeShape::Text)
            | (Self::Bytes(_), TypeShape::Bytes)
            | (Self::DateTime(_), TypeShape::DateTime)
            | (Self::TimeSpan(_), TypeShape::TimeSpan)
            | (Self::Guid(_), TypeShape::Guid)
            | (Self::Unit, TypeShape::Unit) => true,
            (Self::Enum(ev), TypeShape::Enum { name, .. }) => {
                ev.short_type_name() == name.rsplit("::").next().unwrap_or(name)
            }
            (Self::List(items), TypeShape::List(elem)) => {
                items.iter().all(|item| item.matches_shape(elem))
            }
            (Self::Map(pairs), TypeShape::Map { key, value }) => pairs
                .iter()
                .all(|(k, v)| k.matches_shape(key) && v.matches_shape(value)),
            (Self::Tuple(items), TypeShape::Tuple(shapes)) => {
                items.len() == shapes.len()
                    && items
                        .iter()
                        .zip(shapes.iter())
                        .all(|(item, s)| item.matches_shape(s))
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_of_basic_shapes() {
        assert_eq!(Value::zero_of(&TypeShape::Int), Value::Int(0));
        assert_eq!(Value::zero_of(&TypeShape::Text), Value::Text(String::new()));
        assert_eq!(
            Value::zero_of(&TypeShape::Optional(Box::new(TypeShape::Int))),
            Value::Null
        );
        assert_eq!(Value::zero_of(&TypeShape::List(Box::new(TypeShape::Bool))), Value::List(vec![]));
    }

    #[test]
    fn test_zero_of_enum_is_first_variant() {
        let shape = TypeShape::Enum {
            name: "Color".to_string(),
            variants: vec!["Red".to_string(), "Green".to_string()],
        };
        let Value::Enum(ev) = Value::zero_of(&shape) else {
            panic!("expected enum value");
        };
        assert_eq!(ev.variant, "Red");
        assert_eq!(ev.ordinal, 0);
    }

    #[test]
    fn test_matches_shape_optional() {
        let shape = TypeShape::Optional(Box::new(TypeShape::Int));
        assert!(Value::Null.matches_shape(&shape));
        assert!(Value::Int(5).matches_shape(&shape));
        assert!(!Value::Text("5".to_string()).matches_shape(&shape));
        assert!(!Value::Null.matches_shape(&TypeShape::Int));
    }

    #[test]
    fn test_matches_shape_list_elementwise() {
        let shape = TypeShape::List(Box::new(TypeShape::UInt));
        assert!(Value::List(vec![Value::UInt(1), Value::UInt(2)]).matches_shape(&shape));
        assert!(!Value::List(vec![Value::UInt(1), Value::Int(-2)]).matches_shape(&shape));
    }

    #[test]
    fn test_value_serializes() {
        let value = Value::Tuple(vec![
            Value::Guid(Guid::zero()),
            Value::Text("x".to_string()),
        ]);
        let json = serde_json::to_string(&value).unwrap();
        assert!(json.contains("00000000-0000-0000-0000-000000000000"));
    }
}
