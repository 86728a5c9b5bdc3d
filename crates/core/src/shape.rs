//! Declared value-type shapes
//!
//! `TypeShape` is the engine's runtime projection of a member's declared
//! type: enough structure for classification, coercion, and constructor
//! matching, without holding on to the concrete Rust type. Shapes are built
//! by the `ReflectValue` implementations the derive macro (and the built-in
//! impls in `traits`) provide.

use std::fmt;

/// Runtime shape of a declared value type
///
/// Collections box their element shapes so arbitrarily nested declarations
/// (`Vec<Option<HashMap<String, u64>>>`) project cleanly.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeShape {
    Bool,
    Int,
    UInt,
    Float,
    Text,
    Bytes,
    DateTime,
    TimeSpan,
    Guid,
    Enum {
        name: String,
        variants: Vec<String>,
    },
    Unit,
    Optional(Box<TypeShape>),
    List(Box<TypeShape>),
    Map {
        key: Box<TypeShape>,
        value: Box<TypeShape>,
    },
    Tuple(Vec<TypeShape>),
    Delegate {
        params: Vec<TypeShape>,
        ret: Box<TypeShape>,
    },
    Struct {
        name: String,
    },
}

impl TypeShape {
    /// Strip optional wrappers down to the underlying shape
    pub fn unwrap_optional(&self) -> &TypeShape {
        match self {
            Self::Optional(inner) => inner.unwrap_optional(),
            other => other,
        }
    }

    /// Canonical key used for converter registration and diagnostics
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Last segment of a struct/enum name, qualifier stripped
    pub fn short_name(&self) -> Option<&str> {
        match self.unwrap_optional() {
            Self::Struct { name } | Self::Enum { name, .. } => {
                Some(name.rsplit("::").next().unwrap_or(name))
            }
            _ => None,
        }
    }
}

impl fmt::Display for TypeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::Int => write!(f, "int"),
            Self::UInt => write!(f, "uint"),
            Self::Float => write!(f, "float"),
            Self::Text => write!(f, "text"),
            Self::Bytes => write!(f, "bytes"),
            Self::DateTime => write!(f, "datetime"),
            Self::TimeSpan => write!(f, "timespan"),
            Self::Guid => write!(f, "guid"),
            Self::Enum { name, .. } => write!(f, "enum<{name}>"),
            Self::Unit => write!(f, "unit"),
            Self::Optional(inner) => write!(f, "opt<{inner}>"),
            Self::List(elem) => write!(f, "list<{elem}>"),
            Self::Map { key, value } => write!(f, "map<{key},{value}>"),
            Self::Tuple(items) => {
                write!(f, "tuple<")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ">")
            }
            Self::Delegate { params, ret } => {
                write!(f, "fn(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ")->{ret}")
            }
            Self::Struct { name } => write!(f, "struct<{name}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_keys_are_canonical() {
        let shape = TypeShape::List(Box::new(TypeShape::Optional(Box::new(TypeShape::Int))));
        assert_eq!(shape.key(), "list<opt<int>>");

        let map = TypeShape::Map {
            key: Box::new(TypeShape::Text),
            value: Box::new(TypeShape::UInt),
        };
        assert_eq!(map.key(), "map<text,uint>");
    }

    #[test]
    fn test_unwrap_optional_is_recursive() {
        let shape = TypeShape::Optional(Box::new(TypeShape::Optional(Box::new(TypeShape::Bool))));
        assert_eq!(shape.unwrap_optional(), &TypeShape::Bool);
    }

    #[test]
    fn test_short_name_strips_qualifier() {
        let shape = TypeShape::Struct {
            name: "my_app::entities::Player".to_string(),
        };
        assert_eq!(shape.short_name(), Some("Player"));
    }
}
