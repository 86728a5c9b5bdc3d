//! Reflection traits
//!
//! `ReflectValue` is the per-type conversion boundary: every type that can
//! appear as a field, parameter, or return value implements it (the derive
//! macro supplies impls for user structs and enums; this module supplies
//! the built-in ones). `Reflect` is the object-safe instance surface the
//! facade traverses.

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::sync::LazyLock;
use std::time::{Duration, SystemTime};

use dashmap::DashMap;

use crate::provider::{TypeMarkers, TypeSpec};
use crate::shape::TypeShape;
use crate::value::{Bytes, Guid, Value};

/// Conversion boundary between a concrete type and the value model
pub trait ReflectValue: Send + Sync + 'static {
    /// Declared shape of this type
    fn shape() -> TypeShape
    where
        Self: Sized;

    /// Project into a value; `None` when the type has no value form
    /// (delegates, structs without convertible fields)
    fn to_value(&self) -> Option<Value>;

    /// Rebuild from an exactly-shaped value; coercion happens upstream
    #[must_use]
    fn from_value(value: &Value) -> Option<Self>
    where
        Self: Sized;

    /// Borrow as a reflectable node, when this type is traversable
    fn as_reflect(&self) -> Option<&dyn Reflect> {
        None
    }

    fn as_reflect_mut(&mut self) -> Option<&mut dyn Reflect> {
        None
    }

    /// The derived spec this type relates to: `Some` for derived types,
    /// forwarded through optionals and collections to their inner type
    fn declared_spec() -> Option<&'static TypeSpec>
    where
        Self: Sized,
    {
        None
    }
}

/// Object-safe instance surface for generic member access
pub trait Reflect: Any + Send + Sync {
    /// Static metadata for this instance's type
    fn type_spec(&self) -> &'static TypeSpec;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Reflectable elements, for collection nodes
    fn reflect_items(&self) -> Option<Vec<&dyn Reflect>> {
        None
    }

    fn reflect_items_mut(&mut self) -> Option<Vec<&mut dyn Reflect>> {
        None
    }
}

// ============================================================================
// Built-in ReflectValue implementations
// ============================================================================

// impl_reflect_scalar: integer-like types that route through a Value variant
macro_rules! impl_reflect_scalar {
    ( $( $ty:ty => $variant:ident / $shape:ident ),* $(,)? ) => {
        $(
            impl ReflectValue for $ty {
                fn shape() -> TypeShape {
                    TypeShape::$shape
                }

                fn to_value(&self) -> Option<Value> {
                    Some(Value::$variant((*self).into()))
                }

                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => (*v).try_into().ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_reflect_scalar!(
    i8  => Int / Int,
    i16 => Int / Int,
    i32 => Int / Int,
    i64 => Int / Int,
    u8  => UInt / UInt,
    u16 => UInt / UInt,
    u32 => UInt / UInt,
    u64 => UInt / UInt,
    bool => Bool / Bool,
);

impl ReflectValue for f64 {
    fn shape() -> TypeShape {
        TypeShape::Float
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::Float(*self))
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl ReflectValue for f32 {
    fn shape() -> TypeShape {
        TypeShape::Float
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::Float(f64::from(*self)))
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(*v as f32),
            _ => None,
        }
    }
}

impl ReflectValue for String {
    fn shape() -> TypeShape {
        TypeShape::Text
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::Text(self.clone()))
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl ReflectValue for Bytes {
    fn shape() -> TypeShape {
        TypeShape::Bytes
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::Bytes(self.clone()))
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bytes(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl ReflectValue for Guid {
    fn shape() -> TypeShape {
        TypeShape::Guid
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::Guid(*self))
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Guid(v) => Some(*v),
            _ => None,
        }
    }
}

impl ReflectValue for SystemTime {
    fn shape() -> TypeShape {
        TypeShape::DateTime
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::DateTime(*self))
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::DateTime(v) => Some(*v),
            _ => None,
        }
    }
}

impl ReflectValue for Duration {
    fn shape() -> TypeShape {
        TypeShape::TimeSpan
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::TimeSpan(*self))
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::TimeSpan(v) => Some(*v),
            _ => None,
        }
    }
}

impl ReflectValue for () {
    fn shape() -> TypeShape {
        TypeShape::Unit
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::Unit)
    }

    fn from_value(value: &Value) -> Option<Self> {
        matches!(value, Value::Unit).then_some(())
    }
}

impl<T: ReflectValue> ReflectValue for Option<T> {
    fn shape() -> TypeShape {
        TypeShape::Optional(Box::new(T::shape()))
    }

    fn to_value(&self) -> Option<Value> {
        match self {
            Some(v) => v.to_value(),
            None => Some(Value::Null),
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        if value.is_null() {
            return Some(None);
        }
        T::from_value(value).map(Some)
    }

    fn as_reflect(&self) -> Option<&dyn Reflect> {
        self.as_ref().and_then(ReflectValue::as_reflect)
    }

    fn as_reflect_mut(&mut self) -> Option<&mut dyn Reflect> {
        self.as_mut().and_then(ReflectValue::as_reflect_mut)
    }

    fn declared_spec() -> Option<&'static TypeSpec> {
        T::declared_spec()
    }
}

impl<T: ReflectValue> ReflectValue for Box<T> {
    fn shape() -> TypeShape {
        T::shape()
    }

    fn to_value(&self) -> Option<Value> {
        (**self).to_value()
    }

    fn from_value(value: &Value) -> Option<Self> {
        T::from_value(value).map(Self::new)
    }

    fn as_reflect(&self) -> Option<&dyn Reflect> {
        (**self).as_reflect()
    }

    fn as_reflect_mut(&mut self) -> Option<&mut dyn Reflect> {
        (**self).as_reflect_mut()
    }

    fn declared_spec() -> Option<&'static TypeSpec> {
        T::declared_spec()
    }
}

impl<T: ReflectValue> ReflectValue for Vec<T> {
    fn shape() -> TypeShape {
        TypeShape::List(Box::new(T::shape()))
    }

    fn to_value(&self) -> Option<Value> {
        self.iter()
            .map(ReflectValue::to_value)
            .collect::<Option<Vec<_>>>()
            .map(Value::List)
    }

    fn from_value(value: &Value) -> Option<Self> {
        let Value::List(items) = value else {
            return None;
        };
        items.iter().map(T::from_value).collect()
    }

    fn as_reflect(&self) -> Option<&dyn Reflect> {
        Some(self)
    }

    fn as_reflect_mut(&mut self) -> Option<&mut dyn Reflect> {
        Some(self)
    }

    fn declared_spec() -> Option<&'static TypeSpec> {
        T::declared_spec()
    }
}

impl<K, V> ReflectValue for HashMap<K, V>
where
    K: ReflectValue + Eq + Hash,
    V: ReflectValue,
{
    fn shape() -> TypeShape {
        TypeShape::Map {
            key: Box::new(K::shape()),
            value: Box::new(V::shape()),
        }
    }

    fn to_value(&self) -> Option<Value> {
        let mut pairs = self
            .iter()
            .map(|(k, v)| Some((k.to_value()?, v.to_value()?)))
            .collect::<Option<Vec<_>>>()?;
        // Deterministic entry order regardless of hash seed
        pairs.sort_by(|a, b| format!("{:?}", a.0).cmp(&format!("{:?}", b.0)));
        Some(Value::Map(pairs))
    }

    fn from_value(value: &Value) -> Option<Self> {
        let Value::Map(pairs) = value else {
            return None;
        };
        pairs
            .iter()
            .map(|(k, v)| Some((K::from_value(k)?, V::from_value(v)?)))
            .collect()
    }

    fn declared_spec() -> Option<&'static TypeSpec> {
        V::declared_spec()
    }
}

impl<K, V> ReflectValue for BTreeMap<K, V>
where
    K: ReflectValue + Ord,
    V: ReflectValue,
{
    fn shape() -> TypeShape {
        TypeShape::Map {
            key: Box::new(K::shape()),
            value: Box::new(V::shape()),
        }
    }

    fn to_value(&self) -> Option<Value> {
        self.iter()
            .map(|(k, v)| Some((k.to_value()?, v.to_value()?)))
            .collect::<Option<Vec<_>>>()
            .map(Value::Map)
    }

    fn from_value(value: &Value) -> Option<Self> {
        let Value::Map(pairs) = value else {
            return None;
        };
        pairs
            .iter()
            .map(|(k, v)| Some((K::from_value(k)?, V::from_value(v)?)))
            .collect()
    }

    fn declared_spec() -> Option<&'static TypeSpec> {
        V::declared_spec()
    }
}

// impl_reflect_tuple: fixed-arity tuples as Tuple values
macro_rules! impl_reflect_tuple {
    ( $( ($($name:ident : $idx:tt),+) ),+ $(,)? ) => {
        $(
            impl<$($name: ReflectValue),+> ReflectValue for ($($name,)+) {
                fn shape() -> TypeShape {
                    TypeShape::Tuple(vec![$($name::shape()),+])
                }

                fn to_value(&self) -> Option<Value> {
                    Some(Value::Tuple(vec![$(self.$idx.to_value()?),+]))
                }

                fn from_value(value: &Value) -> Option<Self> {
                    let Value::Tuple(items) = value else {
                        return None;
                    };
                    let expected = [$(stringify!($idx)),+].len();
                    if items.len() != expected {
                        return None;
                    }
                    Some(($($name::from_value(&items[$idx])?,)+))
                }
            }
        )+
    };
}

impl_reflect_tuple!(
    (A: 0),
    (A: 0, B: 1),
    (A: 0, B: 1, C: 2),
    (A: 0, B: 1, C: 2, D: 3),
);

// impl_reflect_delegate: fn pointers carry shape only, no value projection
macro_rules! impl_reflect_delegate {
    ( $( fn($($arg:ident),*) ),+ $(,)? ) => {
        $(
            impl<R: ReflectValue, $($arg: ReflectValue),*> ReflectValue for fn($($arg),*) -> R {
                fn shape() -> TypeShape {
                    TypeShape::Delegate {
                        params: vec![$($arg::shape()),*],
                        ret: Box::new(R::shape()),
                    }
                }

                fn to_value(&self) -> Option<Value> {
                    None
                }

                fn from_value(_value: &Value) -> Option<Self> {
                    None
                }
            }
        )+
    };
}

impl_reflect_delegate!(fn(), fn(A), fn(A, B));

// ============================================================================
// Reflect for built-in collections
// ============================================================================

/// Synthesized specs for container types that have no derive site
static SYNTH_SPECS: LazyLock<DashMap<TypeId, &'static TypeSpec>> = LazyLock::new(DashMap::new);

fn shape_thunk<T: ReflectValue>() -> TypeShape {
    T::shape()
}

/// Get-or-leak a minimal spec for a container type
///
/// A losing racer leaks one redundant spec; the entry API keeps the
/// published one canonical.
pub(crate) fn synthesized_spec<C: ReflectValue + Any>() -> &'static TypeSpec {
    let id = TypeId::of::<C>();
    if let Some(spec) = SYNTH_SPECS.get(&id) {
        return *spec;
    }

    let spec: &'static TypeSpec = Box::leak(Box::new(TypeSpec {
        type_path: Box::leak(C::shape().key().into_boxed_str()),
        type_id: TypeId::of::<C>,
        shape: shape_thunk::<C>,
        markers: TypeMarkers::default(),
        fields: &[],
        default_ctor: None,
    }));

    *SYNTH_SPECS.entry(id).or_insert(spec)
}

impl<T: ReflectValue> Reflect for Vec<T> {
    fn type_spec(&self) -> &'static TypeSpec {
        synthesized_spec::<Self>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn reflect_items(&self) -> Option<Vec<&dyn Reflect>> {
        self.iter().map(ReflectValue::as_reflect).collect()
    }

    fn reflect_items_mut(&mut self) -> Option<Vec<&mut dyn Reflect>> {
        self.iter_mut().map(ReflectValue::as_reflect_mut).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_round_trip() {
        assert_eq!(42i32.to_value(), Some(Value::Int(42)));
        assert_eq!(i32::from_value(&Value::Int(42)), Some(42));
        assert_eq!(i8::from_value(&Value::Int(300)), None);
        assert_eq!(u32::from_value(&Value::Int(1)), None);
    }

    #[test]
    fn test_option_shape_and_null() {
        assert_eq!(
            <Option<u64>>::shape(),
            TypeShape::Optional(Box::new(TypeShape::UInt))
        );
        assert_eq!(None::<u64>.to_value(), Some(Value::Null));
        assert_eq!(<Option<u64>>::from_value(&Value::Null), Some(None));
        assert_eq!(<Option<u64>>::from_value(&Value::UInt(3)), Some(Some(3)));
    }

    #[test]
    fn test_vec_round_trip() {
        let v = vec![1u8, 2, 3];
        let value = v.to_value().unwrap();
        assert_eq!(
            value,
            Value::List(vec![Value::UInt(1), Value::UInt(2), Value::UInt(3)])
        );
        assert_eq!(<Vec<u8>>::from_value(&value), Some(v));
    }

    #[test]
    fn test_hashmap_entries_sorted() {
        let mut m = HashMap::new();
        m.insert("b".to_string(), 2u32);
        m.insert("a".to_string(), 1u32);
        let Some(Value::Map(pairs)) = m.to_value() else {
            panic!("expected map");
        };
        assert_eq!(pairs[0].0, Value::Text("a".to_string()));
        assert_eq!(pairs[1].0, Value::Text("b".to_string()));
    }

    #[test]
    fn test_tuple_round_trip() {
        let t = (1i64, "x".to_string());
        let value = t.to_value().unwrap();
        assert_eq!(<(i64, String)>::from_value(&value), Some(t));
        assert_eq!(<(i64, String)>::from_value(&Value::Tuple(vec![])), None);
    }

    #[test]
    fn test_delegate_shape_has_no_value_form() {
        type Handler = fn(u32) -> bool;
        assert!(matches!(Handler::shape(), TypeShape::Delegate { .. }));
        let f: Handler = |n| n > 0;
        assert_eq!(f.to_value(), None);
    }

    #[test]
    fn test_synthesized_spec_is_cached() {
        let a = synthesized_spec::<Vec<u32>>();
        let b = synthesized_spec::<Vec<u32>>();
        assert!(std::ptr::eq(a, b));
        assert_ne!(
            std::ptr::from_ref(a),
            std::ptr::from_ref(synthesized_spec::<Vec<i32>>())
        );
    }
}
