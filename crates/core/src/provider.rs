//! Member provider metadata
//!
//! The static metadata tables emitted by `#[derive(Reflect)]` and
//! `#[reflect_impl]`. Everything downstream (classification, descriptors,
//! name resolution, accessors, the facade) is written against these tables,
//! never against concrete types - they are the engine's reflection surface.
//!
//! All accessor slots are plain `fn` pointers generated per field/method,
//! so a spec is `'static`, `Sync`, and free to live in a `static`.

use std::any::{Any, TypeId};

use crate::error::AccessError;
use crate::shape::TypeShape;
use crate::traits::Reflect;
use crate::value::Value;

/// Type-level declarative markers parsed from `#[reflect(...)]`
#[derive(Clone, Copy, Debug, Default)]
pub struct TypeMarkers {
    pub display: Option<&'static str>,
    pub description: Option<&'static str>,
    /// Storage table name; a bare `table` marker resolves to the type name
    /// at macro expansion time
    pub table: Option<&'static str>,
    pub schema: Option<&'static str>,
}

/// Field-level declarative markers parsed from `#[reflect(...)]`
#[derive(Clone, Copy, Debug, Default)]
pub struct FieldMarkers {
    pub display: Option<&'static str>,
    pub description: Option<&'static str>,
    /// Serialization name
    pub rename: Option<&'static str>,
    /// Storage column name
    pub column: Option<&'static str>,
    pub key: bool,
    pub foreign_key: bool,
    pub exclude: bool,
    pub readonly: bool,
    pub event: bool,
}

/// Static metadata for one reflectable type
pub struct TypeSpec {
    /// Fully-qualified Rust type path
    pub type_path: &'static str,
    pub type_id: fn() -> TypeId,
    pub shape: fn() -> TypeShape,
    pub markers: TypeMarkers,
    /// Declared fields, declaration order
    pub fields: &'static [FieldSpec],
    /// No-argument factory, present when the type opted in with
    /// `#[reflect(default)]`
    pub default_ctor: Option<fn() -> Box<dyn Reflect>>,
}

impl TypeSpec {
    pub fn id(&self) -> TypeId {
        (self.type_id)()
    }

    /// Last segment of the type path
    pub fn short_name(&self) -> &'static str {
        self.type_path.rsplit("::").next().unwrap_or(self.type_path)
    }
}

/// Static metadata and type-erased accessors for one field
pub struct FieldSpec {
    pub name: &'static str,
    /// `pub` fields surface as properties, the rest as fields
    pub is_public: bool,
    pub shape: fn() -> TypeShape,
    pub markers: FieldMarkers,
    /// Read the field into a value; `None` when the field's type has no
    /// value projection (delegates) or the instance is of the wrong type
    pub get: fn(&dyn Any) -> Option<Value>,
    /// Write the field from a value; absent for readonly fields
    pub set: Option<fn(&mut dyn Any, Value) -> Result<(), AccessError>>,
    /// Borrow the field as a reflectable node for path traversal;
    /// `None` for basic fields and absent optionals
    pub get_ref: fn(&dyn Any) -> Option<&dyn Reflect>,
    pub get_mut: fn(&mut dyn Any) -> Option<&mut dyn Reflect>,
    /// The reflectable type this field relates to: the field type itself
    /// for struct fields, the element type for collections, the inner type
    /// for optionals
    pub related_spec: fn() -> Option<&'static TypeSpec>,
}

/// Static metadata for one registered method
pub struct MethodSpec {
    pub name: &'static str,
    pub ret_shape: fn() -> TypeShape,
    pub param_shapes: fn() -> Vec<TypeShape>,
    pub invoke: fn(&mut dyn Any, &[Value]) -> Result<Value, AccessError>,
}

/// Static metadata for one registered constructor
pub struct CtorSpec {
    /// Source function name, kept for diagnostics
    pub name: &'static str,
    pub param_shapes: fn() -> Vec<TypeShape>,
    pub construct: fn(&[Value]) -> Result<Box<dyn Reflect>, AccessError>,
}

/// Cache key identifying one underlying member
///
/// Specs live in statics (or are leaked once), so their address is a stable
/// process-lifetime identity.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct MemberId(usize);

impl MemberId {
    pub fn of_type(spec: &'static TypeSpec) -> Self {
        Self(std::ptr::from_ref(spec) as usize)
    }

    pub fn of_field(spec: &'static FieldSpec) -> Self {
        Self(std::ptr::from_ref(spec) as usize)
    }

    pub fn of_method(spec: &'static MethodSpec) -> Self {
        Self(std::ptr::from_ref(spec) as usize)
    }

    pub fn of_ctor(spec: &'static CtorSpec) -> Self {
        Self(std::ptr::from_ref(spec) as usize)
    }
}

/// Trait binding a type to its derived spec
///
/// Implemented by `#[derive(Reflect)]`; gives registration and the facade a
/// way to reach metadata without an instance.
pub trait ReflectType: Reflect + Sized {
    const SPEC: &'static TypeSpec;
}
