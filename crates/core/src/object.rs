//! Generic object facade
//!
//! The high-level entry points: read and write members by name or dotted
//! path, invoke registered methods, and construct instances through the
//! constructor fallback chain. All operations are type-erased - callers
//! hand in `&dyn Reflect` and value-model arguments, and coercion happens
//! at the boundary via [`change_type`].
//!
//! Path traversal is null-tolerant: an absent optional mid-path turns a
//! read into `Ok(None)` and a write into `Ok(false)` instead of an error.
//! A name that does not exist on the traversed type is an error at every
//! depth. Mid-path sequences fan out: reads collect one leaf value per
//! element (absent leaves read as null), writes apply to every element.

use tracing::{debug, trace};

use crate::accessor;
use crate::descriptor::{self, MemberDescriptor};
use crate::error::{ReflectError, ReflectResult};
use crate::provider::TypeSpec;
use crate::registry;
use crate::resolver::{self, NameKind};
use crate::shape::TypeShape;
use crate::traits::Reflect;
use crate::value::{change_type, Value};

/// Outcome of [`new_instance`]: a reflectable object when a constructor or
/// factory produced one, a plain value when construction was shape-level
pub enum Constructed {
    Object(Box<dyn Reflect>),
    Value(Value),
}

impl std::fmt::Debug for Constructed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Constructed::Object(obj) => f
                .debug_tuple("Object")
                .field(&obj.type_spec().type_path)
                .finish(),
            Constructed::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

impl Constructed {
    pub fn into_object(self) -> Option<Box<dyn Reflect>> {
        match self {
            Constructed::Object(obj) => Some(obj),
            Constructed::Value(_) => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Constructed::Value(value) => Some(value),
            Constructed::Object(_) => None,
        }
    }
}

// ============================================================================
// Reads and writes
// ============================================================================

/// Read a member by name
///
/// The name may hit any resolution domain (structural, display, serialized,
/// column, table, schema). A dotted name that does not resolve as a single
/// member falls back to path traversal.
pub fn get(obj: &dyn Reflect, name: &str) -> ReflectResult<Value> {
    let td = descriptor::of_instance(obj)?;
    if let Some(member) = resolver::resolve(&td, name, NameKind::all(), None) {
        let acc = accessor::accessor_for(&member)?;
        return read_member(obj, &member, &acc);
    }
    if name.contains('.') {
        return Ok(get_path(obj, name)?.unwrap_or(Value::Null));
    }
    Err(not_found(&td, name))
}

/// Write a member by name, coercing the value to the member's shape
pub fn set(obj: &mut dyn Reflect, name: &str, value: Value) -> ReflectResult<()> {
    let td = descriptor::of_instance(obj)?;
    if let Some(member) = resolver::resolve(&td, name, NameKind::all(), None) {
        let coerced = change_type(value, member.shape())?;
        let acc = accessor::accessor_for(&member)?;
        acc.write(obj, coerced)?;
        return Ok(());
    }
    if name.contains('.') {
        set_path(obj, name, value)?;
        return Ok(());
    }
    Err(not_found(&td, name))
}

/// Read through a dotted path
///
/// `Ok(None)` means the path was valid but an absent optional cut the
/// traversal short. Mid-path sequences produce a list of leaf values.
pub fn get_path(obj: &dyn Reflect, path: &str) -> ReflectResult<Option<Value>> {
    let segments: Vec<&str> = path.split('.').collect();
    read_path(obj, &segments)
}

/// Write through a dotted path
///
/// Returns how many leaf slots were written: zero when an absent optional
/// cut the traversal short, more than one when a mid-path sequence fanned
/// the write out.
pub fn set_path(obj: &mut dyn Reflect, path: &str, value: Value) -> ReflectResult<usize> {
    let segments: Vec<&str> = path.split('.').collect();
    write_path(obj, &segments, &value)
}

fn read_member(
    obj: &dyn Reflect,
    member: &std::sync::Arc<MemberDescriptor>,
    acc: &accessor::Accessor,
) -> ReflectResult<Value> {
    acc.read(obj).ok_or_else(|| {
        ReflectError::Access(crate::error::AccessError::NotSupported {
            member: member.name().to_string(),
            reason: "member has no value form on this instance".to_string(),
        })
    })
}

fn read_path(obj: &dyn Reflect, segments: &[&str]) -> ReflectResult<Option<Value>> {
    let td = descriptor::of_instance(obj)?;
    let member = resolver::resolve(&td, segments[0], NameKind::all(), None)
        .ok_or_else(|| not_found(&td, segments[0]))?;

    if segments.len() == 1 {
        let acc = accessor::accessor_for(&member)?;
        return Ok(Some(read_member(obj, &member, &acc)?));
    }

    let field = member.field_spec().ok_or_else(|| not_traversable(&td, &member))?;
    let Some(node) = (field.get_ref)(obj.as_any()) else {
        trace!(member = member.name(), "absent node ends traversal");
        return Ok(None);
    };

    if member.is_collection() {
        let Some(items) = node.reflect_items() else {
            return Ok(None);
        };
        let mut leaves = Vec::with_capacity(items.len());
        for item in items {
            leaves.push(read_path(item, &segments[1..])?.unwrap_or(Value::Null));
        }
        return Ok(Some(Value::List(leaves)));
    }

    read_path(node, &segments[1..])
}

fn write_path(obj: &mut dyn Reflect, segments: &[&str], value: &Value) -> ReflectResult<usize> {
    let td = descriptor::of_instance(obj)?;
    let member = resolver::resolve(&td, segments[0], NameKind::all(), None)
        .ok_or_else(|| not_found(&td, segments[0]))?;

    if segments.len() == 1 {
        let coerced = change_type(value.clone(), member.shape())?;
        let acc = accessor::accessor_for(&member)?;
        acc.write(obj, coerced)?;
        return Ok(1);
    }

    let field = member.field_spec().ok_or_else(|| not_traversable(&td, &member))?;
    let Some(node) = (field.get_mut)(obj.as_any_mut()) else {
        return Ok(0);
    };

    if member.is_collection() {
        let Some(items) = node.reflect_items_mut() else {
            return Ok(0);
        };
        let mut written = 0;
        for item in items {
            written += write_path(item, &segments[1..], value)?;
        }
        return Ok(written);
    }

    write_path(node, &segments[1..], value)
}

fn not_found(td: &MemberDescriptor, member: &str) -> ReflectError {
    ReflectError::MemberNotFound {
        type_name: td.name().to_string(),
        member: member.to_string(),
    }
}

fn not_traversable(
    td: &MemberDescriptor,
    member: &MemberDescriptor,
) -> ReflectError {
    ReflectError::UnsupportedMember {
        type_name: td.name().to_string(),
        member: member.name().to_string(),
        reason: format!("cannot traverse through a {:?} member", member.kind()),
    }
}

// ============================================================================
// Method invocation
// ============================================================================

/// Invoke a registered method by name and arity, coercing arguments to the
/// declared parameter shapes
pub fn call(obj: &mut dyn Reflect, name: &str, args: &[Value]) -> ReflectResult<Value> {
    let spec = obj.type_spec();
    let method = registry::methods_of(spec.id())
        .iter()
        .find(|m| m.name.eq_ignore_ascii_case(name) && (m.param_shapes)().len() == args.len())
        .ok_or_else(|| ReflectError::MemberNotFound {
            type_name: spec.short_name().to_string(),
            member: name.to_string(),
        })?;

    let shapes = (method.param_shapes)();
    let mut coerced = Vec::with_capacity(args.len());
    for (arg, shape) in args.iter().zip(&shapes) {
        coerced.push(change_type(arg.clone(), shape)?);
    }
    trace!(type_name = spec.type_path, method = method.name, "invoking method");
    Ok((method.invoke)(obj.as_any_mut(), &coerced)?)
}

// ============================================================================
// Construction
// ============================================================================

/// Construct an instance of a type through the fallback chain
///
/// In order: a registered constructor with matching arity whose parameters
/// the arguments match exactly; one with matching arity whose parameters
/// accept the coerced arguments; a registered constructor with more
/// parameters whose leading parameters match, padded with zero values; the
/// type's no-argument factory; a registered abstract-name factory; and
/// finally shape-level construction for sequences, dictionaries, choices,
/// and basic shapes.
pub fn new_instance(spec: &'static TypeSpec, args: &[Value]) -> ReflectResult<Constructed> {
    let ctors = registry::ctors_of(spec.id());

    // Exact parameter-shape matches win before any coercion is attempted
    for ctor in ctors {
        let shapes = (ctor.param_shapes)();
        if shapes.len() != args.len() {
            continue;
        }
        if args.iter().zip(&shapes).all(|(arg, shape)| arg.matches_shape(shape)) {
            if let Ok(obj) = (ctor.construct)(args) {
                debug!(type_name = spec.type_path, ctor = ctor.name, "constructed");
                return Ok(Constructed::Object(obj));
            }
        }
    }

    for ctor in ctors {
        let shapes = (ctor.param_shapes)();
        if shapes.len() != args.len() {
            continue;
        }
        if let Some(coerced) = coerce_all(args, &shapes) {
            if let Ok(obj) = (ctor.construct)(&coerced) {
                debug!(type_name = spec.type_path, ctor = ctor.name, "constructed");
                return Ok(Constructed::Object(obj));
            }
        }
    }

    // Padding needs at least one real leading argument to anchor the match
    for ctor in ctors.iter().filter(|_| !args.is_empty()) {
        let shapes = (ctor.param_shapes)();
        if shapes.len() <= args.len() {
            continue;
        }
        if let Some(mut coerced) = coerce_all(args, &shapes[..args.len()]) {
            for shape in &shapes[args.len()..] {
                coerced.push(Value::zero_of(shape));
            }
            if let Ok(obj) = (ctor.construct)(&coerced) {
                debug!(type_name = spec.type_path, ctor = ctor.name, "constructed with padding");
                return Ok(Constructed::Object(obj));
            }
        }
    }

    if args.is_empty() {
        if let Some(factory) = descriptor::default_ctor_of(spec) {
            return Ok(Constructed::Object(factory()));
        }
        if let Some(factory) = registry::impl_factory(spec.short_name())
            .or_else(|| registry::impl_factory(spec.type_path))
        {
            return Ok(Constructed::Object(factory()));
        }
    }

    let shape = (spec.shape)();
    if let Some(value) = construct_value(&shape, args) {
        return Ok(Constructed::Value(value));
    }

    Err(ReflectError::NoMatchingConstructor {
        type_name: spec.type_path.to_string(),
        args: describe_args(args),
    })
}

/// Construct by registered type name or abstract factory name
pub fn new_instance_by_name(name: &str, args: &[Value]) -> ReflectResult<Constructed> {
    if let Some(spec) = registry::lookup_name(name) {
        return new_instance(spec, args);
    }
    if args.is_empty() {
        if let Some(factory) = registry::impl_factory(name) {
            return Ok(Constructed::Object(factory()));
        }
    }
    Err(ReflectError::NoMatchingConstructor {
        type_name: name.to_string(),
        args: describe_args(args),
    })
}

/// Shape-level construction without a registered type
pub fn new_value(shape: &TypeShape, args: &[Value]) -> ReflectResult<Value> {
    construct_value(shape, args).ok_or_else(|| ReflectError::NoMatchingConstructor {
        type_name: shape.to_string(),
        args: describe_args(args),
    })
}

fn coerce_all(args: &[Value], shapes: &[TypeShape]) -> Option<Vec<Value>> {
    args.iter()
        .zip(shapes)
        .map(|(arg, shape)| change_type(arg.clone(), shape).ok())
        .collect()
}

fn construct_value(shape: &TypeShape, args: &[Value]) -> Option<Value> {
    match shape {
        TypeShape::List(elem) => {
            if args.is_empty() {
                return Some(Value::List(Vec::new()));
            }
            // A single count argument sizes the sequence with zero elements
            let count = match args {
                [Value::Int(n)] if *n >= 0 => *n as usize,
                [Value::UInt(n)] => usize::try_from(*n).ok()?,
                _ => return None,
            };
            Some(Value::List((0..count).map(|_| Value::zero_of(elem)).collect()))
        }
        TypeShape::Map { .. } if args.is_empty() => Some(Value::Map(Vec::new())),
        TypeShape::Enum { .. } => match args {
            [] => Some(Value::zero_of(shape)),
            [arg] => change_type(arg.clone(), shape).ok(),
            _ => None,
        },
        TypeShape::Struct { .. } | TypeShape::Delegate { .. } | TypeShape::Map { .. } => None,
        _ => match args {
            [] => Some(Value::zero_of(shape)),
            [arg] => change_type(arg.clone(), shape).ok(),
            _ => None,
        },
    }
}

fn describe_args(args: &[Value]) -> String {
    args.iter()
        .map(|a| format!("{:?}", a.tag()))
        .collect::<Vec<_>>()
        .join(", ")
}
