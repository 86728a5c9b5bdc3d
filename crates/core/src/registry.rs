//! Type registry - centralized lookup for reflectable types
//!
//! Stores the derived specs, registered method/constructor tables, and the
//! abstract-name construction factories. Types register explicitly (the
//! generated `*_reflect_register()` functions call in here); instance-based
//! operations never require registration, only name-based lookup and
//! construction do.

use std::any::TypeId;
use std::sync::LazyLock;

use dashmap::DashMap;
use tracing::debug;

use crate::provider::{CtorSpec, MethodSpec, ReflectType, TypeSpec};
use crate::traits::Reflect;

/// Registered specs keyed by type identity
static TYPES: LazyLock<DashMap<TypeId, &'static TypeSpec>> = LazyLock::new(DashMap::new);

/// Name index: full path and bare type name both resolve
static TYPE_NAMES: LazyLock<DashMap<String, TypeId>> = LazyLock::new(DashMap::new);

/// Method/constructor tables keyed by type identity
static METHODS: LazyLock<DashMap<TypeId, &'static [MethodSpec]>> = LazyLock::new(DashMap::new);
static CTORS: LazyLock<DashMap<TypeId, &'static [CtorSpec]>> = LazyLock::new(DashMap::new);

/// Construction factories for abstract type names (interface to
/// implementation substitution)
static IMPL_FACTORIES: LazyLock<DashMap<String, fn() -> Box<dyn Reflect>>> =
    LazyLock::new(DashMap::new);

// ============================================================================
// Mutation APIs
// ============================================================================

/// Register a derived type for name-based lookup and construction
pub fn register<T: ReflectType>() {
    let spec = T::SPEC;
    let id = spec.id();
    TYPES.insert(id, spec);
    TYPE_NAMES.insert(spec.type_path.to_string(), id);
    TYPE_NAMES.insert(spec.short_name().to_string(), id);
    debug!(type_path = spec.type_path, "registered type");
}

/// Attach method and constructor tables to a registered type
///
/// Called by generated `*_reflect_register()` functions. Must run before
/// the type's descriptor is first resolved - descriptors are immutable once
/// cached.
pub fn register_members(
    id: TypeId,
    methods: &'static [MethodSpec],
    ctors: &'static [CtorSpec],
) {
    METHODS.insert(id, methods);
    CTORS.insert(id, ctors);
}

/// Register a factory producing a concrete instance for an abstract name
///
/// Consulted by `new_instance` when a type has no usable constructor, so
/// callers can construct against an interface-like name.
pub fn register_impl_factory(name: &str, factory: fn() -> Box<dyn Reflect>) {
    IMPL_FACTORIES.insert(name.to_string(), factory);
}

// ============================================================================
// Query APIs
// ============================================================================

/// Look up a registered spec by full path or bare type name
pub fn lookup_name(name: &str) -> Option<&'static TypeSpec> {
    let id = TYPE_NAMES.get(name)?;
    TYPES.get(&id).map(|spec| *spec)
}

/// Look up a registered spec by type identity
pub fn lookup_id(id: TypeId) -> Option<&'static TypeSpec> {
    TYPES.get(&id).map(|spec| *spec)
}

/// Registered methods of a type (empty when none were registered)
pub fn methods_of(id: TypeId) -> &'static [MethodSpec] {
    METHODS.get(&id).map(|m| *m).unwrap_or(&[])
}

/// Registered constructors of a type (empty when none were registered)
pub fn ctors_of(id: TypeId) -> &'static [CtorSpec] {
    CTORS.get(&id).map(|c| *c).unwrap_or(&[])
}

/// Factory for an abstract type name, if one was registered
pub fn impl_factory(name: &str) -> Option<fn() -> Box<dyn Reflect>> {
    IMPL_FACTORIES.get(name).map(|f| *f)
}

/// Number of registered types
pub fn registered_count() -> usize {
    TYPES.len()
}
