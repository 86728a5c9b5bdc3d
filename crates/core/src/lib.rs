//! Reflekt - runtime member introspection and fast access
//!
//! This crate is the engine behind `#[derive(Reflect)]`: it classifies
//! member value shapes, compiles cached accessors, resolves member names
//! through structural and attribute-alias tiers, converts values between
//! shapes, and constructs instances through a fallback chain. Metadata is
//! emitted at compile time by the derive macros and consumed here through
//! type-erased static tables, so no operation ever touches a concrete type
//! it was not handed.
//!
//! # Layers
//!
//! - [`shape`] / [`classify`] - value shape model and classification flags
//! - [`value`] - the type-erased value model and shape conversion
//! - [`provider`] / [`registry`] - derive-emitted metadata and registration
//! - [`descriptor`] - cached member descriptors with ORM metadata
//! - [`accessor`] / [`resolver`] - compiled access and name resolution
//! - [`object`] - the generic get/set/call/construct facade

// Allow the crate to refer to itself as `reflekt_core` for proc macro compatibility
extern crate self as reflekt_core;

pub mod accessor;
pub mod classify;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod object;
pub mod provider;
pub mod registry;
pub mod resolver;
pub mod shape;
pub mod traits;
pub mod value;

#[cfg(test)]
pub mod test_fixtures;

// Re-export commonly used items
pub use accessor::{accessor_for, Accessor};
pub use classify::TypeFlags;
pub use config::{engine_config, set_engine_config, ConfigError, EngineConfig, ResolverSection};
pub use descriptor::{orm_scan_count, MemberDescriptor, MemberKind};
pub use error::{AccessError, ConvertError, ReflectError, ReflectResult};
pub use object::{
    call, get, get_path, new_instance, new_instance_by_name, new_value, set, set_path, Constructed,
};
pub use provider::{CtorSpec, FieldSpec, MemberId, MethodSpec, ReflectType, TypeSpec};
pub use resolver::{resolve, resolve_path, NameKind};
pub use shape::TypeShape;
pub use traits::{Reflect, ReflectValue};
pub use value::{
    add_custom_type_converter, change_type, try_change_type, Bytes, EnumValue, Guid, Value,
    ValueTag,
};

// Re-export macros
pub use reflekt_macros::{reflect_impl, Reflect};
