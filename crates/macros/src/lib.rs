//! Reflekt Proc Macros
//!
//! This crate provides the proc macros for the reflekt engine:
//!
//! - `#[derive(Reflect)]` - Emit static member metadata for a type
//! - `#[reflect_impl]` - Register an impl block's methods and constructors
//!
//! # Reflect Example
//!
//! ```ignore
//! use reflekt_core::Reflect;
//!
//! #[derive(Reflect, Default)]
//! #[reflect(table = "users", schema = "auth", default)]
//! pub struct User {
//!     #[reflect(key, column = "user_id")]
//!     pub id: u64,
//!
//!     #[reflect(display = "E-mail address", rename = "email")]
//!     pub email_address: String,
//!
//!     #[reflect(exclude)]
//!     pub sessions: Vec<String>,
//!
//!     secret: String,
//! }
//!
//! // Generated: a static TypeSpec with one FieldSpec per field, plus
//! // Reflect, ReflectValue, and ReflectType implementations. Public
//! // fields surface as properties, non-public ones as fields.
//! ```
//!
//! # reflect_impl Example
//!
//! ```ignore
//! use reflekt_core::reflect_impl;
//!
//! #[reflect_impl]
//! impl User {
//!     pub fn new(id: u64) -> Self {
//!         Self { id, ..Default::default() }
//!     }
//!
//!     pub fn promote(&mut self, level: u32) -> bool {
//!         level > 0
//!     }
//! }
//!
//! // Generated:
//! // - user_reflect_register() - register the type, its methods, and
//! //   its constructors with the registry
//! ```
//!
//! # Attributes
//!
//! ## Type Attributes (Reflect)
//!
//! - `#[reflect(display = "...")]` / `#[reflect(description = "...")]`
//! - `#[reflect(table)]` or `#[reflect(table = "name")]` - Storage table;
//!   the bare form resolves to the type name.
//! - `#[reflect(schema = "name")]` - Storage schema.
//! - `#[reflect(default)]` - Emit a no-argument factory via `Default`.
//!
//! ## Field Attributes (Reflect)
//!
//! - `#[reflect(key)]` / `#[reflect(foreign_key)]` - ORM key markers.
//! - `#[reflect(column = "name")]` - Storage column name.
//! - `#[reflect(rename = "name")]` - Serialization name.
//! - `#[reflect(display = "...")]` / `#[reflect(description = "...")]`
//! - `#[reflect(exclude)]` - Keep out of derived column sets.
//! - `#[reflect(readonly)]` - No setter is emitted.
//! - `#[reflect(event)]` - Delegate-shaped event slot.

mod parse;
mod reflect_impl;
mod reflect_type;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput, ItemImpl};

/// Derive macro emitting static member metadata
///
/// Supports structs with named fields and unit-variant enums. The emitted
/// `TypeSpec` carries one `FieldSpec` per field with type-erased accessor
/// functions, so the engine can read, write, and traverse members without
/// knowing the concrete type.
///
/// Field types must implement `ReflectValue`; the core crate covers the
/// built-in scalars, `String`, `Option<T>`, `Vec<T>`, maps, tuples, and
/// fn-pointer delegates, and this derive covers user types.
#[proc_macro_derive(Reflect, attributes(reflect))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    reflect_type::derive_reflect(input).into()
}

/// Attribute macro registering an impl block's methods and constructors
///
/// The impl block is re-emitted unchanged. Every public function with a
/// `&self`/`&mut self` receiver becomes a registered method; every public
/// receiver-less function returning `Self` becomes a registered
/// constructor. A `{type}_reflect_register()` function is generated that
/// registers the type and both tables.
///
/// Functions taking `self` by value and generic impls are rejected.
#[proc_macro_attribute]
pub fn reflect_impl(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let item = parse_macro_input!(item as ItemImpl);
    reflect_impl::generate_reflect_impl(item).into()
}
