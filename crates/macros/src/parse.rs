//! Attribute parsing for the Reflect derive macro

use darling::util::Override;
use darling::{FromDeriveInput, FromField, FromVariant};
use syn::{DeriveInput, Generics, Ident, Type, Visibility};

/// Parsed #[reflect(...)] attributes on the type
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(reflect), supports(struct_named, enum_unit))]
pub struct ReflectTypeArgs {
    /// Type identifier
    pub ident: Ident,

    /// Type visibility
    pub vis: Visibility,

    pub generics: Generics,

    /// Struct fields or enum variants
    pub data: darling::ast::Data<ReflectVariantArgs, ReflectFieldArgs>,

    /// Human-readable display name
    #[darling(default)]
    pub display: Option<String>,

    /// Free-form description
    #[darling(default)]
    pub description: Option<String>,

    /// Storage table name; bare `table` resolves to the type name
    #[darling(default)]
    pub table: Option<Override<String>>,

    /// Storage schema name
    #[darling(default)]
    pub schema: Option<String>,

    /// Emit a no-argument factory via `Default`
    #[darling(default)]
    pub default: bool,
}

impl ReflectTypeArgs {
    /// The table name after resolving a bare marker to the type name
    pub fn table_name(&self) -> Option<String> {
        self.table
            .as_ref()
            .map(|t| t.clone().unwrap_or_else(|| self.ident.to_string()))
    }
}

/// Parsed #[reflect(...)] attributes on a field
#[derive(Debug, FromField)]
#[darling(attributes(reflect))]
pub struct ReflectFieldArgs {
    /// Field identifier
    pub ident: Option<Ident>,

    /// Field type
    pub ty: Type,

    /// Field visibility; `pub` fields surface as properties
    pub vis: Visibility,

    /// Human-readable display name
    #[darling(default)]
    pub display: Option<String>,

    /// Free-form description
    #[darling(default)]
    pub description: Option<String>,

    /// Serialization name
    #[darling(default)]
    pub rename: Option<String>,

    /// Storage column name
    #[darling(default)]
    pub column: Option<String>,

    /// Primary key member
    #[darling(default)]
    pub key: bool,

    /// Foreign key member
    #[darling(default)]
    pub foreign_key: bool,

    /// Exclude from derived column sets
    #[darling(default)]
    pub exclude: bool,

    /// No setter is emitted
    #[darling(default)]
    pub readonly: bool,

    /// Delegate-shaped event slot
    #[darling(default)]
    pub event: bool,
}

impl ReflectFieldArgs {
    pub fn is_public(&self) -> bool {
        matches!(self.vis, Visibility::Public(_))
    }

    /// Whether a setter is emitted for this field
    pub fn is_writable(&self) -> bool {
        !self.readonly && !self.event
    }
}

/// Parsed attributes on a unit enum variant
#[derive(Debug, FromVariant)]
#[darling(attributes(reflect))]
pub struct ReflectVariantArgs {
    pub ident: Ident,

    /// Serialization name for the variant
    #[darling(default)]
    pub rename: Option<String>,
}

impl ReflectVariantArgs {
    /// Name the variant is carried under in enum values
    pub fn value_name(&self) -> String {
        self.rename.clone().unwrap_or_else(|| self.ident.to_string())
    }
}

/// Parse a DeriveInput into ReflectTypeArgs
pub fn parse_reflect_type(input: &DeriveInput) -> darling::Result<ReflectTypeArgs> {
    ReflectTypeArgs::from_derive_input(input)
}
