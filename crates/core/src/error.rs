//! Error types for the introspection engine
//!
//! Resolution misses are `Option`-shaped and never surface as errors; the
//! variants here cover the conditions the facade must report explicitly:
//! unresolved members at the top-level get/set surface, failed conversions,
//! exhausted constructor fallbacks, and member shapes the engine does not
//! model.

/// Error type for facade-level operations
#[derive(Debug, thiserror::Error)]
pub enum ReflectError {
    /// A path segment or member name did not resolve on the target type
    #[error("Member not found: {type_name}.{member}")]
    MemberNotFound { type_name: String, member: String },

    /// The wrapped member is of a kind the engine does not model
    #[error("Unsupported member kind: {type_name}.{member} ({reason})")]
    UnsupportedMember {
        type_name: String,
        member: String,
        reason: String,
    },

    /// Every constructor fallback was exhausted
    #[error("No matching constructor for {type_name} with arguments ({args})")]
    NoMatchingConstructor { type_name: String, args: String },

    /// Value conversion failed
    #[error(transparent)]
    Convert(#[from] ConvertError),

    /// Compiled accessor rejected the operation
    #[error(transparent)]
    Access(#[from] AccessError),
}

/// Error type for value conversion
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConvertError {
    /// No identity, custom, or built-in conversion applies
    #[error("Cannot convert {from} to {to}")]
    Incompatible { from: String, to: String },

    /// Null input for a non-nullable target shape
    #[error("Cannot convert null to non-nullable {to}")]
    NullValue { to: String },

    /// Textual input could not be parsed as the target shape
    #[error("Failed to parse {input:?} as {to}")]
    Parse { input: String, to: String },
}

/// Error type for compiled accessor operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AccessError {
    /// The member cannot support the requested accessor
    #[error("Accessor not supported for {member}: {reason}")]
    NotSupported { member: String, reason: String },

    /// The instance passed to a compiled accessor is of the wrong type
    #[error("Instance is not a {expected}")]
    WrongInstanceType { expected: &'static str },

    /// A value reached a typed slot it cannot populate
    #[error("Value does not fit member {member} (expected {expected})")]
    ValueMismatch { member: String, expected: String },
}

/// Result type for facade operations
pub type ReflectResult<T> = Result<T, ReflectError>;
