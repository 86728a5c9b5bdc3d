//! Value conversion
//!
//! `change_type` moves a value to a target shape using, in order: identity,
//! a registered custom converter for the exact (source tag, target shape)
//! pair, then the built-in table. Custom converters are matched by exact
//! pair only - no inheritance-style widening of the lookup.

use std::sync::{Arc, LazyLock};
use std::time::{Duration, UNIX_EPOCH};

use dashmap::DashMap;
use tracing::trace;

use crate::error::ConvertError;
use crate::shape::TypeShape;
use crate::value::{EnumValue, Value, ValueTag};

/// Registered conversion function
///
/// Returns `None` when the input cannot be converted; the engine surfaces
/// that as a conversion failure rather than falling through to built-ins.
pub type CustomConverter = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// Custom converter registry keyed by exact (source tag, target shape key)
static CONVERTERS: LazyLock<DashMap<(ValueTag, String), CustomConverter>> =
    LazyLock::new(DashMap::new);

/// Register a custom converter for an exact (source, target) pair
///
/// Takes precedence over the built-in table. Re-registering the same pair
/// replaces the previous converter.
pub fn add_custom_type_converter<F>(source: ValueTag, target: &TypeShape, converter: F)
where
    F: Fn(&Value) -> Option<Value> + Send + Sync + 'static,
{
    CONVERTERS.insert((source, target.key()), Arc::new(converter));
}

/// Convert a value to the target shape
///
/// `Null` converts to `Null` for optional targets and fails for any other
/// target. Errors name both sides of the failed conversion.
pub fn change_type(value: Value, target: &TypeShape) -> Result<Value, ConvertError> {
    // Identity
    if value.matches_shape(target) {
        return Ok(value);
    }

    // Exact-pair custom converter
    if let Some(converter) = CONVERTERS.get(&(value.tag(), target.key())) {
        trace!(target_shape = %target, "custom converter hit");
        return converter(&value).ok_or_else(|| ConvertError::Incompatible {
            from: format!("{:?}", value.tag()),
            to: target.key(),
        });
    }

    if value.is_null() {
        // Optional targets were already satisfied by the identity check
        return Err(ConvertError::NullValue { to: target.key() });
    }

    // Optional targets convert against the inner shape
    if let TypeShape::Optional(inner) = target {
        return change_type(value, inner);
    }

    builtin(value, target)
}

/// Non-failing variant: success flag plus converted-or-default value
pub fn try_change_type(value: Value, target: &TypeShape) -> (bool, Value) {
    match change_type(value, target) {
        Ok(converted) => (true, converted),
        Err(_) => (false, Value::zero_of(target)),
    }
}

fn incompatible(value: &Value, target: &TypeShape) -> ConvertError {
    ConvertError::Incompatible {
        from: format!("{:?}", value.tag()),
        to: target.key(),
    }
}

fn parse_error(input: &str, target: &TypeShape) -> ConvertError {
    ConvertError::Parse {
        input: input.to_string(),
        to: target.key(),
    }
}

/// Built-in conversion table
fn builtin(value: Value, target: &TypeShape) -> Result<Value, ConvertError> {
    match (&value, target) {
        // Text sources parse
        (Value::Text(s), TypeShape::Int) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| parse_error(s, target)),
        (Value::Text(s), TypeShape::UInt) => s
            .trim()
            .parse::<u64>()
            .map(Value::UInt)
            .map_err(|_| parse_error(s, target)),
        (Value::Text(s), TypeShape::Float) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| parse_error(s, target)),
        (Value::Text(s), TypeShape::Bool) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Value::Bool(true)),
            "false" | "0" | "no" | "off" => Ok(Value::Bool(false)),
            _ => Err(parse_error(s, target)),
        },
        (Value::Text(s), TypeShape::Guid) => s
            .parse()
            .map(Value::Guid)
            .map_err(|_| parse_error(s, target)),
        (Value::Text(s), TypeShape::DateTime) => s
            .trim()
            .parse::<u64>()
            .ok()
            .and_then(datetime_from_secs)
            .ok_or_else(|| parse_error(s, target)),
        (Value::Text(s), TypeShape::TimeSpan) => s
            .trim()
            .parse::<u64>()
            .map(|secs| Value::TimeSpan(Duration::from_secs(secs)))
            .map_err(|_| parse_error(s, target)),
        (Value::Text(s), TypeShape::Enum { name, variants }) => {
            enum_from_text(s, name, variants).ok_or_else(|| parse_error(s, target))
        }

        // Numeric cross-conversions
        (Value::Int(i), TypeShape::UInt) => u64::try_from(*i)
            .map(Value::UInt)
            .map_err(|_| incompatible(&value, target)),
        (Value::Int(i), TypeShape::Float) => Ok(Value::Float(*i as f64)),
        (Value::UInt(u), TypeShape::Int) => i64::try_from(*u)
            .map(Value::Int)
            .map_err(|_| incompatible(&value, target)),
        (Value::UInt(u), TypeShape::Float) => Ok(Value::Float(*u as f64)),
        (Value::Float(f), TypeShape::Int) => {
            if f.is_finite() && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                Ok(Value::Int(f.trunc() as i64))
            } else {
                Err(incompatible(&value, target))
            }
        }
        (Value::Float(f), TypeShape::UInt) => {
            if f.is_finite() && *f >= 0.0 && *f <= u64::MAX as f64 {
                Ok(Value::UInt(f.trunc() as u64))
            } else {
                Err(incompatible(&value, target))
            }
        }

        // Numeric / boolean bridges
        (Value::Int(i), TypeShape::Bool) => Ok(Value::Bool(*i != 0)),
        (Value::UInt(u), TypeShape::Bool) => Ok(Value::Bool(*u != 0)),
        (Value::Bool(b), TypeShape::Int) => Ok(Value::Int(i64::from(*b))),
        (Value::Bool(b), TypeShape::UInt) => Ok(Value::UInt(u64::from(*b))),
        (Value::Bool(b), TypeShape::Float) => Ok(Value::Float(f64::from(u8::from(*b)))),

        // Numeric ordinals address enums
        (Value::Int(i), TypeShape::Enum { name, variants }) => u64::try_from(*i)
            .ok()
            .and_then(|ord| enum_from_ordinal(ord, name, variants))
            .ok_or_else(|| incompatible(&value, target)),
        (Value::UInt(u), TypeShape::Enum { name, variants }) => {
            enum_from_ordinal(*u, name, variants).ok_or_else(|| incompatible(&value, target))
        }

        // Date/time bridges (unix seconds)
        (Value::Int(i), TypeShape::DateTime) => u64::try_from(*i)
            .ok()
            .and_then(datetime_from_secs)
            .ok_or_else(|| incompatible(&value, target)),
        (Value::UInt(u), TypeShape::DateTime) => {
            datetime_from_secs(*u).ok_or_else(|| incompatible(&value, target))
        }
        (Value::UInt(u), TypeShape::TimeSpan) => Ok(Value::TimeSpan(Duration::from_secs(*u))),
        (Value::Int(i), TypeShape::TimeSpan) => u64::try_from(*i)
            .map(|secs| Value::TimeSpan(Duration::from_secs(secs)))
            .map_err(|_| incompatible(&value, target)),
        (Value::DateTime(t), TypeShape::UInt) => t
            .duration_since(UNIX_EPOCH)
            .map(|d| Value::UInt(d.as_secs()))
            .map_err(|_| incompatible(&value, target)),
        (Value::DateTime(t), TypeShape::Int) => t
            .duration_since(UNIX_EPOCH)
            .ok()
            .and_then(|d| i64::try_from(d.as_secs()).ok())
            .map(Value::Int)
            .ok_or_else(|| incompatible(&value, target)),
        (Value::TimeSpan(d), TypeShape::UInt) => Ok(Value::UInt(d.as_secs())),

        // Everything basic formats as text
        (Value::Bool(b), TypeShape::Text) => Ok(Value::Text(b.to_string())),
        (Value::Int(i), TypeShape::Text) => Ok(Value::Text(i.to_string())),
        (Value::UInt(u), TypeShape::Text) => Ok(Value::Text(u.to_string())),
        (Value::Float(f), TypeShape::Text) => Ok(Value::Text(f.to_string())),
        (Value::Guid(g), TypeShape::Text) => Ok(Value::Text(g.to_string())),
        (Value::Enum(ev), TypeShape::Text) => Ok(Value::Text(ev.variant.clone())),
        (Value::DateTime(t), TypeShape::Text) => t
            .duration_since(UNIX_EPOCH)
            .map(|d| Value::Text(d.as_secs().to_string()))
            .map_err(|_| incompatible(&value, target)),
        (Value::TimeSpan(d), TypeShape::Text) => Ok(Value::Text(d.as_secs().to_string())),

        // Enum re-homing and ordinal extraction
        (Value::Enum(ev), TypeShape::Enum { name, variants }) => {
            enum_from_text(&ev.variant, name, variants)
                .ok_or_else(|| incompatible(&value, target))
        }
        (Value::Enum(ev), TypeShape::Int) => i64::try_from(ev.ordinal)
            .map(Value::Int)
            .map_err(|_| incompatible(&value, target)),
        (Value::Enum(ev), TypeShape::UInt) => Ok(Value::UInt(ev.ordinal)),

        // Sequence composites convert element-wise
        (Value::List(items), TypeShape::List(elem)) => items
            .iter()
            .map(|item| change_type(item.clone(), elem))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        (Value::List(items), TypeShape::Tuple(shapes)) if items.len() == shapes.len() => items
            .iter()
            .zip(shapes.iter())
            .map(|(item, s)| change_type(item.clone(), s))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Tuple),
        (Value::Tuple(items), TypeShape::Tuple(shapes)) if items.len() == shapes.len() => items
            .iter()
            .zip(shapes.iter())
            .map(|(item, s)| change_type(item.clone(), s))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Tuple),
        (Value::Tuple(items), TypeShape::List(elem)) => items
            .iter()
            .map(|item| change_type(item.clone(), elem))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),

        _ => Err(incompatible(&value, target)),
    }
}

/// Unix seconds to a datetime value; `None` when the platform clock type
/// cannot represent the instant
fn datetime_from_secs(secs: u64) -> Option<Value> {
    UNIX_EPOCH
        .checked_add(Duration::from_secs(secs))
        .map(Value::DateTime)
}

fn enum_from_text(input: &str, name: &str, variants: &[String]) -> Option<Value> {
    let trimmed = input.trim();
    if let Some(ordinal) = variants
        .iter()
        .position(|v| v.eq_ignore_ascii_case(trimmed))
    {
        return Some(Value::Enum(EnumValue {
            type_name: name.to_string(),
            variant: variants[ordinal].clone(),
            ordinal: ordinal as u64,
        }));
    }
    // Numeric strings address by ordinal
    trimmed
        .parse::<u64>()
        .ok()
        .and_then(|ord| enum_from_ordinal(ord, name, variants))
}

fn enum_from_ordinal(ordinal: u64, name: &str, variants: &[String]) -> Option<Value> {
    let variant = variants.get(usize::try_from(ordinal).ok()?)?;
    Some(Value::Enum(EnumValue {
        type_name: name.to_string(),
        variant: variant.clone(),
        ordinal,
    }))
}
