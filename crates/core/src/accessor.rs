//! Compiled member accessors
//!
//! An `Accessor` pairs the type-erased read/write entry points of one
//! property or field. Compilation validates that the member supports the
//! requested direction and caches the result by member identity, so the
//! per-call cost after the first use is a lock-free map hit plus an
//! indirect call.

use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use tracing::trace;

use crate::descriptor::{MemberDescriptor, MemberKind};
use crate::error::AccessError;
use crate::provider::MemberId;
use crate::traits::Reflect;
use crate::value::Value;

/// Compiled read/write pair for one property or field
#[derive(Clone, Copy, Debug)]
pub struct Accessor {
    read: fn(&dyn std::any::Any) -> Option<Value>,
    write: Option<fn(&mut dyn std::any::Any, Value) -> Result<(), AccessError>>,
    member_name: &'static str,
}

impl Accessor {
    /// Read the member's current value; `None` when the instance is of the
    /// wrong type
    pub fn read(&self, obj: &dyn Reflect) -> Option<Value> {
        (self.read)(obj.as_any())
    }

    /// Write a value into the member
    pub fn write(&self, obj: &mut dyn Reflect, value: Value) -> Result<(), AccessError> {
        match self.write {
            Some(write) => write(obj.as_any_mut(), value),
            None => Err(AccessError::NotSupported {
                member: self.member_name.to_string(),
                reason: "member is read-only".to_string(),
            }),
        }
    }

    pub fn can_write(&self) -> bool {
        self.write.is_some()
    }
}

static ACCESSORS: LazyLock<DashMap<MemberId, Accessor>> = LazyLock::new(DashMap::new);

/// Compile (or fetch) the accessor for a property or field descriptor
///
/// Fails for members that carry no value slot: types, methods,
/// constructors, and events.
pub fn accessor_for(member: &Arc<MemberDescriptor>) -> Result<Accessor, AccessError> {
    let field = member.field_spec().ok_or_else(|| AccessError::NotSupported {
        member: member.name().to_string(),
        reason: format!("{:?} members have no value accessors", member.kind()),
    })?;

    if matches!(member.kind(), MemberKind::Event) || !member.can_read() {
        return Err(AccessError::NotSupported {
            member: member.name().to_string(),
            reason: "member has no value form".to_string(),
        });
    }

    let id = MemberId::of_field(field);
    if let Some(existing) = ACCESSORS.get(&id) {
        return Ok(*existing);
    }

    let compiled = Accessor {
        read: field.get,
        write: field.set,
        member_name: field.name,
    };
    trace!(member = field.name, writable = compiled.can_write(), "compiled accessor");

    Ok(*ACCESSORS.entry(id).or_insert(compiled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor;
    use crate::test_fixtures::{widget_spec, Widget};

    fn member(name: &str) -> Arc<MemberDescriptor> {
        descriptor::of_type(widget_spec())
            .unwrap()
            .members()
            .iter()
            .find(|d| d.name() == name)
            .unwrap()
            .clone()
    }

    #[test]
    fn test_read_and_write_property() {
        let acc = accessor_for(&member("title")).unwrap();
        let mut w = Widget::sample();

        assert_eq!(acc.read(&w), Some(Value::Text("Sprocket".to_string())));
        acc.write(&mut w, Value::Text("Cog".to_string())).unwrap();
        assert_eq!(w.title, "Cog");
    }

    #[test]
    fn test_non_public_field_access() {
        let acc = accessor_for(&member("hidden")).unwrap();
        let mut w = Widget::sample();

        assert_eq!(acc.read(&w), Some(Value::Int(-3)));
        acc.write(&mut w, Value::Int(11)).unwrap();
        assert_eq!(w.hidden_value(), 11);
    }

    #[test]
    fn test_write_rejects_mismatched_value() {
        let acc = accessor_for(&member("id")).unwrap();
        let mut w = Widget::sample();
        let err = acc.write(&mut w, Value::Text("nope".to_string())).unwrap_err();
        assert!(matches!(err, AccessError::ValueMismatch { .. }));
    }

    #[test]
    fn test_wrong_instance_type_reads_none() {
        let acc = accessor_for(&member("id")).unwrap();
        let other = crate::test_fixtures::Gadget::default();
        assert_eq!(acc.read(&other), None);
    }

    #[test]
    fn test_event_member_has_no_accessor() {
        let err = accessor_for(&member("on_change")).unwrap_err();
        assert!(matches!(err, AccessError::NotSupported { .. }));
    }

    #[test]
    fn test_type_descriptor_has_no_accessor() {
        let td = descriptor::of_type(widget_spec()).unwrap();
        assert!(accessor_for(&td).is_err());
    }
}
