//! Member descriptors - cached wrappers around one member of a type
//!
//! A `MemberDescriptor` wraps exactly one of: the type itself, a property
//! (public field), a field (non-public), a method, a constructor, or an
//! event. Classification flags and attribute metadata are derived once at
//! construction and never change; descriptors are cached process-wide by
//! the address of their underlying spec and shared via `Arc`.
//!
//! Construction is a single forward pass: classify the value shape, extract
//! attribute markers, extract ORM metadata (type descriptors only), bind
//! accessor availability (properties/fields only). An absent marker leaves
//! its slot at the default; the only hard failure is a member shape the
//! engine does not model.
//!
//! # Performance
//!
//! - First wrap of a member: attribute + ORM scan (counted, see
//!   [`orm_scan_count`])
//! - Subsequent wraps: lock-free cache hit
//! - Copy-construction from an existing descriptor never re-scans

use std::any::TypeId;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock, OnceLock};

use dashmap::DashMap;
use tracing::{debug, trace};

use crate::classify::TypeFlags;
use crate::error::ReflectError;
use crate::provider::{CtorSpec, FieldSpec, MemberId, MethodSpec, TypeSpec};
use crate::registry;
use crate::shape::TypeShape;
use crate::traits::Reflect;

/// What a descriptor wraps
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MemberKind {
    Type,
    Property,
    Field,
    Method,
    Constructor,
    Event,
}

/// Underlying spec a descriptor was built from
#[derive(Clone, Copy)]
pub(crate) enum MemberSource {
    Type(&'static TypeSpec),
    Field {
        owner: &'static TypeSpec,
        field: &'static FieldSpec,
    },
    Method {
        owner: &'static TypeSpec,
        method: &'static MethodSpec,
    },
    Ctor {
        owner: &'static TypeSpec,
        ctor: &'static CtorSpec,
    },
}

/// Global descriptor cache keyed by the underlying spec's address
static DESCRIPTORS: LazyLock<DashMap<MemberId, Arc<MemberDescriptor>>> =
    LazyLock::new(DashMap::new);

/// Zero-argument factory cache: type identity to factory-or-absent, once
static DEFAULT_CTORS: LazyLock<DashMap<TypeId, Option<fn() -> Box<dyn Reflect>>>> =
    LazyLock::new(DashMap::new);

/// Count of attribute/ORM scan passes, for copy-construction tests
static ATTR_SCANS: AtomicUsize = AtomicUsize::new(0);

/// Number of attribute scan passes performed so far in this process
pub fn orm_scan_count() -> usize {
    ATTR_SCANS.load(Ordering::Relaxed)
}

/// Immutable wrapper describing one member with cached classification
pub struct MemberDescriptor {
    kind: MemberKind,
    name: String,
    shape: TypeShape,
    flags: TypeFlags,

    display: Option<String>,
    description: Option<String>,
    serialized: Option<String>,
    column: Option<String>,
    is_key: bool,
    is_foreign_key: bool,
    excluded: bool,

    can_read: bool,
    can_write: bool,

    /// Table/schema: the type's own markers for Type descriptors, the
    /// related type's markers for members referencing a derived type
    table: Option<String>,
    schema: Option<String>,

    /// ORM metadata, Type descriptors only
    primary_keys: Vec<Arc<MemberDescriptor>>,
    foreign_keys: Vec<Arc<MemberDescriptor>>,
    columns: Vec<Arc<MemberDescriptor>>,
    default_ctor: Option<fn() -> Box<dyn Reflect>>,

    source: MemberSource,

    // Lazily computed sub-collections
    members: OnceLock<Vec<Arc<MemberDescriptor>>>,
    properties: OnceLock<Vec<Arc<MemberDescriptor>>>,
    basic_properties: OnceLock<Vec<Arc<MemberDescriptor>>>,
    collection_properties: OnceLock<Vec<Arc<MemberDescriptor>>>,

    /// Per-type name-resolution memo (lookup string to result)
    resolutions: DashMap<String, Option<Arc<MemberDescriptor>>>,
}

// ============================================================================
// Construction entry points (cache-first)
// ============================================================================

/// Descriptor for a type, by spec
pub fn of_type(spec: &'static TypeSpec) -> Result<Arc<MemberDescriptor>, ReflectError> {
    let id = MemberId::of_type(spec);
    if let Some(existing) = DESCRIPTORS.get(&id) {
        trace!(type_path = spec.type_path, "descriptor cache hit");
        return Ok(existing.clone());
    }

    let built = Arc::new(build_type(spec)?);
    debug!(type_path = spec.type_path, "built type descriptor");

    // First insert wins; a racing builder's result is discarded
    Ok(DESCRIPTORS.entry(id).or_insert(built).clone())
}

/// Descriptor for an instance's type
pub fn of_instance(obj: &dyn Reflect) -> Result<Arc<MemberDescriptor>, ReflectError> {
    of_type(obj.type_spec())
}

/// Descriptor for one field of a type
pub fn of_field(
    owner: &'static TypeSpec,
    field: &'static FieldSpec,
) -> Result<Arc<MemberDescriptor>, ReflectError> {
    let id = MemberId::of_field(field);
    if let Some(existing) = DESCRIPTORS.get(&id) {
        return Ok(existing.clone());
    }

    let built = Arc::new(build_field(owner, field)?);
    Ok(DESCRIPTORS.entry(id).or_insert(built).clone())
}

/// Descriptor for one registered method of a type
pub fn of_method(
    owner: &'static TypeSpec,
    method: &'static MethodSpec,
) -> Result<Arc<MemberDescriptor>, ReflectError> {
    let id = MemberId::of_method(method);
    if let Some(existing) = DESCRIPTORS.get(&id) {
        return Ok(existing.clone());
    }

    let built = Arc::new(build_simple(
        MemberKind::Method,
        method.name.to_string(),
        (method.ret_shape)(),
        MemberSource::Method { owner, method },
    ));
    Ok(DESCRIPTORS.entry(id).or_insert(built).clone())
}

/// Descriptor for one registered constructor of a type
pub fn of_ctor(
    owner: &'static TypeSpec,
    ctor: &'static CtorSpec,
) -> Result<Arc<MemberDescriptor>, ReflectError> {
    let id = MemberId::of_ctor(ctor);
    if let Some(existing) = DESCRIPTORS.get(&id) {
        return Ok(existing.clone());
    }

    // A constructor's value type is its declaring type
    let built = Arc::new(build_simple(
        MemberKind::Constructor,
        owner.short_name().to_string(),
        (owner.shape)(),
        MemberSource::Ctor { owner, ctor },
    ));
    Ok(DESCRIPTORS.entry(id).or_insert(built).clone())
}

// ============================================================================
// Builders (the one-pass state machine)
// ============================================================================

fn build_type(spec: &'static TypeSpec) -> Result<MemberDescriptor, ReflectError> {
    // ClassifyValueType
    let shape = (spec.shape)();
    let flags = TypeFlags::classify(&shape);

    // ExtractAttributes (one counted scan per raw construction)
    ATTR_SCANS.fetch_add(1, Ordering::Relaxed);
    let markers = &spec.markers;

    // ExtractOrmMetadata
    let fields = spec
        .fields
        .iter()
        .map(|field| of_field(spec, field))
        .collect::<Result<Vec<_>, _>>()?;

    let primary_keys: Vec<_> = fields
        .iter()
        .filter(|d| d.kind == MemberKind::Property && d.is_key)
        .cloned()
        .collect();
    let foreign_keys: Vec<_> = fields
        .iter()
        .filter(|d| d.kind == MemberKind::Property && d.is_foreign_key)
        .cloned()
        .collect();

    // Two-tier column derivation: explicit markers first, then all public
    // basic non-collection properties not excluded
    let mut columns: Vec<_> = fields
        .iter()
        .filter(|d| d.column.is_some() || d.is_key || d.is_foreign_key)
        .cloned()
        .collect();
    if columns.is_empty() {
        columns = fields
            .iter()
            .filter(|d| {
                d.kind == MemberKind::Property
                    && d.flags.contains(TypeFlags::BASIC)
                    && !d.flags.intersects(TypeFlags::COLLECTION | TypeFlags::DICTIONARY)
                    && !d.excluded
            })
            .cloned()
            .collect();
    }

    Ok(MemberDescriptor {
        kind: MemberKind::Type,
        name: spec.short_name().to_string(),
        shape,
        flags,
        display: markers.display.map(str::to_string),
        description: markers.description.map(str::to_string),
        serialized: None,
        column: None,
        is_key: false,
        is_foreign_key: false,
        excluded: false,
        can_read: false,
        can_write: false,
        table: markers.table.map(str::to_string),
        schema: markers.schema.map(str::to_string),
        primary_keys,
        foreign_keys,
        columns,
        default_ctor: default_ctor_of(spec),
        source: MemberSource::Type(spec),
        members: OnceLock::new(),
        properties: OnceLock::new(),
        basic_properties: OnceLock::new(),
        collection_properties: OnceLock::new(),
        resolutions: DashMap::new(),
    })
}

fn build_field(
    owner: &'static TypeSpec,
    field: &'static FieldSpec,
) -> Result<MemberDescriptor, ReflectError> {
    // ClassifyValueType
    let shape = (field.shape)();
    let flags = TypeFlags::classify(&shape);

    let kind = if field.markers.event {
        // Events must carry a delegate-shaped handler; anything else is a
        // member shape the engine does not model
        if !flags.contains(TypeFlags::DELEGATE) {
            return Err(ReflectError::UnsupportedMember {
                type_name: owner.type_path.to_string(),
                member: field.name.to_string(),
                reason: format!("event handler has non-delegate shape {shape}"),
            });
        }
        MemberKind::Event
    } else if field.is_public {
        MemberKind::Property
    } else {
        MemberKind::Field
    };

    // ExtractAttributes
    ATTR_SCANS.fetch_add(1, Ordering::Relaxed);
    let markers = &field.markers;

    // Table/schema aliases come from the related derived type, if any
    let related = (field.related_spec)();
    let table = related.and_then(|r| r.markers.table).map(str::to_string);
    let schema = related.and_then(|r| r.markers.schema).map(str::to_string);

    // BindAccessors
    let value_backed = !matches!(kind, MemberKind::Event) && !flags.contains(TypeFlags::DELEGATE);
    let can_read = value_backed;
    let can_write = value_backed && field.set.is_some();

    Ok(MemberDescriptor {
        kind,
        name: field.name.to_string(),
        shape,
        flags,
        display: markers.display.map(str::to_string),
        description: markers.description.map(str::to_string),
        serialized: markers.rename.map(str::to_string),
        column: markers.column.map(str::to_string),
        is_key: markers.key,
        is_foreign_key: markers.foreign_key,
        excluded: markers.exclude,
        can_read,
        can_write,
        table,
        schema,
        primary_keys: Vec::new(),
        foreign_keys: Vec::new(),
        columns: Vec::new(),
        default_ctor: None,
        source: MemberSource::Field { owner, field },
        members: OnceLock::new(),
        properties: OnceLock::new(),
        basic_properties: OnceLock::new(),
        collection_properties: OnceLock::new(),
        resolutions: DashMap::new(),
    })
}

fn build_simple(
    kind: MemberKind,
    name: String,
    shape: TypeShape,
    source: MemberSource,
) -> MemberDescriptor {
    let flags = TypeFlags::classify(&shape);
    ATTR_SCANS.fetch_add(1, Ordering::Relaxed);

    MemberDescriptor {
        kind,
        name,
        shape,
        flags,
        display: None,
        description: None,
        serialized: None,
        column: None,
        is_key: false,
        is_foreign_key: false,
        excluded: false,
        can_read: false,
        can_write: false,
        table: None,
        schema: None,
        primary_keys: Vec::new(),
        foreign_keys: Vec::new(),
        columns: Vec::new(),
        default_ctor: None,
        source,
        members: OnceLock::new(),
        properties: OnceLock::new(),
        basic_properties: OnceLock::new(),
        collection_properties: OnceLock::new(),
        resolutions: DashMap::new(),
    }
}

/// Zero-argument factory for a type, computed once per type identity
pub fn default_ctor_of(spec: &'static TypeSpec) -> Option<fn() -> Box<dyn Reflect>> {
    *DEFAULT_CTORS
        .entry(spec.id())
        .or_insert(spec.default_ctor)
}

impl MemberDescriptor {
    /// Copy-construct from an existing descriptor
    ///
    /// Copies every derived field instead of recomputing, so wrapping a
    /// wrap yields identical classification without another attribute
    /// scan (`orm_scan_count` stays put).
    pub fn from_descriptor(other: &Arc<MemberDescriptor>) -> Arc<MemberDescriptor> {
        let members = OnceLock::new();
        if let Some(v) = other.members.get() {
            let _ = members.set(v.clone());
        }
        let properties = OnceLock::new();
        if let Some(v) = other.properties.get() {
            let _ = properties.set(v.clone());
        }
        let basic_properties = OnceLock::new();
        if let Some(v) = other.basic_properties.get() {
            let _ = basic_properties.set(v.clone());
        }
        let collection_properties = OnceLock::new();
        if let Some(v) = other.collection_properties.get() {
            let _ = collection_properties.set(v.clone());
        }

        Arc::new(MemberDescriptor {
            kind: other.kind,
            name: other.name.clone(),
            shape: other.shape.clone(),
            flags: other.flags,
            display: other.display.clone(),
            description: other.description.clone(),
            serialized: other.serialized.clone(),
            column: other.column.clone(),
            is_key: other.is_key,
            is_foreign_key: other.is_foreign_key,
            excluded: other.excluded,
            can_read: other.can_read,
            can_write: other.can_write,
            table: other.table.clone(),
            schema: other.schema.clone(),
            primary_keys: other.primary_keys.clone(),
            foreign_keys: other.foreign_keys.clone(),
            columns: other.columns.clone(),
            default_ctor: other.default_ctor,
            source: other.source,
            members,
            properties,
            basic_properties,
            collection_properties,
            resolutions: DashMap::new(),
        })
    }

    // ------------------------------------------------------------------
    // Derived data
    // ------------------------------------------------------------------

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared value shape: field/property type, method return type,
    /// constructor's declaring type, event handler type, or the type itself
    pub fn shape(&self) -> &TypeShape {
        &self.shape
    }

    pub fn flags(&self) -> TypeFlags {
        self.flags
    }

    pub fn is_basic(&self) -> bool {
        self.flags.contains(TypeFlags::BASIC)
    }

    pub fn is_collection(&self) -> bool {
        self.flags.contains(TypeFlags::COLLECTION)
    }

    pub fn is_dictionary(&self) -> bool {
        self.flags.contains(TypeFlags::DICTIONARY)
    }

    pub fn is_nullable(&self) -> bool {
        self.flags.contains(TypeFlags::NULLABLE)
    }

    pub fn can_read(&self) -> bool {
        self.can_read
    }

    pub fn can_write(&self) -> bool {
        self.can_write
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn serialized_name(&self) -> Option<&str> {
        self.serialized.as_deref()
    }

    pub fn column_name(&self) -> Option<&str> {
        self.column.as_deref()
    }

    pub fn is_primary_key(&self) -> bool {
        self.is_key
    }

    pub fn is_foreign_key(&self) -> bool {
        self.is_foreign_key
    }

    pub fn is_excluded(&self) -> bool {
        self.excluded
    }

    pub fn table_name(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn schema_name(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn primary_keys(&self) -> &[Arc<MemberDescriptor>] {
        &self.primary_keys
    }

    pub fn foreign_keys(&self) -> &[Arc<MemberDescriptor>] {
        &self.foreign_keys
    }

    pub fn columns(&self) -> &[Arc<MemberDescriptor>] {
        &self.columns
    }

    pub fn default_ctor(&self) -> Option<fn() -> Box<dyn Reflect>> {
        self.default_ctor
    }

    // ------------------------------------------------------------------
    // Source access
    // ------------------------------------------------------------------

    /// Owning or wrapped type spec
    pub fn owner_spec(&self) -> &'static TypeSpec {
        match self.source {
            MemberSource::Type(spec) => spec,
            MemberSource::Field { owner, .. }
            | MemberSource::Method { owner, .. }
            | MemberSource::Ctor { owner, .. } => owner,
        }
    }

    pub fn type_spec(&self) -> Option<&'static TypeSpec> {
        match self.source {
            MemberSource::Type(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn field_spec(&self) -> Option<&'static FieldSpec> {
        match self.source {
            MemberSource::Field { field, .. } => Some(field),
            _ => None,
        }
    }

    pub fn method_spec(&self) -> Option<&'static MethodSpec> {
        match self.source {
            MemberSource::Method { method, .. } => Some(method),
            _ => None,
        }
    }

    pub fn ctor_spec(&self) -> Option<&'static CtorSpec> {
        match self.source {
            MemberSource::Ctor { ctor, .. } => Some(ctor),
            _ => None,
        }
    }

    /// Spec of the derived type this member relates to (struct fields,
    /// collection elements, optional inners)
    pub fn related_spec(&self) -> Option<&'static TypeSpec> {
        match self.source {
            MemberSource::Type(spec) => Some(spec),
            MemberSource::Field { field, .. } => (field.related_spec)(),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Lazy sub-collections (Type descriptors; empty otherwise)
    // ------------------------------------------------------------------

    /// All members: fields in declaration order, then registered methods,
    /// constructors, with events carried by their field slots
    pub fn members(&self) -> &[Arc<MemberDescriptor>] {
        self.members.get_or_init(|| {
            let MemberSource::Type(spec) = self.source else {
                return Vec::new();
            };
            let mut all = Vec::new();
            for field in spec.fields {
                if let Ok(d) = of_field(spec, field) {
                    all.push(d);
                }
            }
            for method in registry::methods_of(spec.id()) {
                if let Ok(d) = of_method(spec, method) {
                    all.push(d);
                }
            }
            for ctor in registry::ctors_of(spec.id()) {
                if let Ok(d) = of_ctor(spec, ctor) {
                    all.push(d);
                }
            }
            all
        })
    }

    /// Public properties
    pub fn properties(&self) -> &[Arc<MemberDescriptor>] {
        self.properties.get_or_init(|| {
            self.members()
                .iter()
                .filter(|d| d.kind == MemberKind::Property)
                .cloned()
                .collect()
        })
    }

    /// Public properties with a basic value shape
    pub fn basic_properties(&self) -> &[Arc<MemberDescriptor>] {
        self.basic_properties.get_or_init(|| {
            self.properties()
                .iter()
                .filter(|d| d.flags.contains(TypeFlags::BASIC))
                .cloned()
                .collect()
        })
    }

    /// Public properties with a sequence value shape
    pub fn collection_properties(&self) -> &[Arc<MemberDescriptor>] {
        self.collection_properties.get_or_init(|| {
            self.properties()
                .iter()
                .filter(|d| d.flags.contains(TypeFlags::COLLECTION))
                .cloned()
                .collect()
        })
    }

    // ------------------------------------------------------------------
    // Resolution memo (used by the resolver)
    // ------------------------------------------------------------------

    pub(crate) fn memoized(&self, lookup: &str) -> Option<Option<Arc<MemberDescriptor>>> {
        self.resolutions.get(lookup).map(|entry| entry.clone())
    }

    pub(crate) fn memoize(&self, lookup: &str, result: Option<Arc<MemberDescriptor>>) {
        self.resolutions.insert(lookup.to_string(), result);
    }
}

impl std::fmt::Debug for MemberDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemberDescriptor")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("shape", &self.shape)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{widget_spec, Widget};

    #[test]
    fn test_type_descriptor_is_cached_and_identity_equal() {
        let a = of_type(widget_spec()).unwrap();
        let b = of_type(widget_spec()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.kind(), MemberKind::Type);
        assert_eq!(a.name(), "Widget");
    }

    #[test]
    fn test_property_vs_field_kind() {
        let td = of_type(widget_spec()).unwrap();
        let props: Vec<_> = td.properties().iter().map(|d| d.name()).collect();
        assert!(props.contains(&"id"));
        assert!(!props.contains(&"hidden"));

        let hidden = td
            .members()
            .iter()
            .find(|d| d.name() == "hidden")
            .unwrap()
            .clone();
        assert_eq!(hidden.kind(), MemberKind::Field);
        assert!(hidden.can_read());
        assert!(hidden.can_write());
    }

    #[test]
    fn test_orm_metadata() {
        let td = of_type(widget_spec()).unwrap();
        assert_eq!(td.table_name(), Some("widgets"));
        assert_eq!(td.schema_name(), Some("catalog"));

        let pk_names: Vec<_> = td.primary_keys().iter().map(|d| d.name()).collect();
        assert_eq!(pk_names, vec!["id"]);

        // Explicit markers exist, so columns are the marked members only
        let col_names: Vec<_> = td.columns().iter().map(|d| d.name()).collect();
        assert_eq!(col_names, vec!["id", "owner_id"]);
    }

    #[test]
    fn test_classification_flags_on_members() {
        let td = of_type(widget_spec()).unwrap();
        let by_name = |n: &str| {
            td.members()
                .iter()
                .find(|d| d.name() == n)
                .unwrap()
                .clone()
        };

        assert!(by_name("title").is_basic());
        assert!(by_name("price").is_nullable());
        assert!(by_name("price").is_basic());
        assert!(by_name("tags").is_collection());
        assert!(!by_name("tags").is_basic());
    }

    #[test]
    fn test_wrap_of_wrap_copies_without_rescanning() {
        let td = of_type(widget_spec()).unwrap();
        // Force the lazy collections so the copy has data to carry
        let _ = td.properties();

        let before = orm_scan_count();
        let copy = MemberDescriptor::from_descriptor(&td);
        assert_eq!(orm_scan_count(), before);

        assert_eq!(copy.kind(), td.kind());
        assert_eq!(copy.flags(), td.flags());
        assert_eq!(copy.table_name(), td.table_name());
        assert_eq!(copy.primary_keys().len(), td.primary_keys().len());
        assert_eq!(copy.properties().len(), td.properties().len());
    }

    #[test]
    fn test_event_marker_on_non_delegate_is_unsupported() {
        let err = of_type(&crate::test_fixtures::BROKEN_SPEC).unwrap_err();
        assert!(matches!(
            err,
            crate::error::ReflectError::UnsupportedMember { .. }
        ));
    }

    #[test]
    fn test_event_kind_from_delegate_field() {
        let td = of_type(widget_spec()).unwrap();
        let ev = td
            .members()
            .iter()
            .find(|d| d.name() == "on_change")
            .unwrap()
            .clone();
        assert_eq!(ev.kind(), MemberKind::Event);
        assert!(!ev.can_read());
        assert!(!ev.can_write());
    }

    #[test]
    fn test_default_ctor_cached() {
        let td = of_type(widget_spec()).unwrap();
        let ctor = td.default_ctor().expect("widget has a default ctor");
        let boxed = ctor();
        assert!(boxed.as_any().downcast_ref::<Widget>().is_some());
    }
}
