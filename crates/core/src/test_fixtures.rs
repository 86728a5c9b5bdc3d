//! Hand-written provider metadata for unit tests
//!
//! Mirrors what the derive macros emit, spelled out by hand so the core
//! crate's tests run without the macro crate in the loop. `Widget` carries
//! the full marker surface; `Gadget` nests widgets for traversal tests and
//! has no markers at all, exercising the column fallback tier.

use std::any::{Any, TypeId};

use crate::error::AccessError;
use crate::provider::{
    CtorSpec, FieldMarkers, FieldSpec, MethodSpec, ReflectType, TypeMarkers, TypeSpec,
};
use crate::registry;
use crate::shape::TypeShape;
use crate::traits::{Reflect, ReflectValue};
use crate::value::Value;

// field_accessors: one module of generated-style accessor fns per field
macro_rules! field_accessors {
    ($owner:ty => $( $field:ident : $fty:ty ),+ $(,)?) => {
        $(
            pub mod $field {
                #[allow(unused_imports)]
                use super::*;

                use std::any::Any;

                use crate::error::AccessError;
                use crate::provider::TypeSpec;
                use crate::shape::TypeShape;
                use crate::traits::{Reflect, ReflectValue};
                use crate::value::Value;

                pub fn get(any: &dyn Any) -> Option<Value> {
                    any.downcast_ref::<$owner>()?.$field.to_value()
                }

                pub fn set(any: &mut dyn Any, value: Value) -> Result<(), AccessError> {
                    let obj = any.downcast_mut::<$owner>().ok_or(
                        AccessError::WrongInstanceType {
                            expected: stringify!($owner),
                        },
                    )?;
                    obj.$field = <$fty as ReflectValue>::from_value(&value).ok_or_else(|| {
                        AccessError::ValueMismatch {
                            member: stringify!($field).to_string(),
                            expected: <$fty as ReflectValue>::shape().to_string(),
                        }
                    })?;
                    Ok(())
                }

                pub fn get_ref(any: &dyn Any) -> Option<&dyn Reflect> {
                    any.downcast_ref::<$owner>()?.$field.as_reflect()
                }

                pub fn get_mut(any: &mut dyn Any) -> Option<&mut dyn Reflect> {
                    any.downcast_mut::<$owner>()?.$field.as_reflect_mut()
                }

                pub fn shape() -> TypeShape {
                    <$fty as ReflectValue>::shape()
                }

                pub fn related() -> Option<&'static TypeSpec> {
                    <$fty as ReflectValue>::declared_spec()
                }
            }
        )+
    };
}

const NO_MARKERS: FieldMarkers = FieldMarkers {
    display: None,
    description: None,
    rename: None,
    column: None,
    key: false,
    foreign_key: false,
    exclude: false,
    readonly: false,
    event: false,
};

// ============================================================================
// Widget: full marker surface
// ============================================================================

pub struct Widget {
    pub id: u64,
    pub owner_id: u64,
    pub title: String,
    pub price: Option<f64>,
    pub tags: Vec<String>,
    hidden: i32,
    pub on_change: fn(i64),
}

fn noop_change(_: i64) {}

impl Default for Widget {
    fn default() -> Self {
        Self {
            id: 0,
            owner_id: 0,
            title: String::new(),
            price: None,
            tags: Vec::new(),
            hidden: 0,
            on_change: noop_change,
        }
    }
}

impl Widget {
    pub fn sample() -> Self {
        Self {
            id: 7,
            owner_id: 40,
            title: "Sprocket".to_string(),
            price: Some(9.5),
            tags: vec!["new".to_string(), "sale".to_string()],
            hidden: -3,
            on_change: noop_change,
        }
    }

    pub fn hidden_value(&self) -> i32 {
        self.hidden
    }
}

mod widget_fields {
    use super::Widget;

    field_accessors!(Widget =>
        id: u64,
        owner_id: u64,
        title: String,
        price: Option<f64>,
        tags: Vec<String>,
        hidden: i32,
        on_change: fn(i64),
    );
}

fn widget_shape() -> TypeShape {
    <Widget as ReflectValue>::shape()
}

fn widget_default() -> Box<dyn Reflect> {
    Box::new(Widget::default())
}

static WIDGET_FIELDS: [FieldSpec; 7] = [
    FieldSpec {
        name: "id",
        is_public: true,
        shape: widget_fields::id::shape,
        markers: FieldMarkers {
            key: true,
            column: Some("widget_id"),
            ..NO_MARKERS
        },
        get: widget_fields::id::get,
        set: Some(widget_fields::id::set),
        get_ref: widget_fields::id::get_ref,
        get_mut: widget_fields::id::get_mut,
        related_spec: widget_fields::id::related,
    },
    FieldSpec {
        name: "owner_id",
        is_public: true,
        shape: widget_fields::owner_id::shape,
        markers: FieldMarkers {
            foreign_key: true,
            ..NO_MARKERS
        },
        get: widget_fields::owner_id::get,
        set: Some(widget_fields::owner_id::set),
        get_ref: widget_fields::owner_id::get_ref,
        get_mut: widget_fields::owner_id::get_mut,
        related_spec: widget_fields::owner_id::related,
    },
    FieldSpec {
        name: "title",
        is_public: true,
        shape: widget_fields::title::shape,
        markers: FieldMarkers {
            display: Some("Widget Title"),
            rename: Some("titleText"),
            ..NO_MARKERS
        },
        get: widget_fields::title::get,
        set: Some(widget_fields::title::set),
        get_ref: widget_fields::title::get_ref,
        get_mut: widget_fields::title::get_mut,
        related_spec: widget_fields::title::related,
    },
    FieldSpec {
        name: "price",
        is_public: true,
        shape: widget_fields::price::shape,
        markers: NO_MARKERS,
        get: widget_fields::price::get,
        set: Some(widget_fields::price::set),
        get_ref: widget_fields::price::get_ref,
        get_mut: widget_fields::price::get_mut,
        related_spec: widget_fields::price::related,
    },
    FieldSpec {
        name: "tags",
        is_public: true,
        shape: widget_fields::tags::shape,
        markers: NO_MARKERS,
        get: widget_fields::tags::get,
        set: Some(widget_fields::tags::set),
        get_ref: widget_fields::tags::get_ref,
        get_mut: widget_fields::tags::get_mut,
        related_spec: widget_fields::tags::related,
    },
    FieldSpec {
        name: "hidden",
        is_public: false,
        shape: widget_fields::hidden::shape,
        markers: NO_MARKERS,
        get: widget_fields::hidden::get,
        set: Some(widget_fields::hidden::set),
        get_ref: widget_fields::hidden::get_ref,
        get_mut: widget_fields::hidden::get_mut,
        related_spec: widget_fields::hidden::related,
    },
    FieldSpec {
        name: "on_change",
        is_public: true,
        shape: widget_fields::on_change::shape,
        markers: FieldMarkers {
            event: true,
            ..NO_MARKERS
        },
        get: widget_fields::on_change::get,
        set: None,
        get_ref: widget_fields::on_change::get_ref,
        get_mut: widget_fields::on_change::get_mut,
        related_spec: widget_fields::on_change::related,
    },
];

pub static WIDGET_SPEC: TypeSpec = TypeSpec {
    type_path: "reflekt_core::test_fixtures::Widget",
    type_id: TypeId::of::<Widget>,
    shape: widget_shape,
    markers: TypeMarkers {
        display: Some("Widget"),
        description: Some("A test widget"),
        table: Some("widgets"),
        schema: Some("catalog"),
    },
    fields: &WIDGET_FIELDS,
    default_ctor: Some(widget_default),
};

impl ReflectValue for Widget {
    fn shape() -> TypeShape {
        TypeShape::Struct {
            name: "Widget".to_string(),
        }
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::Map(vec![
            (Value::Text("id".to_string()), self.id.to_value()?),
            (Value::Text("owner_id".to_string()), self.owner_id.to_value()?),
            (Value::Text("title".to_string()), self.title.to_value()?),
            (Value::Text("price".to_string()), self.price.to_value()?),
            (Value::Text("tags".to_string()), self.tags.to_value()?),
        ]))
    }

    fn from_value(_value: &Value) -> Option<Self> {
        None
    }

    fn as_reflect(&self) -> Option<&dyn Reflect> {
        Some(self)
    }

    fn as_reflect_mut(&mut self) -> Option<&mut dyn Reflect> {
        Some(self)
    }

    fn declared_spec() -> Option<&'static TypeSpec> {
        Some(&WIDGET_SPEC)
    }
}

impl Reflect for Widget {
    fn type_spec(&self) -> &'static TypeSpec {
        &WIDGET_SPEC
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl ReflectType for Widget {
    const SPEC: &'static TypeSpec = &WIDGET_SPEC;
}

pub fn widget_spec() -> &'static TypeSpec {
    &WIDGET_SPEC
}

// ----------------------------------------------------------------------------
// Widget methods and constructors (generated-style tables)
// ----------------------------------------------------------------------------

fn no_params() -> Vec<TypeShape> {
    Vec::new()
}

fn text_param() -> Vec<TypeShape> {
    vec![TypeShape::Text]
}

fn float_param() -> Vec<TypeShape> {
    vec![TypeShape::Float]
}

fn uint_param() -> Vec<TypeShape> {
    vec![TypeShape::UInt]
}

fn uint_text_params() -> Vec<TypeShape> {
    vec![TypeShape::UInt, TypeShape::Text]
}

fn float_shape() -> TypeShape {
    TypeShape::Float
}

fn unit_shape() -> TypeShape {
    TypeShape::Unit
}

fn invoke_rename(any: &mut dyn Any, args: &[Value]) -> Result<Value, AccessError> {
    let obj = any
        .downcast_mut::<Widget>()
        .ok_or(AccessError::WrongInstanceType { expected: "Widget" })?;
    let Some(Value::Text(title)) = args.first() else {
        return Err(AccessError::ValueMismatch {
            member: "rename".to_string(),
            expected: "text".to_string(),
        });
    };
    obj.title = title.clone();
    Ok(Value::Unit)
}

fn invoke_total(any: &mut dyn Any, args: &[Value]) -> Result<Value, AccessError> {
    let obj = any
        .downcast_mut::<Widget>()
        .ok_or(AccessError::WrongInstanceType { expected: "Widget" })?;
    let Some(Value::Float(tax)) = args.first() else {
        return Err(AccessError::ValueMismatch {
            member: "total".to_string(),
            expected: "float".to_string(),
        });
    };
    Ok(Value::Float(obj.price.unwrap_or(0.0) * (1.0 + tax)))
}

static WIDGET_METHODS: [MethodSpec; 2] = [
    MethodSpec {
        name: "rename",
        ret_shape: unit_shape,
        param_shapes: text_param,
        invoke: invoke_rename,
    },
    MethodSpec {
        name: "total",
        ret_shape: float_shape,
        param_shapes: float_param,
        invoke: invoke_total,
    },
];

fn construct_with_id(args: &[Value]) -> Result<Box<dyn Reflect>, AccessError> {
    let Some(Value::UInt(id)) = args.first() else {
        return Err(AccessError::ValueMismatch {
            member: "with_id".to_string(),
            expected: "uint".to_string(),
        });
    };
    Ok(Box::new(Widget {
        id: *id,
        ..Widget::default()
    }))
}

fn construct_with_id_title(args: &[Value]) -> Result<Box<dyn Reflect>, AccessError> {
    let (Some(Value::UInt(id)), Some(Value::Text(title))) = (args.first(), args.get(1)) else {
        return Err(AccessError::ValueMismatch {
            member: "with_id_title".to_string(),
            expected: "uint, text".to_string(),
        });
    };
    Ok(Box::new(Widget {
        id: *id,
        title: title.clone(),
        ..Widget::default()
    }))
}

static WIDGET_CTORS: [CtorSpec; 2] = [
    CtorSpec {
        name: "with_id",
        param_shapes: uint_param,
        construct: construct_with_id,
    },
    CtorSpec {
        name: "with_id_title",
        param_shapes: uint_text_params,
        construct: construct_with_id_title,
    },
];

// ============================================================================
// Gadget: no markers, nested widgets
// ============================================================================

#[derive(Default)]
pub struct Gadget {
    pub name: String,
    pub widget: Widget,
    pub widgets: Vec<Widget>,
    pub maybe: Option<Widget>,
}

impl Gadget {
    pub fn sample() -> Self {
        Self {
            name: "Assembly".to_string(),
            widget: Widget::sample(),
            widgets: vec![Widget::sample(), Widget::default()],
            maybe: None,
        }
    }
}

mod gadget_fields {
    use super::{Gadget, Widget};

    field_accessors!(Gadget =>
        name: String,
        widget: Widget,
        widgets: Vec<Widget>,
        maybe: Option<Widget>,
    );
}

fn gadget_shape() -> TypeShape {
    <Gadget as ReflectValue>::shape()
}

fn gadget_default() -> Box<dyn Reflect> {
    Box::new(Gadget::default())
}

static GADGET_FIELDS: [FieldSpec; 4] = [
    FieldSpec {
        name: "name",
        is_public: true,
        shape: gadget_fields::name::shape,
        markers: NO_MARKERS,
        get: gadget_fields::name::get,
        set: Some(gadget_fields::name::set),
        get_ref: gadget_fields::name::get_ref,
        get_mut: gadget_fields::name::get_mut,
        related_spec: gadget_fields::name::related,
    },
    FieldSpec {
        name: "widget",
        is_public: true,
        shape: gadget_fields::widget::shape,
        markers: NO_MARKERS,
        get: gadget_fields::widget::get,
        set: None,
        get_ref: gadget_fields::widget::get_ref,
        get_mut: gadget_fields::widget::get_mut,
        related_spec: gadget_fields::widget::related,
    },
    FieldSpec {
        name: "widgets",
        is_public: true,
        shape: gadget_fields::widgets::shape,
        markers: NO_MARKERS,
        get: gadget_fields::widgets::get,
        set: None,
        get_ref: gadget_fields::widgets::get_ref,
        get_mut: gadget_fields::widgets::get_mut,
        related_spec: gadget_fields::widgets::related,
    },
    FieldSpec {
        name: "maybe",
        is_public: true,
        shape: gadget_fields::maybe::shape,
        markers: NO_MARKERS,
        get: gadget_fields::maybe::get,
        set: None,
        get_ref: gadget_fields::maybe::get_ref,
        get_mut: gadget_fields::maybe::get_mut,
        related_spec: gadget_fields::maybe::related,
    },
];

pub static GADGET_SPEC: TypeSpec = TypeSpec {
    type_path: "reflekt_core::test_fixtures::Gadget",
    type_id: TypeId::of::<Gadget>,
    shape: gadget_shape,
    markers: TypeMarkers {
        display: None,
        description: None,
        table: None,
        schema: None,
    },
    fields: &GADGET_FIELDS,
    default_ctor: Some(gadget_default),
};

impl ReflectValue for Gadget {
    fn shape() -> TypeShape {
        TypeShape::Struct {
            name: "Gadget".to_string(),
        }
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::Map(vec![(
            Value::Text("name".to_string()),
            self.name.to_value()?,
        )]))
    }

    fn from_value(_value: &Value) -> Option<Self> {
        None
    }

    fn as_reflect(&self) -> Option<&dyn Reflect> {
        Some(self)
    }

    fn as_reflect_mut(&mut self) -> Option<&mut dyn Reflect> {
        Some(self)
    }

    fn declared_spec() -> Option<&'static TypeSpec> {
        Some(&GADGET_SPEC)
    }
}

impl Reflect for Gadget {
    fn type_spec(&self) -> &'static TypeSpec {
        &GADGET_SPEC
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl ReflectType for Gadget {
    const SPEC: &'static TypeSpec = &GADGET_SPEC;
}

pub fn gadget_spec() -> &'static TypeSpec {
    &GADGET_SPEC
}

// ============================================================================
// Broken: event marker on a non-delegate field
// ============================================================================

pub struct Broken {
    pub count: i64,
}

mod broken_fields {
    use super::Broken;

    field_accessors!(Broken => count: i64);
}

fn broken_shape() -> TypeShape {
    TypeShape::Struct {
        name: "Broken".to_string(),
    }
}

static BROKEN_FIELDS: [FieldSpec; 1] = [FieldSpec {
    name: "count",
    is_public: true,
    shape: broken_fields::count::shape,
    markers: FieldMarkers {
        event: true,
        ..NO_MARKERS
    },
    get: broken_fields::count::get,
    set: Some(broken_fields::count::set),
    get_ref: broken_fields::count::get_ref,
    get_mut: broken_fields::count::get_mut,
    related_spec: broken_fields::count::related,
}];

pub static BROKEN_SPEC: TypeSpec = TypeSpec {
    type_path: "reflekt_core::test_fixtures::Broken",
    type_id: TypeId::of::<Broken>,
    shape: broken_shape,
    markers: TypeMarkers {
        display: None,
        description: None,
        table: None,
        schema: None,
    },
    fields: &BROKEN_FIELDS,
    default_ctor: None,
};

// ============================================================================
// Registration
// ============================================================================

fn widget_like() -> Box<dyn Reflect> {
    Box::new(Widget::sample())
}

/// Register all fixture types; idempotent
pub fn register_fixtures() {
    registry::register::<Widget>();
    registry::register::<Gadget>();
    registry::register_members(TypeId::of::<Widget>(), &WIDGET_METHODS, &WIDGET_CTORS);
    registry::register_impl_factory("WidgetLike", widget_like);
}
