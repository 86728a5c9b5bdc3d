//! Reflect derive macro implementation
//!
//! Emits the static metadata tables (`TypeSpec`, `FieldSpec`) plus the
//! `Reflect`, `ReflectValue`, and `ReflectType` implementations for a
//! struct with named fields or a unit-variant enum. Everything generated
//! lives inside an anonymous const block so no names leak into the
//! caller's namespace.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::DeriveInput;

use crate::parse::{parse_reflect_type, ReflectFieldArgs, ReflectTypeArgs, ReflectVariantArgs};

/// Generate the Reflect implementation
pub fn derive_reflect(input: DeriveInput) -> TokenStream {
    match parse_reflect_type(&input) {
        Ok(args) => generate(args),
        Err(e) => e.write_errors(),
    }
}

fn generate(args: ReflectTypeArgs) -> TokenStream {
    if !args.generics.params.is_empty() {
        return syn::Error::new_spanned(
            &args.generics,
            "Reflect cannot be derived for generic types",
        )
        .to_compile_error();
    }

    match args.data {
        darling::ast::Data::Struct(ref fields) => {
            let fields = fields.fields.iter().collect::<Vec<_>>();
            generate_struct(&args, &fields)
        }
        darling::ast::Data::Enum(ref variants) => generate_enum(&args, variants),
    }
}

fn option_str(value: Option<&str>) -> TokenStream {
    match value {
        Some(v) => quote! { ::std::option::Option::Some(#v) },
        None => quote! { ::std::option::Option::None },
    }
}

fn type_markers(args: &ReflectTypeArgs) -> TokenStream {
    let display = option_str(args.display.as_deref());
    let description = option_str(args.description.as_deref());
    let table = option_str(args.table_name().as_deref());
    let schema = option_str(args.schema.as_deref());
    quote! {
        ::reflekt_core::provider::TypeMarkers {
            display: #display,
            description: #description,
            table: #table,
            schema: #schema,
        }
    }
}

// ============================================================================
// Structs
// ============================================================================

fn generate_struct(args: &ReflectTypeArgs, fields: &[&ReflectFieldArgs]) -> TokenStream {
    let ident = &args.ident;
    let ident_str = ident.to_string();
    let markers = type_markers(args);

    let accessor_fns: Vec<_> = fields
        .iter()
        .map(|f| generate_field_accessors(ident, f))
        .collect();
    let field_specs: Vec<_> = fields.iter().map(|f| generate_field_spec(f)).collect();
    let field_count = fields.len();

    let (default_fn, default_ctor) = if args.default {
        (
            quote! {
                fn default_instance() -> ::std::boxed::Box<dyn ::reflekt_core::Reflect> {
                    ::std::boxed::Box::new(<#ident as ::std::default::Default>::default())
                }
            },
            quote! { ::std::option::Option::Some(default_instance) },
        )
    } else {
        (quote! {}, quote! { ::std::option::Option::None })
    };

    // Map projection covers every field with a value form
    let to_value_fields: Vec<_> = fields
        .iter()
        .filter(|f| !f.event)
        .map(|f| {
            let fld = f.ident.as_ref().unwrap();
            let name = fld.to_string();
            quote! {
                if let ::std::option::Option::Some(v) =
                    ::reflekt_core::ReflectValue::to_value(&self.#fld)
                {
                    entries.push((::reflekt_core::Value::Text(#name.to_string()), v));
                }
            }
        })
        .collect();

    let from_value = if args.default {
        let arms: Vec<_> = fields
            .iter()
            .filter(|f| !f.event)
            .map(|f| {
                let fld = f.ident.as_ref().unwrap();
                let name = fld.to_string();
                quote! {
                    #name => {
                        if let ::std::option::Option::Some(parsed) =
                            ::reflekt_core::ReflectValue::from_value(v)
                        {
                            obj.#fld = parsed;
                        }
                    }
                }
            })
            .collect();
        quote! {
            fn from_value(value: &::reflekt_core::Value) -> ::std::option::Option<Self> {
                let ::reflekt_core::Value::Map(pairs) = value else {
                    return ::std::option::Option::None;
                };
                let mut obj = <#ident as ::std::default::Default>::default();
                for (k, v) in pairs {
                    let ::reflekt_core::Value::Text(name) = k else { continue };
                    match name.as_str() {
                        #(#arms)*
                        _ => {}
                    }
                }
                ::std::option::Option::Some(obj)
            }
        }
    } else {
        quote! {
            fn from_value(_value: &::reflekt_core::Value) -> ::std::option::Option<Self> {
                ::std::option::Option::None
            }
        }
    };

    quote! {
        const _: () = {
            fn type_shape() -> ::reflekt_core::TypeShape {
                ::reflekt_core::TypeShape::Struct { name: #ident_str.to_string() }
            }

            #(#accessor_fns)*

            #default_fn

            static FIELDS: [::reflekt_core::provider::FieldSpec; #field_count] = [
                #(#field_specs),*
            ];

            static SPEC: ::reflekt_core::provider::TypeSpec = ::reflekt_core::provider::TypeSpec {
                type_path: concat!(module_path!(), "::", #ident_str),
                type_id: ::std::any::TypeId::of::<#ident>,
                shape: type_shape,
                markers: #markers,
                fields: &FIELDS,
                default_ctor: #default_ctor,
            };

            #[automatically_derived]
            impl ::reflekt_core::provider::ReflectType for #ident {
                const SPEC: &'static ::reflekt_core::provider::TypeSpec = &SPEC;
            }

            #[automatically_derived]
            impl ::reflekt_core::Reflect for #ident {
                fn type_spec(&self) -> &'static ::reflekt_core::provider::TypeSpec {
                    &SPEC
                }

                fn as_any(&self) -> &dyn ::std::any::Any {
                    self
                }

                fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                    self
                }
            }

            #[automatically_derived]
            impl ::reflekt_core::ReflectValue for #ident {
                fn shape() -> ::reflekt_core::TypeShape {
                    type_shape()
                }

                fn to_value(&self) -> ::std::option::Option<::reflekt_core::Value> {
                    let mut entries = ::std::vec::Vec::new();
                    #(#to_value_fields)*
                    ::std::option::Option::Some(::reflekt_core::Value::Map(entries))
                }

                #from_value

                fn as_reflect(&self) -> ::std::option::Option<&dyn ::reflekt_core::Reflect> {
                    ::std::option::Option::Some(self)
                }

                fn as_reflect_mut(
                    &mut self,
                ) -> ::std::option::Option<&mut dyn ::reflekt_core::Reflect> {
                    ::std::option::Option::Some(self)
                }

                fn declared_spec() -> ::std::option::Option<&'static ::reflekt_core::provider::TypeSpec> {
                    ::std::option::Option::Some(&SPEC)
                }
            }
        };
    }
}

fn generate_field_accessors(struct_ident: &syn::Ident, field: &ReflectFieldArgs) -> TokenStream {
    let fld = field.ident.as_ref().unwrap();
    let fld_str = fld.to_string();
    let ty = &field.ty;
    let struct_str = struct_ident.to_string();

    let get_name = format_ident!("get_{}", fld);
    let set_name = format_ident!("set_{}", fld);
    let get_ref_name = format_ident!("get_ref_{}", fld);
    let get_mut_name = format_ident!("get_mut_{}", fld);
    let shape_name = format_ident!("shape_{}", fld);
    let related_name = format_ident!("related_{}", fld);

    let setter = if field.is_writable() {
        quote! {
            fn #set_name(
                any: &mut dyn ::std::any::Any,
                value: ::reflekt_core::Value,
            ) -> ::std::result::Result<(), ::reflekt_core::AccessError> {
                let obj = any.downcast_mut::<#struct_ident>().ok_or(
                    ::reflekt_core::AccessError::WrongInstanceType { expected: #struct_str },
                )?;
                obj.#fld = <#ty as ::reflekt_core::ReflectValue>::from_value(&value)
                    .ok_or_else(|| ::reflekt_core::AccessError::ValueMismatch {
                        member: #fld_str.to_string(),
                        expected: <#ty as ::reflekt_core::ReflectValue>::shape().to_string(),
                    })?;
                ::std::result::Result::Ok(())
            }
        }
    } else {
        quote! {}
    };

    quote! {
        fn #get_name(any: &dyn ::std::any::Any) -> ::std::option::Option<::reflekt_core::Value> {
            ::reflekt_core::ReflectValue::to_value(&any.downcast_ref::<#struct_ident>()?.#fld)
        }

        #setter

        fn #get_ref_name(
            any: &dyn ::std::any::Any,
        ) -> ::std::option::Option<&dyn ::reflekt_core::Reflect> {
            ::reflekt_core::ReflectValue::as_reflect(&any.downcast_ref::<#struct_ident>()?.#fld)
        }

        fn #get_mut_name(
            any: &mut dyn ::std::any::Any,
        ) -> ::std::option::Option<&mut dyn ::reflekt_core::Reflect> {
            ::reflekt_core::ReflectValue::as_reflect_mut(
                &mut any.downcast_mut::<#struct_ident>()?.#fld,
            )
        }

        fn #shape_name() -> ::reflekt_core::TypeShape {
            <#ty as ::reflekt_core::ReflectValue>::shape()
        }

        fn #related_name() -> ::std::option::Option<&'static ::reflekt_core::provider::TypeSpec> {
            <#ty as ::reflekt_core::ReflectValue>::declared_spec()
        }
    }
}

fn generate_field_spec(field: &ReflectFieldArgs) -> TokenStream {
    let fld = field.ident.as_ref().unwrap();
    let fld_str = fld.to_string();
    let is_public = field.is_public();

    let get_name = format_ident!("get_{}", fld);
    let set_name = format_ident!("set_{}", fld);
    let get_ref_name = format_ident!("get_ref_{}", fld);
    let get_mut_name = format_ident!("get_mut_{}", fld);
    let shape_name = format_ident!("shape_{}", fld);
    let related_name = format_ident!("related_{}", fld);

    let set = if field.is_writable() {
        quote! { ::std::option::Option::Some(#set_name) }
    } else {
        quote! { ::std::option::Option::None }
    };

    let display = option_str(field.display.as_deref());
    let description = option_str(field.description.as_deref());
    let rename = option_str(field.rename.as_deref());
    let column = option_str(field.column.as_deref());
    let key = field.key;
    let foreign_key = field.foreign_key;
    let exclude = field.exclude;
    let readonly = field.readonly;
    let event = field.event;

    quote! {
        ::reflekt_core::provider::FieldSpec {
            name: #fld_str,
            is_public: #is_public,
            shape: #shape_name,
            markers: ::reflekt_core::provider::FieldMarkers {
                display: #display,
                description: #description,
                rename: #rename,
                column: #column,
                key: #key,
                foreign_key: #foreign_key,
                exclude: #exclude,
                readonly: #readonly,
                event: #event,
            },
            get: #get_name,
            set: #set,
            get_ref: #get_ref_name,
            get_mut: #get_mut_name,
            related_spec: #related_name,
        }
    }
}

// ============================================================================
// Unit enums
// ============================================================================

fn generate_enum(args: &ReflectTypeArgs, variants: &[ReflectVariantArgs]) -> TokenStream {
    let ident = &args.ident;
    let ident_str = ident.to_string();
    let markers = type_markers(args);

    let variant_names: Vec<String> = variants.iter().map(ReflectVariantArgs::value_name).collect();

    let to_value_arms: Vec<_> = variants
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let vident = &v.ident;
            let name = v.value_name();
            let ordinal = i as u64;
            quote! { Self::#vident => (#name, #ordinal), }
        })
        .collect();

    let from_name_arms: Vec<_> = variants
        .iter()
        .map(|v| {
            let vident = &v.ident;
            let name = v.value_name();
            quote! { #name => ::std::option::Option::Some(Self::#vident), }
        })
        .collect();

    let from_ordinal_arms: Vec<_> = variants
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let vident = &v.ident;
            let ordinal = i as u64;
            quote! { #ordinal => ::std::option::Option::Some(Self::#vident), }
        })
        .collect();

    let default_ctor = if args.default {
        quote! { ::std::option::Option::Some(default_instance) }
    } else {
        quote! { ::std::option::Option::None }
    };
    let default_fn = if args.default {
        quote! {
            fn default_instance() -> ::std::boxed::Box<dyn ::reflekt_core::Reflect> {
                ::std::boxed::Box::new(<#ident as ::std::default::Default>::default())
            }
        }
    } else {
        quote! {}
    };

    quote! {
        const _: () = {
            fn type_shape() -> ::reflekt_core::TypeShape {
                ::reflekt_core::TypeShape::Enum {
                    name: #ident_str.to_string(),
                    variants: vec![#(#variant_names.to_string()),*],
                }
            }

            #default_fn

            static SPEC: ::reflekt_core::provider::TypeSpec = ::reflekt_core::provider::TypeSpec {
                type_path: concat!(module_path!(), "::", #ident_str),
                type_id: ::std::any::TypeId::of::<#ident>,
                shape: type_shape,
                markers: #markers,
                fields: &[],
                default_ctor: #default_ctor,
            };

            #[automatically_derived]
            impl ::reflekt_core::provider::ReflectType for #ident {
                const SPEC: &'static ::reflekt_core::provider::TypeSpec = &SPEC;
            }

            #[automatically_derived]
            impl ::reflekt_core::Reflect for #ident {
                fn type_spec(&self) -> &'static ::reflekt_core::provider::TypeSpec {
                    &SPEC
                }

                fn as_any(&self) -> &dyn ::std::any::Any {
                    self
                }

                fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                    self
                }
            }

            #[automatically_derived]
            impl ::reflekt_core::ReflectValue for #ident {
                fn shape() -> ::reflekt_core::TypeShape {
                    type_shape()
                }

                fn to_value(&self) -> ::std::option::Option<::reflekt_core::Value> {
                    let (variant, ordinal) = match self {
                        #(#to_value_arms)*
                    };
                    ::std::option::Option::Some(::reflekt_core::Value::Enum(
                        ::reflekt_core::EnumValue {
                            type_name: concat!(module_path!(), "::", #ident_str).to_string(),
                            variant: variant.to_string(),
                            ordinal,
                        },
                    ))
                }

                fn from_value(value: &::reflekt_core::Value) -> ::std::option::Option<Self> {
                    let ::reflekt_core::Value::Enum(ev) = value else {
                        return ::std::option::Option::None;
                    };
                    match ev.variant.as_str() {
                        #(#from_name_arms)*
                        _ => match ev.ordinal {
                            #(#from_ordinal_arms)*
                            _ => ::std::option::Option::None,
                        },
                    }
                }

                fn as_reflect(&self) -> ::std::option::Option<&dyn ::reflekt_core::Reflect> {
                    ::std::option::Option::Some(self)
                }

                fn as_reflect_mut(
                    &mut self,
                ) -> ::std::option::Option<&mut dyn ::reflekt_core::Reflect> {
                    ::std::option::Option::Some(self)
                }

                fn declared_spec() -> ::std::option::Option<&'static ::reflekt_core::provider::TypeSpec> {
                    ::std::option::Option::Some(&SPEC)
                }
            }
        };
    }
}
