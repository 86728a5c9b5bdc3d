//! reflect_impl attribute macro implementation
//!
//! Re-emits the impl block unchanged and derives metadata tables from its
//! public functions: self-receiver functions become registered methods,
//! receiver-less functions returning `Self` become registered constructors.
//! A `{type}_reflect_register()` function is emitted alongside, wiring the
//! type and its tables into the registry.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{FnArg, ImplItem, ItemImpl, ReturnType, Type};

pub fn generate_reflect_impl(item: ItemImpl) -> TokenStream {
    let ident = match type_ident(&item.self_ty) {
        Some(ident) => ident,
        None => {
            return syn::Error::new_spanned(
                &item.self_ty,
                "reflect_impl requires a plain type name",
            )
            .to_compile_error();
        }
    };

    if !item.generics.params.is_empty() || item.trait_.is_some() {
        return syn::Error::new_spanned(
            &item.generics,
            "reflect_impl supports only inherent impls on non-generic types",
        )
        .to_compile_error();
    }

    let mut methods = Vec::new();
    let mut ctors = Vec::new();

    for impl_item in &item.items {
        let ImplItem::Fn(func) = impl_item else {
            continue;
        };
        if !matches!(func.vis, syn::Visibility::Public(_)) {
            continue;
        }

        match receiver_of(func) {
            ReceiverKind::ByValue => {
                return syn::Error::new_spanned(
                    &func.sig,
                    "methods taking self by value cannot be registered",
                )
                .to_compile_error();
            }
            ReceiverKind::Borrowed => methods.push(func),
            ReceiverKind::None => {
                if returns_self(&func.sig.output, &ident) {
                    ctors.push(func);
                }
                // Other associated functions are left alone
            }
        }
    }

    let snake = snake_case(&ident.to_string());
    let mod_name = format_ident!("__{}_reflect", snake);
    let register_name = format_ident!("{}_reflect_register", snake);

    let method_items: Vec<_> = methods.iter().map(|f| generate_method(&ident, f)).collect();
    let ctor_items: Vec<_> = ctors.iter().map(|f| generate_ctor(&ident, f)).collect();

    let method_specs: Vec<_> = methods
        .iter()
        .map(|f| {
            let name = f.sig.ident.to_string();
            let invoke = format_ident!("invoke_{}", f.sig.ident);
            let params = format_ident!("params_{}", f.sig.ident);
            let ret = format_ident!("ret_{}", f.sig.ident);
            quote! {
                ::reflekt_core::provider::MethodSpec {
                    name: #name,
                    ret_shape: #ret,
                    param_shapes: #params,
                    invoke: #invoke,
                }
            }
        })
        .collect();
    let method_count = method_specs.len();

    let ctor_specs: Vec<_> = ctors
        .iter()
        .map(|f| {
            let name = f.sig.ident.to_string();
            let construct = format_ident!("construct_{}", f.sig.ident);
            let params = format_ident!("params_{}", f.sig.ident);
            quote! {
                ::reflekt_core::provider::CtorSpec {
                    name: #name,
                    param_shapes: #params,
                    construct: #construct,
                }
            }
        })
        .collect();
    let ctor_count = ctor_specs.len();

    let register_doc = format!(
        "Register `{ident}` and its method/constructor tables with the reflection registry."
    );

    quote! {
        #item

        #[doc(hidden)]
        mod #mod_name {
            use super::*;

            #(#method_items)*
            #(#ctor_items)*

            pub static METHODS: [::reflekt_core::provider::MethodSpec; #method_count] = [
                #(#method_specs),*
            ];

            pub static CTORS: [::reflekt_core::provider::CtorSpec; #ctor_count] = [
                #(#ctor_specs),*
            ];
        }

        #[doc = #register_doc]
        pub fn #register_name() {
            ::reflekt_core::registry::register::<#ident>();
            ::reflekt_core::registry::register_members(
                ::std::any::TypeId::of::<#ident>(),
                &#mod_name::METHODS,
                &#mod_name::CTORS,
            );
        }
    }
}

enum ReceiverKind {
    None,
    Borrowed,
    ByValue,
}

fn receiver_of(func: &syn::ImplItemFn) -> ReceiverKind {
    match func.sig.inputs.first() {
        Some(FnArg::Receiver(recv)) => {
            if recv.reference.is_some() {
                ReceiverKind::Borrowed
            } else {
                ReceiverKind::ByValue
            }
        }
        _ => ReceiverKind::None,
    }
}

fn type_ident(ty: &Type) -> Option<syn::Ident> {
    if let Type::Path(path) = ty {
        if path.qself.is_none() && path.path.segments.len() == 1 {
            return Some(path.path.segments[0].ident.clone());
        }
    }
    None
}

fn returns_self(output: &ReturnType, ident: &syn::Ident) -> bool {
    let ReturnType::Type(_, ty) = output else {
        return false;
    };
    match type_ident(ty) {
        Some(ret) => ret == "Self" || &ret == ident,
        None => false,
    }
}

/// Parameter types after the receiver, with `Self` rewritten to the type
fn param_types(func: &syn::ImplItemFn, ident: &syn::Ident) -> Vec<TokenStream> {
    func.sig
        .inputs
        .iter()
        .filter_map(|arg| match arg {
            FnArg::Typed(pat) => Some(resolve_self(&pat.ty, ident)),
            FnArg::Receiver(_) => None,
        })
        .collect()
}

fn resolve_self(ty: &Type, ident: &syn::Ident) -> TokenStream {
    match type_ident(ty) {
        Some(t) if t == "Self" => quote! { #ident },
        _ => quote! { #ty },
    }
}

/// Argument extraction statements shared by method and ctor bodies
fn bind_args(name: &str, params: &[TokenStream]) -> (Vec<TokenStream>, Vec<syn::Ident>) {
    let mut binds = Vec::new();
    let mut idents = Vec::new();
    for (i, ty) in params.iter().enumerate() {
        let arg = format_ident!("arg{}", i);
        binds.push(quote! {
            let #arg: #ty = args
                .get(#i)
                .and_then(|v| ::reflekt_core::ReflectValue::from_value(v))
                .ok_or_else(|| ::reflekt_core::AccessError::ValueMismatch {
                    member: #name.to_string(),
                    expected: <#ty as ::reflekt_core::ReflectValue>::shape().to_string(),
                })?;
        });
        idents.push(arg);
    }
    (binds, idents)
}

fn generate_method(ident: &syn::Ident, func: &syn::ImplItemFn) -> TokenStream {
    let fn_ident = &func.sig.ident;
    let name = fn_ident.to_string();
    let ident_str = ident.to_string();
    let params = param_types(func, ident);
    let (binds, arg_idents) = bind_args(&name, &params);

    let invoke = format_ident!("invoke_{}", fn_ident);
    let params_fn = format_ident!("params_{}", fn_ident);
    let ret_fn = format_ident!("ret_{}", fn_ident);

    let ret_ty = match &func.sig.output {
        ReturnType::Default => quote! { () },
        ReturnType::Type(_, ty) => resolve_self(ty, ident),
    };

    quote! {
        pub fn #invoke(
            any: &mut dyn ::std::any::Any,
            args: &[::reflekt_core::Value],
        ) -> ::std::result::Result<::reflekt_core::Value, ::reflekt_core::AccessError> {
            let obj = any.downcast_mut::<#ident>().ok_or(
                ::reflekt_core::AccessError::WrongInstanceType { expected: #ident_str },
            )?;
            #(#binds)*
            let ret = obj.#fn_ident(#(#arg_idents),*);
            ::reflekt_core::ReflectValue::to_value(&ret).ok_or_else(|| {
                ::reflekt_core::AccessError::ValueMismatch {
                    member: #name.to_string(),
                    expected: "a return value with a value form".to_string(),
                }
            })
        }

        pub fn #params_fn() -> ::std::vec::Vec<::reflekt_core::TypeShape> {
            vec![#(<#params as ::reflekt_core::ReflectValue>::shape()),*]
        }

        pub fn #ret_fn() -> ::reflekt_core::TypeShape {
            <#ret_ty as ::reflekt_core::ReflectValue>::shape()
        }
    }
}

fn generate_ctor(ident: &syn::Ident, func: &syn::ImplItemFn) -> TokenStream {
    let fn_ident = &func.sig.ident;
    let name = fn_ident.to_string();
    let params = param_types(func, ident);
    let (binds, arg_idents) = bind_args(&name, &params);

    let construct = format_ident!("construct_{}", fn_ident);
    let params_fn = format_ident!("params_{}", fn_ident);

    quote! {
        pub fn #construct(
            args: &[::reflekt_core::Value],
        ) -> ::std::result::Result<
            ::std::boxed::Box<dyn ::reflekt_core::Reflect>,
            ::reflekt_core::AccessError,
        > {
            #(#binds)*
            ::std::result::Result::Ok(::std::boxed::Box::new(#ident::#fn_ident(#(#arg_idents),*)))
        }

        pub fn #params_fn() -> ::std::vec::Vec<::reflekt_core::TypeShape> {
            vec![#(<#params as ::reflekt_core::ReflectValue>::shape()),*]
        }
    }
}

fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
