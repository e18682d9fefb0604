//! Procedural macros for the docmap project.
//!
//! This crate provides compile-time code generation for the docmap
//! framework. `#[derive(Mappable)]` turns a plain named-field struct into a
//! mappable type by generating its field declarations from the struct
//! definition, so the declaration builder never has to be written by hand.

#[allow(unused_extern_crates)]
extern crate self as docmap_macros;

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

/// Derives the `Mappable` trait for a named-field struct.
///
/// Field types map to declarations as follows:
///
/// - `String` becomes a text field; the field named `id` is the identity
///   field and must be text
/// - `i32`, `i64`, `f64` and `bool` become scalar fields
/// - `Option<T>` maps like `T`, reading an absent stored value as `None`
/// - `Vec<String>` and `Vec` of a scalar type become pass-through lists
/// - `Vec<T>` of any other type embeds each element, and `T` must itself
///   be mappable
/// - any other field type is embedded as a nested mappable value
///
/// # Attributes
///
/// - `#[mapped(custom)]` - translate the field through the converter pair
///   registered for its exact type instead of embedding it
/// - `#[mapped(parent)]` - designate the embedded parent: the parent type's
///   mapped fields are stored alongside this type's own, parent fields first
///
/// # Example
///
/// ```ignore
/// use docmap::prelude::*;
///
/// #[derive(Default, Clone, Mappable)]
/// struct Profile {
///     id: Option<String>,
///     name: String,
///     age: Option<i32>,
/// }
/// ```
#[proc_macro_derive(Mappable, attributes(mapped))]
pub fn derive_mappable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand_mappable(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_mappable(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let syn::Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "Mappable can only be derived for structs",
        ));
    };
    let syn::Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            input,
            "Mappable requires named fields",
        ));
    };
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Mappable cannot be derived for generic types",
        ));
    }

    let name = &input.ident;
    let name_str = name.to_string();

    let mut parent: Option<(syn::Ident, syn::Type)> = None;
    let mut decls = Vec::new();

    for field in &fields.named {
        let attrs = parse_field_attrs(&field.attrs)?;
        let ident = field.ident.clone().expect("named field");

        if attrs.parent {
            if attrs.custom {
                return Err(syn::Error::new_spanned(
                    field,
                    "#[mapped(parent)] and #[mapped(custom)] are mutually exclusive",
                ));
            }
            if parent.is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    "at most one field may carry #[mapped(parent)]",
                ));
            }
            parent = Some((ident, field.ty.clone()));
            continue;
        }

        decls.push(declare_field(field, &ident, attrs.custom)?);
    }

    let parent_impl = parent.map(|(ident, ty)| {
        quote! {
            fn parent() -> ::std::option::Option<::docmap::mappable::ParentHandle<Self>> {
                ::std::option::Option::Some(::docmap::mappable::ParentHandle::of::<#ty>(
                    |object: &Self| &object.#ident,
                    |object: &mut Self| &mut object.#ident,
                ))
            }
        }
    });

    let declare_impl = if decls.is_empty() {
        quote! {
            fn declare(_fields: &mut ::docmap::mappable::FieldSet<Self>) {}
        }
    } else {
        quote! {
            fn declare(fields: &mut ::docmap::mappable::FieldSet<Self>) {
                #(#decls)*
            }
        }
    };

    Ok(quote! {
        impl ::docmap::mappable::Mappable for #name {
            fn type_name() -> &'static str {
                #name_str
            }

            #parent_impl

            #declare_impl
        }
    })
}

/// How generated accessors move the field value across the boundary.
#[derive(Clone, Copy)]
enum Access {
    /// Scalars and scalar lists, through `IntoValue`/`FromValue`.
    Direct,
    /// One type-erased value, boxed and downcast.
    Object,
    /// A list of type-erased values.
    ObjectList,
}

fn declare_field(
    field: &syn::Field,
    ident: &syn::Ident,
    custom: bool,
) -> syn::Result<proc_macro2::TokenStream> {
    let name = ident.to_string();
    let (inner, optional) = unwrap_option(&field.ty);

    let (kind, access) = if custom {
        (
            quote! { ::docmap::descriptor::FieldKind::custom::<#inner>() },
            Access::Object,
        )
    } else {
        classify(field, inner)?
    };

    let get = match (access, optional) {
        (Access::Direct, _) => quote! {
            |object: &Self| ::docmap::value::IntoValue::into_value(object.#ident.clone())
        },
        (Access::Object, true) => quote! {
            |object: &Self| match &object.#ident {
                ::std::option::Option::Some(value) => ::docmap::value::Value::object(value.clone()),
                ::std::option::Option::None => ::docmap::value::Value::Null,
            }
        },
        (Access::Object, false) => quote! {
            |object: &Self| ::docmap::value::Value::object(object.#ident.clone())
        },
        (Access::ObjectList, _) => quote! {
            |object: &Self| ::docmap::value::Value::List(
                object.#ident.iter().cloned().map(::docmap::value::Value::object).collect(),
            )
        },
    };

    let set = match (access, optional) {
        (Access::Direct, _) => quote! {
            |object, value| {
                object.#ident = ::docmap::value::FromValue::from_value(value)?;
                ::std::result::Result::Ok(())
            }
        },
        (Access::Object, true) => quote! {
            |object, value| {
                object.#ident = ::docmap::value::from_object_opt(value)?;
                ::std::result::Result::Ok(())
            }
        },
        (Access::Object, false) => quote! {
            |object, value| {
                object.#ident = ::docmap::value::from_object(value)?;
                ::std::result::Result::Ok(())
            }
        },
        (Access::ObjectList, _) => quote! {
            |object, value| {
                object.#ident = ::docmap::value::from_object_vec(value)?;
                ::std::result::Result::Ok(())
            }
        },
    };

    Ok(quote! {
        fields.field(#name, #kind, #get, #set);
    })
}

fn classify(
    field: &syn::Field,
    ty: &syn::Type,
) -> syn::Result<(proc_macro2::TokenStream, Access)> {
    if let Some(element) = vec_element(ty) {
        if type_is(element, "String") {
            return Ok((
                quote! { ::docmap::descriptor::FieldKind::text_list() },
                Access::Direct,
            ));
        }
        if scalar_name(element).is_some() {
            return Ok((
                quote! { ::docmap::descriptor::FieldKind::scalar_list() },
                Access::Direct,
            ));
        }
        if is_plain_path(element) {
            return Ok((
                quote! { ::docmap::descriptor::FieldKind::embedded_list::<#element>() },
                Access::ObjectList,
            ));
        }
        // Not a storable element type; the layout build reports the error
        // with the declared element name.
        let description = type_string(element);
        return Ok((
            quote! {
                ::docmap::descriptor::FieldKind::List(
                    ::docmap::descriptor::ElementKind::Other(#description),
                )
            },
            Access::Direct,
        ));
    }

    if type_is(ty, "String") {
        return Ok((
            quote! { ::docmap::descriptor::FieldKind::Text },
            Access::Direct,
        ));
    }
    if scalar_name(ty).is_some() {
        return Ok((
            quote! { ::docmap::descriptor::FieldKind::Scalar },
            Access::Direct,
        ));
    }
    if let Some(numeric) = rejected_numeric(ty) {
        return Err(syn::Error::new_spanned(
            field,
            format!("unsupported numeric type `{numeric}`; declare the field as i32, i64 or f64"),
        ));
    }
    if is_plain_path(ty) {
        return Ok((
            quote! { ::docmap::descriptor::FieldKind::embedded::<#ty>() },
            Access::Object,
        ));
    }

    Err(syn::Error::new_spanned(
        field,
        "unsupported field type for Mappable",
    ))
}

/// Peels one `Option` wrapper, reporting whether the field was optional.
fn unwrap_option(ty: &syn::Type) -> (&syn::Type, bool) {
    match generic_argument(ty, "Option") {
        Some(inner) => (inner, true),
        None => (ty, false),
    }
}

fn vec_element(ty: &syn::Type) -> Option<&syn::Type> {
    generic_argument(ty, "Vec")
}

fn generic_argument<'a>(ty: &'a syn::Type, wrapper: &str) -> Option<&'a syn::Type> {
    let syn::Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    if args.args.len() != 1 {
        return None;
    }
    match args.args.first()? {
        syn::GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

fn type_is(ty: &syn::Type, name: &str) -> bool {
    matches!(
        ty,
        syn::Type::Path(path) if path.path.segments.last()
            .is_some_and(|segment| segment.ident == name && segment.arguments.is_none())
    )
}

fn scalar_name(ty: &syn::Type) -> Option<String> {
    let name = bare_ident(ty)?;
    matches!(name.as_str(), "i32" | "i64" | "f64" | "bool").then_some(name)
}

fn rejected_numeric(ty: &syn::Type) -> Option<String> {
    let name = bare_ident(ty)?;
    matches!(
        name.as_str(),
        "i8" | "i16" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64" | "u128" | "usize" | "f32"
    )
    .then_some(name)
}

fn bare_ident(ty: &syn::Type) -> Option<String> {
    let syn::Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if !segment.arguments.is_none() {
        return None;
    }
    Some(segment.ident.to_string())
}

fn is_plain_path(ty: &syn::Type) -> bool {
    matches!(ty, syn::Type::Path(path) if path.qself.is_none())
}

fn type_string(ty: &syn::Type) -> String {
    quote!(#ty).to_string()
}

#[derive(Default)]
struct FieldAttrs {
    parent: bool,
    custom: bool,
}

fn parse_field_attrs(attrs: &[syn::Attribute]) -> syn::Result<FieldAttrs> {
    let mut result = FieldAttrs::default();

    for attr in attrs {
        if !attr.path().is_ident("mapped") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("parent") {
                result.parent = true;
                Ok(())
            } else if meta.path.is_ident("custom") {
                result.custom = true;
                Ok(())
            } else {
                Err(meta.error("unknown mapped attribute; expected `parent` or `custom`"))
            }
        })?;
    }

    Ok(result)
}
