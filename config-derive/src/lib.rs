//! # Confluent Derive
//!
//! `#[derive(Bind)]` generates the field descriptor list a record needs to be
//! populated from a merged configuration tree, plus the nested-record
//! behaviour that lets the record itself be a field of another record.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote, quote_spanned};
use syn::ext::IdentExt;
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Fields, LitStr, parse_macro_input};

/// Derive `confluent::Bind` for a struct with named fields.
///
/// Field attributes:
/// - `#[bind(key = "mongo_host")]`: bind under this key instead of the
///   canonical form of the field name
/// - `#[bind(default = "27017")]`: literal parsed into the field when its key
///   is absent from every source
/// - `#[bind(skip)]`: never touched by the binder
///
/// Every bound field type must implement `confluent::BindField`.
#[proc_macro_derive(Bind, attributes(bind))]
pub fn derive_bind(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

#[derive(Default)]
struct FieldAttrs {
    key: Option<LitStr>,
    default: Option<LitStr>,
    skip: bool
}

fn field_attrs(field: &syn::Field) -> syn::Result<FieldAttrs> {
    let mut attrs = FieldAttrs::default();

    for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("bind")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("key") {
                attrs.key = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("default") {
                attrs.default = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("skip") {
                attrs.skip = true;
            } else {
                return Err(meta.error("unsupported bind attribute, expected `key`, `default` or `skip`"));
            }
            Ok(())
        })?;
    }

    if attrs.skip && (attrs.key.is_some() || attrs.default.is_some()) {
        return Err(syn::Error::new_spanned(
            field,
            "`skip` cannot be combined with `key` or `default`"
        ));
    }

    Ok(attrs)
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Bind cannot be derived for generic types"
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    ident,
                    "Bind can only be derived for structs with named fields"
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                ident,
                "Bind can only be derived for structs with named fields"
            ));
        }
    };

    let mut slots = Vec::new();
    let mut descriptors = Vec::new();

    for (index, field) in fields.iter().enumerate() {
        let attrs = field_attrs(field)?;
        if attrs.skip {
            continue;
        }
        let Some(member) = &field.ident else {
            continue;
        };

        let name = member.unraw().to_string();
        let slot = format_ident!("__bind_slot_{}", index);
        let access = quote_spanned! {field.ty.span()=> &mut target.#member };

        slots.push(quote! {
            fn #slot(target: &mut #ident) -> &mut dyn ::confluent::BindField {
                #access
            }
        });

        let mut descriptor = quote! { ::confluent::Field::new(#name, #slot) };
        if let Some(key) = &attrs.key {
            descriptor = quote! { #descriptor.with_key(#key) };
        }
        if let Some(default) = &attrs.default {
            descriptor = quote! { #descriptor.with_default(#default) };
        }
        descriptors.push(descriptor);
    }

    let type_name = ident.unraw().to_string();

    Ok(quote! {
        impl ::confluent::Bind for #ident {
            fn type_name() -> &'static str {
                #type_name
            }

            fn fields() -> ::std::vec::Vec<::confluent::Field<Self>> {
                #(#slots)*
                ::std::vec![#(#descriptors),*]
            }
        }

        impl ::confluent::BindField for #ident {
            fn bind_value(
                &mut self,
                key: &str,
                value: &::confluent::Value
            ) -> ::core::result::Result<(), ::confluent::BindError> {
                ::confluent::bind::bind_record(self, key, value)
            }

            fn bind_default(
                &mut self,
                _literal: &str
            ) -> ::core::result::Result<(), ::confluent::CoerceError> {
                ::core::result::Result::Err(::confluent::CoerceError::UnsupportedDefault {
                    target: #type_name
                })
            }
        }
    })
}
