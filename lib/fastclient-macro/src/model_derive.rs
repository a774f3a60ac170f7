//! `#[derive(Model)]` implementation.
//!
//! Makes a serde record usable as an endpoint parameter (validated through
//! its deserializer) and as an endpoint return type (decoded from JSON).

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitStr, parse_quote};

/// Expand `#[derive(Model)]`.
pub(crate) fn expand_model_derive(input: TokenStream) -> syn::Result<TokenStream> {
    let input: DeriveInput = syn::parse2(input)?;
    let name = &input.ident;

    match &input.data {
        Data::Struct(data) if matches!(data.fields, Fields::Named(_)) => {}
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Model can only be derived for structs with named fields",
            ));
        }
    }

    let model_name = parse_model_name(&input.attrs)?.unwrap_or_else(|| name.to_string());

    let mut generics = input.generics.clone();
    generics.make_where_clause().predicates.push(parse_quote! {
        Self: ::fastclient::serde::Serialize + ::fastclient::serde::de::DeserializeOwned + 'static
    });
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::fastclient::Schema for #name #ty_generics #where_clause {
            fn field_type() -> ::fastclient::FieldType {
                ::fastclient::FieldType::Record(::fastclient::RecordSchema::named::<Self>(#model_name))
            }
        }

        impl #impl_generics ::fastclient::FromResponse for #name #ty_generics #where_clause {
            const SHAPE: ::fastclient::ReturnShape = ::fastclient::ReturnShape::Model;

            fn from_response(
                response: ::fastclient::Response<::fastclient::Bytes>,
            ) -> ::fastclient::Result<Self> {
                response.json()
            }
        }
    })
}

/// Parse `#[model(name = "...")]`.
fn parse_model_name(attrs: &[syn::Attribute]) -> syn::Result<Option<String>> {
    let mut name = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident("model")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                name = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported model attribute. Expected: name"))
            }
        })?;
    }
    Ok(name)
}
