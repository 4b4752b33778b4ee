//! Schema derive macro implementation

use crate::attrs::sql_fields;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let type_name = name.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = sql_fields(&input, "Schema")?;
    let descs: Vec<_> = fields
        .iter()
        .map(|f| {
            let ty = &f.field.ty;
            let external = &f.name;
            let column = &f.column;
            if f.nested {
                quote! { ::sqlweave::FieldDesc::nested::<#ty>(#external, #column) }
            } else {
                quote! { ::sqlweave::FieldDesc::scalar::<#ty>(#external, #column) }
            }
        })
        .collect();

    Ok(quote! {
        impl #impl_generics ::sqlweave::Schema for #name #ty_generics #where_clause {
            fn describe() -> ::sqlweave::SchemaDesc {
                ::sqlweave::SchemaDesc::new(#type_name, ::std::vec![#(#descs),*])
            }
        }
    })
}
