//! FieldArgs derive macro implementation

use crate::attrs::sql_fields;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    // Nested fields are composite values, not bindable arguments.
    let fields: Vec<_> = sql_fields(&input, "FieldArgs")?
        .into_iter()
        .filter(|f| !f.nested)
        .collect();

    let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
    let arms: Vec<_> = fields
        .iter()
        .map(|f| {
            let ident = f.ident;
            let external = &f.name;
            quote! {
                #external => ::std::option::Option::Some(::sqlweave::IntoArg::into_arg(
                    ::std::clone::Clone::clone(&self.#ident),
                )),
            }
        })
        .collect();

    Ok(quote! {
        impl #impl_generics ::sqlweave::FieldArgs for #name #ty_generics #where_clause {
            fn field_names() -> &'static [&'static str] {
                &[#(#names),*]
            }

            fn field_arg(&self, name: &str) -> ::std::option::Option<::sqlweave::Arg> {
                match name {
                    #(#arms)*
                    _ => ::std::option::Option::None,
                }
            }
        }
    })
}
