//! Record derive macro implementation

use crate::sql_ident::parse_sql_ident;
use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Fields, LitStr, Result};

#[derive(Default)]
struct FieldAttrs {
    column: Option<String>,
    primary_key: bool,
    skip: bool,
}

fn parse_field_attrs(field: &syn::Field) -> Result<FieldAttrs> {
    let mut attrs = FieldAttrs::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("column") {
                let lit: LitStr = meta.value()?.parse()?;
                attrs.column = Some(parse_sql_ident(&lit, "column")?);
                Ok(())
            } else if meta.path.is_ident("id") || meta.path.is_ident("primary_key") {
                attrs.primary_key = true;
                Ok(())
            } else if meta.path.is_ident("skip") {
                attrs.skip = true;
                Ok(())
            } else {
                Err(meta.error("unsupported orm attribute (expected column, id or skip)"))
            }
        })?;
    }
    Ok(attrs)
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Record cannot be derived for generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Record can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Record can only be derived for structs",
            ));
        }
    };

    let mut metas = Vec::new();
    let mut getters = Vec::new();
    let mut setters = Vec::new();
    let mut key_fields = 0usize;

    for field in fields {
        let attrs = parse_field_attrs(field)?;
        if attrs.skip {
            continue;
        }
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        if attrs.primary_key {
            key_fields += 1;
            if key_fields > 1 {
                return Err(syn::Error::new_spanned(
                    field,
                    "only one field can be marked #[orm(id)]",
                ));
            }
        }

        let ty = &field.ty;
        let field_name = ident.unraw().to_string();
        let column = match &attrs.column {
            Some(column) => quote! { ::core::option::Option::Some(#column) },
            None => quote! { ::core::option::Option::None },
        };
        let primary_key = attrs.primary_key;

        metas.push(quote! {
            dbx::FieldMeta::new(
                #field_name,
                #column,
                #primary_key,
                <#ty as dbx::FieldType>::KIND,
                <#ty as dbx::FieldType>::NULLABLE,
            )
        });
        getters.push(quote! {
            #field_name => ::core::option::Option::Some(
                dbx::FieldType::to_field_value(&self.#ident)
            ),
        });
        setters.push(quote! {
            #field_name => match <#ty as dbx::FieldType>::from_field_value(value) {
                ::core::option::Option::Some(v) => {
                    self.#ident = v;
                    true
                }
                ::core::option::Option::None => false,
            },
        });
    }

    Ok(quote! {
        impl dbx::Record for #name {
            fn fields() -> &'static [dbx::FieldMeta] {
                const FIELDS: &[dbx::FieldMeta] = &[#(#metas),*];
                FIELDS
            }

            fn get(&self, field: &str) -> ::core::option::Option<dbx::FieldValue> {
                match field {
                    #(#getters)*
                    _ => ::core::option::Option::None,
                }
            }

            #[allow(unused_variables)]
            fn set(&mut self, field: &str, value: dbx::FieldValue) -> bool {
                match field {
                    #(#setters)*
                    _ => false,
                }
            }
        }
    })
}
