//! Expansion of `#[derive(Shape)]`.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{parse_quote, spanned::Spanned, Data, DeriveInput, Fields, GenericParam, Path};

use crate::parse::{ContainerAttrs, FieldAttrs, Location};

pub fn expand_shape(input: TokenStream) -> syn::Result<TokenStream> {
    let mut input: DeriveInput = syn::parse2(input)?;
    let container = ContainerAttrs::from_attrs(&input.attrs)?;
    let krate: Path = container
        .crate_path
        .clone()
        .unwrap_or_else(|| parse_quote!(::grove::core));

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named.named.iter().collect::<Vec<_>>(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new(
                    input.ident.span(),
                    "Shape can only be derived for structs with named fields",
                ))
            }
        },
        Data::Enum(data) => {
            return Err(syn::Error::new(
                data.enum_token.span(),
                "Shape cannot be derived for enums",
            ))
        }
        Data::Union(data) => {
            return Err(syn::Error::new(
                data.union_token.span(),
                "Shape cannot be derived for unions",
            ))
        }
    };

    let mut descriptors = Vec::with_capacity(fields.len());
    for field in fields {
        let attrs = FieldAttrs::from_attrs(&field.attrs)?;
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let ident_str = ident.to_string();
        let ty = &field.ty;

        if attrs.location.is_some() && !attrs.decode_optional && !container.serde_default {
            return Err(syn::Error::new(
                field.span(),
                format!(
                    "parameter field `{ident_str}` is not read from the body; \
                     mark it #[serde(skip)] or #[serde(default)]"
                ),
            ));
        }

        if attrs.skip {
            descriptors.push(quote! {
                #krate::FieldDescriptor::new(#ident_str, || #krate::TypeDescriptor::Unit).skip()
            });
            continue;
        }

        let mut descriptor = quote! {
            #krate::FieldDescriptor::new(#ident_str, <#ty as #krate::Shape>::describe)
        };
        let rename = attrs.rename.or_else(|| {
            container
                .rename_all
                .map(|rule| rule.apply(&ident_str))
                .filter(|renamed| *renamed != ident_str)
        });
        if let Some(rename) = rename {
            descriptor.extend(quote!(.rename(#rename)));
        }
        match attrs.location {
            Some(Location::Header(name)) => descriptor.extend(quote!(.header(#name))),
            Some(Location::Path(name)) => descriptor.extend(quote!(.path(#name))),
            Some(Location::Query(name)) => descriptor.extend(quote!(.query(#name))),
            None => {}
        }
        descriptors.push(descriptor);
    }

    let name = match &container.name {
        Some(name) => quote!(#name),
        None if input.generics.type_params().next().is_none() => {
            let name = input.ident.to_string();
            quote!(#name)
        }
        None => quote!(#krate::canonical_name(::core::any::type_name::<Self>())),
    };

    let content_type = container.content_type.as_ref().map(|ct| {
        quote! {
            fn content_type() -> ::core::option::Option<&'static str> {
                ::core::option::Option::Some(#ct)
            }
        }
    });

    let type_params: Vec<_> = input
        .generics
        .params
        .iter()
        .filter_map(|param| match param {
            GenericParam::Type(ty) => Some(ty.ident.clone()),
            _ => None,
        })
        .collect();
    if !type_params.is_empty() {
        let where_clause = input.generics.make_where_clause();
        for param in &type_params {
            where_clause
                .predicates
                .push(parse_quote!(#param: #krate::Shape));
        }
    }

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics #krate::Shape for #ident #ty_generics #where_clause {
            fn describe() -> #krate::TypeDescriptor {
                #krate::TypeDescriptor::Record(
                    #krate::RecordDescriptor::new(#name)
                        .with_type_path(::core::any::type_name::<Self>())
                        #(.field(#descriptors))*
                )
            }

            #content_type
        }
    })
}
