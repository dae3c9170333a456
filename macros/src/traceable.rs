use crate::declaration::{Declaration, Variant};
use proc_macro::TokenStream;
use quote::quote;
use syn::parse_macro_input;

fn carries_source(variant: &Variant) -> bool {
    !variant.has_attribute("no_source")
}

pub fn traceable_impl(input: TokenStream) -> TokenStream {
    let Declaration {
        enum_name,
        variants,
    } = parse_macro_input!(input as Declaration);

    let enum_variants = variants.iter().map(|variant| {
        let name = &variant.name;
        let message = &variant.message;
        let fields = variant.field_definitions();
        match (carries_source(variant), fields.is_empty()) {
            (true, _) => quote! {
                #[error(#message)]
                #name { #(#fields,)* err: String }
            },
            (false, true) => quote! {
                #[error(#message)]
                #name
            },
            (false, false) => quote! {
                #[error(#message)]
                #name { #(#fields,)* }
            },
        }
    });

    let level_match_arms = variants.iter().map(|variant| {
        let name = &variant.name;
        let level = &variant.level;
        if !carries_source(variant) && variant.fields.is_empty() {
            quote! { Self::#name => #level }
        } else {
            quote! { Self::#name { .. } => #level }
        }
    });

    let constructors = variants.iter().filter_map(|variant| {
        let sourced = carries_source(variant);
        if !sourced && variant.fields.is_empty() {
            return None;
        }

        let name = &variant.name;
        let params = variant
            .fields
            .iter()
            .map(|(field_name, field_type)| quote! { #field_name: impl Into<#field_type> });
        let assignments = variant
            .fields
            .iter()
            .map(|(field_name, _)| quote! { #field_name: #field_name.into() });

        if sourced {
            Some(quote! {
                #[allow(non_snake_case)]
                pub fn #name(#(#params,)* source: impl std::fmt::Display) -> Self {
                    Self::#name {
                        #(#assignments,)*
                        err: source.to_string(),
                    }
                }
            })
        } else {
            Some(quote! {
                #[allow(non_snake_case)]
                pub fn #name(#(#params),*) -> Self {
                    Self::#name {
                        #(#assignments,)*
                    }
                }
            })
        }
    });

    quote! {
        #[allow(dead_code)]
        #[derive(Debug, Clone, thiserror::Error)]
        pub enum #enum_name {
            #(#enum_variants,)*
        }

        impl #enum_name {
            #[allow(dead_code)]
            pub fn level(&self) -> tracing::Level {
                match self {
                    #(#level_match_arms,)*
                }
            }

            #(#constructors)*
        }
    }
    .into()
}
