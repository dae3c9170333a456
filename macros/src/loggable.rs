use crate::declaration::Declaration;
use proc_macro::TokenStream;
use quote::quote;
use syn::parse_macro_input;

pub fn loggable_impl(input: TokenStream) -> TokenStream {
    let Declaration {
        enum_name,
        variants,
    } = parse_macro_input!(input as Declaration);

    let enum_variants = variants.iter().map(|variant| {
        let name = &variant.name;
        let message = &variant.message;
        if variant.fields.is_empty() {
            quote! {
                #[error(#message)]
                #name
            }
        } else {
            let fields = variant.field_definitions();
            quote! {
                #[error(#message)]
                #name { #(#fields,)* }
            }
        }
    });

    let level_match_arms = variants.iter().map(|variant| {
        let name = &variant.name;
        let level = &variant.level;
        if variant.fields.is_empty() {
            quote! { Self::#name => #level }
        } else {
            quote! { Self::#name { .. } => #level }
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
        }
    }
    .into()
}
