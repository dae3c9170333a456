use proc_macro::TokenStream;
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::{parse_macro_input, Expr, Token};

struct LogInput {
    entry: Expr,
    detail: Option<Expr>,
}

impl Parse for LogInput {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let entry = input.parse::<Expr>()?;
        let detail = if input.peek(Token![,]) {
            input.parse::<Token![,]>()?;
            Some(input.parse::<Expr>()?)
        } else {
            None
        };
        Ok(LogInput { entry, detail })
    }
}

pub fn log_impl(input: TokenStream) -> TokenStream {
    let LogInput { entry, detail } = parse_macro_input!(input as LogInput);

    let emit = match detail {
        Some(detail) => quote! {
            let detail = #detail;
            match level {
                tracing::Level::ERROR => tracing::error!(detail = %detail, "{}", message),
                tracing::Level::WARN => tracing::warn!(detail = %detail, "{}", message),
                tracing::Level::INFO => tracing::info!(detail = %detail, "{}", message),
                tracing::Level::DEBUG => tracing::debug!(detail = %detail, "{}", message),
                _ => tracing::trace!(detail = %detail, "{}", message),
            }
        },
        None => quote! {
            match level {
                tracing::Level::ERROR => tracing::error!("{}", message),
                tracing::Level::WARN => tracing::warn!("{}", message),
                tracing::Level::INFO => tracing::info!("{}", message),
                tracing::Level::DEBUG => tracing::debug!("{}", message),
                _ => tracing::trace!("{}", message),
            }
        },
    };

    quote! {
        {
            let entry = &#entry;
            let level = entry.level();
            let message = entry.to_string();
            #emit
        }
    }
    .into()
}
