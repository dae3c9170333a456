mod declaration;
mod log;
mod loggable;
mod traceable;

use proc_macro::TokenStream;

/// Emits a `loggable!`/`traceable!` value through `tracing` at its declared level.
#[proc_macro]
pub fn log(input: TokenStream) -> TokenStream {
    log::log_impl(input)
}

/// Declares a message enum whose variants carry a `tracing::Level`.
#[proc_macro]
pub fn loggable(input: TokenStream) -> TokenStream {
    loggable::loggable_impl(input)
}

/// Declares an error enum. Variants capture the rendered source error unless
/// marked `#[no_source]`, and get a constructor function of the same name.
#[proc_macro]
pub fn traceable(input: TokenStream) -> TokenStream {
    traceable::traceable_impl(input)
}
