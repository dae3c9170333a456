use proc_macro2::TokenStream;
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::spanned::Spanned;
use syn::{braced, Attribute, Error, Expr, Ident, LitStr, Result, Token, Type};

pub struct Declaration {
    pub enum_name: Ident,
    pub variants: Vec<Variant>,
}

pub struct Variant {
    pub attributes: Vec<Attribute>,
    pub message: LitStr,
    pub name: Ident,
    pub fields: Vec<(Ident, Type)>,
    pub level: Expr,
}

impl Variant {
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes
            .iter()
            .any(|attribute| attribute.path().is_ident(name))
    }

    pub fn field_definitions(&self) -> Vec<TokenStream> {
        self.fields
            .iter()
            .map(|(name, ty)| quote! { #name: #ty })
            .collect()
    }
}

impl Parse for Declaration {
    fn parse(input: ParseStream) -> Result<Self> {
        let enum_name = input.parse::<Ident>()?;

        let content;
        braced!(content in input);

        let mut variants = Vec::new();
        while !content.is_empty() {
            variants.push(content.parse::<Variant>()?);
            if content.peek(Token![,]) {
                content.parse::<Token![,]>()?;
            }
        }

        Ok(Declaration {
            enum_name,
            variants,
        })
    }
}

impl Parse for Variant {
    fn parse(input: ParseStream) -> Result<Self> {
        let attributes = input.call(Attribute::parse_outer)?;

        let error_attribute = attributes
            .iter()
            .find(|attribute| attribute.path().is_ident("error"))
            .ok_or_else(|| Error::new(input.span(), "Missing #[error(...)] attribute"))?;
        let message = error_attribute
            .parse_args::<LitStr>()
            .map_err(|_| Error::new(error_attribute.span(), "Invalid #[error] attribute format"))?;

        let name = input.parse::<Ident>()?;

        let mut fields = Vec::new();
        if input.peek(syn::token::Brace) {
            let field_content;
            braced!(field_content in input);
            while !field_content.is_empty() {
                let field_name = field_content.parse::<Ident>()?;
                field_content.parse::<Token![:]>()?;
                let field_type = field_content.parse::<Type>()?;
                fields.push((field_name, field_type));
                if field_content.peek(Token![,]) {
                    field_content.parse::<Token![,]>()?;
                }
            }
        }

        input.parse::<Token![=>]>()?;
        let level = input.parse::<Expr>()?;

        Ok(Variant {
            attributes,
            message,
            name,
            fields,
            level,
        })
    }
}
