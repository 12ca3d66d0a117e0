//! Procedural macros for Kasl.
//!
//! Use them through the `kasl` facade crate:
//!
//! ```rust,ignore
//! use kasl::{Container, Result, Service};
//!
//! #[derive(Service)]
//! #[service(name = "mailer", constructor = "Mailer::connect")]
//! struct Mailer { /* ... */ }
//!
//! impl Mailer {
//!     fn connect(container: &Container) -> Result<Self> { /* ... */ }
//! }
//! ```

use darling::FromDeriveInput;
use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, parse_macro_input};

use kasl_support::naming::{EMPTY_NAME_MESSAGE, is_reserved, reserved_message, to_snake_case};

#[derive(Debug, FromDeriveInput)]
#[darling(attributes(service), supports(struct_any, enum_any))]
struct ServiceOpts {
    ident: syn::Ident,
    generics: syn::Generics,

    /// Registered name; defaults to the snake_case type name
    #[darling(default)]
    name: Option<String>,

    /// `fn(&Container) -> Result<Self>`; defaults to `Self::new`
    #[darling(default)]
    constructor: Option<syn::Path>,

    /// Path to the facade crate; defaults to `::kasl`
    #[darling(default, rename = "crate")]
    krate: Option<syn::Path>,
}

/// Implements `kasl::Service` for a type.
///
/// The service name is fixed at compile time. Reserved names (the
/// container's own registration operations) are rejected here, with the
/// same message the container would give at runtime.
///
/// # Attributes
/// - `#[service(name = "...")]` — defaults to the snake_case type name
/// - `#[service(constructor = "path::to::fn")]` — defaults to `Self::new`
/// - `#[service(crate = "path")]` — defaults to `::kasl`
#[proc_macro_derive(Service, attributes(service))]
pub fn derive_service(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let opts = match ServiceOpts::from_derive_input(&input) {
        Ok(opts) => opts,
        Err(err) => return err.write_errors().into(),
    };

    match expand(opts) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.write_errors().into(),
    }
}

fn expand(opts: ServiceOpts) -> darling::Result<proc_macro2::TokenStream> {
    let ServiceOpts {
        ident,
        generics,
        name,
        constructor,
        krate,
    } = opts;

    let name = name.unwrap_or_else(|| to_snake_case(&ident.to_string()));

    if name.is_empty() {
        return Err(darling::Error::custom(EMPTY_NAME_MESSAGE).with_span(&ident));
    }
    if is_reserved(&name) {
        return Err(darling::Error::custom(reserved_message(&name)).with_span(&ident));
    }

    let krate = krate.unwrap_or_else(|| syn::parse_quote!(::kasl));
    let constructor = constructor.unwrap_or_else(|| syn::parse_quote!(Self::new));
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics #krate::Service for #ident #ty_generics #where_clause {
            fn service_name() -> &'static str {
                #name
            }

            fn construct(container: &#krate::Container) -> #krate::Result<Self> {
                #constructor(container)
            }
        }
    })
}
