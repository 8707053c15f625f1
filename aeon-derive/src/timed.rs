use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::ext::IdentExt;
use syn::punctuated::Punctuated;
use syn::{Expr, ExprLit, ItemFn, Lit, LitStr, Meta, MetaNameValue, Result, Token};

use crate::utilities::resolved_path;

/// The arguments of `#[timed(...)]`, all optional.
#[derive(Default)]
pub(crate) struct TimedArgs {
    name: Option<LitStr>,
    group: Option<LitStr>,
    store: Option<Expr>,
}

impl TimedArgs {
    pub(crate) fn from_metas(metas: Punctuated<Meta, Token![,]>) -> Result<Self> {
        let mut args = TimedArgs::default();
        for meta in metas {
            let Meta::NameValue(MetaNameValue { path, value, .. }) = &meta else {
                return Err(syn::Error::new_spanned(
                    &meta,
                    "expected `name = \"...\"`, `group = \"...\"` or `store = STORE`",
                ));
            };
            let duplicate = || syn::Error::new_spanned(path, "duplicate argument");
            if path.is_ident("name") {
                if args.name.is_some() {
                    return Err(duplicate());
                }
                args.name = Some(string_literal(value)?);
            } else if path.is_ident("group") {
                if args.group.is_some() {
                    return Err(duplicate());
                }
                args.group = Some(string_literal(value)?);
            } else if path.is_ident("store") {
                if args.store.is_some() {
                    return Err(duplicate());
                }
                args.store = Some(value.clone());
            } else {
                return Err(syn::Error::new_spanned(
                    path,
                    "unknown argument, expected `name`, `group` or `store`",
                ));
            }
        }
        Ok(args)
    }
}

fn string_literal(value: &Expr) -> Result<LitStr> {
    match value {
        Expr::Lit(ExprLit {
            lit: Lit::Str(lit), ..
        }) => Ok(lit.clone()),
        _ => Err(syn::Error::new_spanned(value, "expected a string literal")),
    }
}

/// Wraps the body of `function` in a timed scope.
///
/// The measurement is named after the function unless `name` is given. Methods taking `self`
/// are grouped by the bare name of their `Self` type, everything else by the last segment of its
/// module path, unless `group` is given.
pub(crate) fn timed_fn(args: TimedArgs, function: ItemFn) -> TokenStream {
    let guard_path = resolved_path("aeon", &["guard", "TimedGuard"]);

    let name = args.name.unwrap_or_else(|| {
        LitStr::new(&function.sig.ident.unraw().to_string(), function.sig.ident.span())
    });

    let group = match args.group {
        Some(group) => quote! { #group },
        None if function.sig.receiver().is_some() => {
            let type_group = resolved_path("aeon", &["guard", "type_group"]);
            quote! { #type_group(::core::any::type_name::<Self>()) }
        }
        None => {
            let module_group = resolved_path("aeon", &["guard", "module_group"]);
            quote! { #module_group(::core::module_path!()) }
        }
    };

    let target = match args.store {
        Some(store) => quote! { &#store },
        None => {
            let default_store = resolved_path("aeon", &["DefaultStore"]);
            quote! { &#default_store }
        }
    };

    // Invisible to the body.
    let guard = syn::Ident::new("__aeon_timed_guard", Span::mixed_site());

    let ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = function;

    quote! {
        #(#attrs)*
        #vis #sig {
            let #guard = #guard_path::enter(#target, #name, #group);
            #block
        }
    }
}
