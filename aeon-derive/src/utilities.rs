use proc_macro2::{Ident, Span};
use proc_macro_crate::{crate_name, FoundCrate};
use syn::punctuated::Punctuated;
use syn::{Path, Token};

/// Returns an absolute path to an item within a crate, under whatever name the crate is known
/// by where the macro expands. The crate itself is reachable as `::aeon` through its
/// `extern crate self` alias, which also covers its doctests and integration tests.
pub(crate) fn resolved_path(crate_base_name: &str, path_segments: &[&str]) -> Path {
    let segments: Punctuated<Ident, Token![::]> = path_segments
        .iter()
        .map(|s| Ident::new(s, Span::call_site()))
        .collect();

    let crate_ident = match crate_name(crate_base_name) {
        Ok(FoundCrate::Itself) => Ident::new(crate_base_name, Span::call_site()),
        Ok(FoundCrate::Name(name)) => Ident::new(&name, Span::call_site()),
        Err(e) => panic!("Failed to find crate `{crate_base_name}`: {e}"),
    };
    syn::parse_quote!(::#crate_ident::#segments)
}
