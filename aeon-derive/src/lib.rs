extern crate proc_macro;
mod timed;
mod utilities;

use proc_macro::TokenStream;
use syn::punctuated::Punctuated;
use syn::{parse_macro_input, ItemFn, Meta, Token};

use crate::timed::{timed_fn, TimedArgs};

/// Times every call of a function or method.
///
/// Each call starts a measurement before the body runs and stops it however the body is left,
/// including by panicking. Arguments and return values are passed through untouched.
///
/// ```rust,ignore
/// #[timed]
/// fn load() { ... }                         // "load" in the group of the enclosing module
///
/// impl Parser {
///     #[timed]
///     fn parse(&self) { ... }               // "parse" in group "Parser"
///
///     #[timed(name = "tokenize", group = "lexing", store = PARSER_TIMINGS)]
///     fn lex(&self) { ... }
/// }
/// ```
///
/// `store` takes any expression implementing `aeon::TimingTarget` when borrowed, typically a
/// `static` `LazyLock<Mutex<MeasurementStore>>`. Without it the process-wide default store is
/// used.
///
/// A call panics if its measurement is already running, which happens when a timed function
/// calls itself.
#[proc_macro_attribute]
pub fn timed(attr: TokenStream, item: TokenStream) -> TokenStream {
    let metas = parse_macro_input!(attr with Punctuated::<Meta, Token![,]>::parse_terminated);
    let function = parse_macro_input!(item as ItemFn);

    match TimedArgs::from_metas(metas) {
        Ok(args) => timed_fn(args, function).into(),
        Err(e) => e.to_compile_error().into(),
    }
}
