//! Procedural macros shared by the eccheck test suites.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, ItemFn, LitStr};

/// Run a test with a `tracing` subscriber that writes to the test harness output.
///
/// The maximum level defaults to `DEBUG` and can be overridden with a string literal naming
/// any `tracing::Level` (i.e. `#[test_traced("INFO")]`). Crates using this attribute must
/// depend on `tracing` and `tracing-subscriber`.
///
/// # Example
///
/// ```ignore
/// use eccheck_macros::test_traced;
///
/// #[test_traced("INFO")]
/// fn test_something() {
///     tracing::info!("visible");
/// }
/// ```
#[proc_macro_attribute]
pub fn test_traced(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    let level = if attr.is_empty() {
        String::from("DEBUG")
    } else {
        parse_macro_input!(attr as LitStr).value().to_uppercase()
    };
    let level = match level.as_str() {
        "TRACE" => quote!(::tracing::Level::TRACE),
        "DEBUG" => quote!(::tracing::Level::DEBUG),
        "INFO" => quote!(::tracing::Level::INFO),
        "WARN" => quote!(::tracing::Level::WARN),
        "ERROR" => quote!(::tracing::Level::ERROR),
        other => {
            return syn::Error::new(
                proc_macro2::Span::call_site(),
                format!("invalid level: {other}"),
            )
            .to_compile_error()
            .into();
        }
    };

    let attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    let body = &input.block;
    let expanded = quote! {
        #[test]
        #(#attrs)*
        #vis #sig {
            let subscriber = ::tracing_subscriber::fmt()
                .with_test_writer()
                .with_max_level(#level)
                .with_line_number(true)
                .finish();
            let dispatcher = ::tracing::Dispatch::new(subscriber);
            ::tracing::dispatcher::with_default(&dispatcher, || #body)
        }
    };
    TokenStream::from(expanded)
}
