#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by the infrastructure crates.
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! depot-derive = { path = "../infra/derive" }
//! thiserror = "2"
//! ```

mod error;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Turns an enum into a crate-level error type.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]` unless already present.
/// * **Context Support**: Generates a companion `<Name>Ext` trait that adds `.context()`
///   to any `Result` that can be converted into this error type.
/// * **Standard Conversions**: Implements `From<T>` for variants holding a `source: T` field
///   (or a field marked `#[source]`/`#[from]`), enabling `?` on upstream errors.
/// * **Opt-out Conversions**: A variant marked `#[no_from]` keeps its source but gets no
///   `From` impl. Use it when several variants wrap the same upstream error type and only
///   one of them should be the `?` default.
/// * **Internal Fallback**: `From<&'static str>` and `From<String>` when an `Internal`
///   variant is present.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum** with **named-field** variants.
/// 2. Variants with a source must also carry `context: Option<Cow<'static, str>>`.
/// 3. A `format_context` helper is emitted next to the enum, so declare at most one
///    error enum per module.
///
/// # Example
///
/// ```rust,ignore
/// use depot_derive::depot_error;
/// use std::borrow::Cow;
///
/// #[depot_error]
/// pub enum UploadError {
///     #[error("I/O failure{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[no_from]
///     #[error("Write failed{}: {source}", format_context(.context))]
///     Write { source: std::io::Error, context: Option<Cow<'static, str>> },
/// }
///
/// fn open() -> Result<std::fs::File, UploadError> {
///     std::fs::File::open("x").context("Opening upload")
/// }
/// ```
#[proc_macro_attribute]
pub fn depot_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    error::expand_derive(input).into()
}
