#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by every Strata crate.
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! strata-derive.workspace = true
//! thiserror.workspace = true
//! ```
//!
//! Examples are `ignore`d here because a proc-macro crate cannot use its own macros in doctests.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Attribute macro for the error enums of the workspace.
///
/// Every crate reports failures through one enum annotated with `#[strata_error]`.
/// The macro keeps the enum itself untouched and generates the wiring around it.
///
/// # Generated Items
///
/// * `#[derive(Debug, thiserror::Error)]` unless the enum derives them already.
/// * `<ErrorName>Kind`: a field-less, `Copy` mirror of the variants, returned by
///   `<ErrorName>::kind()`, so callers can branch on the failure without destructuring.
/// * `<ErrorName>Ext` trait with `.context(...)` for `Result<T, ErrorName>` and for
///   `Result<T, SourceError>` of every variant holding a source.
/// * `From<SourceError>` for every variant with a `source` field.
/// * `From<&'static str>` and `From<String>` when an `Internal` variant exists.
/// * A private `format_context` helper for `#[error(...)]` strings.
///
/// # Requirements
///
/// 1. Only enums are accepted.
/// 2. Variants use named fields; tuple and unit variants are rejected.
/// 3. A variant with a source must also carry `context: Option<Cow<'static, str>>`.
///
/// # Example
///
/// ```rust,ignore
/// use std::borrow::Cow;
///
/// #[strata_derive::strata_error]
/// pub enum StorageError {
///     #[error("Invalid key{}: {message}", format_context(.context))]
///     InvalidKey { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
///
///     #[error("I/O failure{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
/// }
///
/// fn load(path: &str) -> Result<Vec<u8>, StorageError> {
///     std::fs::read(path).context("Reading snapshot")
/// }
///
/// assert_eq!(load("/missing").unwrap_err().kind(), StorageErrorKind::Io);
/// ```
#[proc_macro_attribute]
pub fn strata_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}
