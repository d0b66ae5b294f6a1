#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by the workspace.
//!
//! * [`macro@wf_error`] turns a named-field enum into a context-aware error type.
//! * [`macro@entity`] wires a struct into the persistence layer as a storable entity.
//!
//! Examples are `ignore`d because they reference crates that depend on this one.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemStruct, parse_macro_input};

/// A high-level attribute macro for defining domain-specific error enums.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]` unless already present.
/// * **Context Support**: Generates a companion `...Ext` trait that adds `.context()`
///   to any `Result` that can be converted into this error type.
/// * **Standard Conversions**: Implements `From<T>` for variants containing a `source` field
///   (or a field marked `#[source]`/`#[from]`), enabling the `?` operator for upstream errors.
/// * **Internal Fallback**: Provides `From<&'static str>` and `From<String>` if an
///   `Internal { message, context }` variant is present.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum** with named-field variants only.
/// 2. A `context` field, when present, must be `Option<Cow<'static, str>>`.
/// 3. Variants wrapping a source error must carry a `context` field.
///
/// # Example
///
/// ```rust,ignore
/// use std::borrow::Cow;
///
/// #[wf_derive::wf_error]
/// pub enum StoreError {
///     #[error("Serialization failed{}: {source}", format_context(.context))]
///     Json { source: serde_json::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal store error{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn decode(raw: &str) -> Result<Employee, StoreError> {
///     serde_json::from_str(raw).context("Decoding employee document")
/// }
/// ```
#[proc_macro_attribute]
pub fn wf_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand(input).into()
}

/// Attribute macro that implements `wf_kernel::repository::Entity` for a struct.
///
/// The struct must have an `id: Option<i64>` field and exactly one field of type
/// `AuditMetadata` (usually `#[serde(flatten)]`ed). The `collection` argument names
/// the document collection and the search index; it must be lowercase ASCII
/// alphanumerics or `_`.
///
/// # Example
///
/// ```rust,ignore
/// #[wf_derive::entity(collection = "employee")]
/// #[derive(Clone, Debug, Default, Serialize, Deserialize)]
/// #[serde(rename_all = "camelCase")]
/// pub struct Employee {
///     pub id: Option<i64>,
///     pub first_name: Option<String>,
///     #[serde(flatten)]
///     pub audit: AuditMetadata,
/// }
/// ```
#[proc_macro_attribute]
pub fn entity(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemStruct);
    macros::entity::expand(args.into(), input).into()
}
