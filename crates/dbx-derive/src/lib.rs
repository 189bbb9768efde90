//! Derive macros for dbx
//!
//! Provides `#[derive(Record)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod record;
mod sql_ident;

/// Derive the `Record` trait for a struct.
///
/// # Example
///
/// ```ignore
/// use dbx::Record;
///
/// #[derive(Default, Record)]
/// struct User {
///     #[orm(id)]
///     id: u64,
///     #[orm(column = "user_name")]
///     name: String,
///     email: Option<String>,
///     #[orm(skip)]
///     cached_score: f64,
/// }
/// ```
///
/// # Generated
///
/// - `fn fields() -> &'static [FieldMeta]` - one entry per non-skipped field
/// - `fn get` / `fn set` - field access by Rust field name
///
/// # Attributes
///
/// - `#[orm(id)]` (or `#[orm(primary_key)]`) - Mark field as primary key
/// - `#[orm(column = "name")]` - Map field to a specific column
/// - `#[orm(skip)]` - Leave the field out of mapping entirely
#[proc_macro_derive(Record, attributes(orm))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
