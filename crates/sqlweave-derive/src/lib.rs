//! Derive macros for sqlweave
//!
//! Provides `#[derive(Schema)]` and `#[derive(FieldArgs)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod attrs;
mod field_args;
mod schema;
mod sql_ident;

/// Derive `Schema` (field path to column mapping) for a struct.
///
/// # Example
///
/// ```ignore
/// use sqlweave::Schema;
///
/// #[derive(Schema)]
/// #[sql(rename_all = "camelCase")]
/// struct User {
///     id: i64,
///     #[sql(column = "display_name")]
///     user_name: String,
///     #[sql(nested)]
///     address: Address,
///     #[sql(skip)]
///     cached: Option<String>,
/// }
/// ```
///
/// # Attributes
///
/// - `#[sql(rename_all = "...")]` - Case of external names: `snake_case`, `camelCase`,
///   `PascalCase`, `SCREAMING_SNAKE_CASE`, `kebab-case`, `lowercase`, `UPPERCASE`
/// - `#[sql(column = "name")]` - Map field to a different column name
/// - `#[sql(rename = "name")]` - External name used in field paths and JEL
/// - `#[sql(nested)]` - Field type is itself a `Schema` (composite column)
/// - `#[sql(skip)]` - Leave the field out
///
/// Scalar field types must implement `serde::Deserialize` and `ToSql`.
#[proc_macro_derive(Schema, attributes(sql))]
pub fn derive_schema(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    schema::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derive `FieldArgs` so a struct can be used as a named argument source.
///
/// Each field is reachable as `:external_name`; field types must be
/// `Clone + IntoArg`. `#[sql(nested)]` and `#[sql(skip)]` fields are left out.
///
/// ```ignore
/// #[derive(FieldArgs)]
/// struct Filter {
///     status: String,
///     min_total: i64,
/// }
///
/// let q = Sql::compose("status = :status and total >= :min_total", filter.as_args());
/// ```
#[proc_macro_derive(FieldArgs, attributes(sql))]
pub fn derive_field_args(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    field_args::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
