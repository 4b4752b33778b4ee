//! Column resolution for struct types.
//!
//! A [`Schema`] type describes how its fields map to database columns. The
//! descriptor is built once per type (usually by `#[derive(Schema)]`) and then
//! served from a process-wide cache keyed by [`TypeId`].
//!
//! ```ignore
//! #[derive(sqlweave::Schema)]
//! #[sql(rename_all = "camelCase")]
//! struct User {
//!     id: i64,
//!     #[sql(column = "display_name")]
//!     name: String,
//!     #[sql(nested)]
//!     address: Address,
//! }
//!
//! let field = User::schema().resolve("address.city")?;
//! assert_eq!(field.to_sql(), r#"("address")."city""#);
//! ```

#[cfg(test)]
mod tests;

use crate::error::{WeaveError, WeaveResult};
use crate::param::{Arg, IntoArg, Param};
use crate::sql::{Builder, SqlExpr};
use serde::de::DeserializeOwned;
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tokio_postgres::types::ToSql;

/// Decodes a JSON value into a bind parameter of a field's declared type.
pub type DecodeFn = fn(&serde_json::Value) -> WeaveResult<Param>;

/// Decode `value` as `T` and wrap it as a [`Param`].
pub fn decode_json<T>(value: &serde_json::Value) -> WeaveResult<Param>
where
    T: DeserializeOwned + ToSql + Send + Sync + 'static,
{
    let decoded: T = serde_json::from_value(value.clone()).map_err(|err| {
        WeaveError::invalid_input(
            format!("decoding `{value}` as {}", std::any::type_name::<T>()),
            err.to_string(),
        )
    })?;
    Ok(Param::new(decoded))
}

/// A type whose fields map to database columns.
pub trait Schema: 'static {
    /// Build the descriptor. Called at most a handful of times per type.
    fn describe() -> SchemaDesc;

    /// The cached descriptor for this type.
    fn schema() -> Arc<SchemaDesc>
    where
        Self: Sized,
    {
        cached::<Self>()
    }
}

fn cached<T: Schema>() -> Arc<SchemaDesc> {
    type SchemaMap = HashMap<TypeId, Arc<SchemaDesc>>;
    static CACHE: OnceLock<RwLock<SchemaMap>> = OnceLock::new();
    let cache = CACHE.get_or_init(|| RwLock::new(HashMap::new()));

    let key = TypeId::of::<T>();
    if let Some(desc) = cache
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&key)
    {
        return Arc::clone(desc);
    }

    // Described outside the lock: `describe` may resolve nested schemas.
    let desc = Arc::new(T::describe());
    cache
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(key, Arc::clone(&desc));
    desc
}

/// How a field's value is represented.
#[derive(Clone, Copy)]
pub enum FieldKind {
    /// A single column; JSON values decode through the function.
    Scalar(DecodeFn),
    /// A composite column described by another schema.
    Nested(fn() -> Arc<SchemaDesc>),
}

impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(_) => f.write_str("Scalar"),
            Self::Nested(schema) => f.debug_tuple("Nested").field(&schema().type_name).finish(),
        }
    }
}

/// One field of a [`SchemaDesc`].
#[derive(Debug, Clone)]
pub struct FieldDesc {
    /// External name, as used in field paths and JSON.
    pub name: &'static str,
    /// Database column.
    pub column: &'static str,
    pub type_name: &'static str,
    pub kind: FieldKind,
}

impl FieldDesc {
    pub fn scalar<T>(name: &'static str, column: &'static str) -> Self
    where
        T: DeserializeOwned + ToSql + Send + Sync + 'static,
    {
        Self {
            name,
            column,
            type_name: std::any::type_name::<T>(),
            kind: FieldKind::Scalar(decode_json::<T>),
        }
    }

    pub fn nested<S: Schema>(name: &'static str, column: &'static str) -> Self {
        Self {
            name,
            column,
            type_name: std::any::type_name::<S>(),
            kind: FieldKind::Nested(S::schema),
        }
    }

    pub fn is_nested(&self) -> bool {
        matches!(self.kind, FieldKind::Nested(_))
    }
}

/// Field-to-column mapping of one struct type.
#[derive(Debug)]
pub struct SchemaDesc {
    pub type_name: &'static str,
    fields: Vec<FieldDesc>,
    columns: OnceLock<String>,
    deep_columns: OnceLock<String>,
}

impl SchemaDesc {
    pub fn new(type_name: &'static str, fields: Vec<FieldDesc>) -> Self {
        Self {
            type_name,
            fields,
            columns: OnceLock::new(),
            deep_columns: OnceLock::new(),
        }
    }

    pub fn fields(&self) -> &[FieldDesc] {
        &self.fields
    }

    /// Look up a top-level field by external name.
    pub fn field(&self, name: &str) -> Option<&FieldDesc> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Resolve a dotted path of external names (`address.city`).
    pub fn resolve(&self, path: &str) -> WeaveResult<ResolvedField> {
        let context = || format!("resolving `{path}` on {}", self.type_name);

        let mut columns = Vec::new();
        let mut segments = path.split('.');
        // Keeps nested descriptors alive while walking.
        let mut current: Option<Arc<SchemaDesc>> = None;

        loop {
            let Some(segment) = segments.next() else {
                return Err(WeaveError::unknown_field(context(), "empty field path"));
            };
            let desc = current.as_deref().unwrap_or(self);
            let field = desc.field(segment).ok_or_else(|| {
                WeaveError::unknown_field(
                    context(),
                    format!("{} has no field `{segment}`", desc.type_name),
                )
            })?;
            columns.push(field.column);

            match field.kind {
                FieldKind::Nested(schema) => {
                    if segments.clone().next().is_none() {
                        return Ok(ResolvedField {
                            columns,
                            type_name: field.type_name,
                            decode: None,
                        });
                    }
                    current = Some(schema());
                }
                FieldKind::Scalar(decode) => {
                    if let Some(rest) = segments.next() {
                        return Err(WeaveError::unknown_field(
                            context(),
                            format!("`{segment}` is a scalar and has no field `{rest}`"),
                        ));
                    }
                    return Ok(ResolvedField {
                        columns,
                        type_name: field.type_name,
                        decode: Some(decode),
                    });
                }
            }
        }
    }

    /// Top-level columns: `"a", "b", "c"`. Nested fields appear as one
    /// composite column.
    pub fn columns(&self) -> &str {
        self.columns.get_or_init(|| {
            self.fields
                .iter()
                .map(|f| quote_ident(f.column))
                .collect::<Vec<_>>()
                .join(", ")
        })
    }

    /// Every scalar column, nested fields flattened as `("a")."b" as "a.b"`.
    pub fn deep_columns(&self) -> &str {
        self.deep_columns.get_or_init(|| {
            let mut out = Vec::new();
            self.collect_deep(&mut Vec::new(), &mut out);
            out.join(", ")
        })
    }

    fn collect_deep(&self, prefix: &mut Vec<&'static str>, out: &mut Vec<String>) {
        for field in &self.fields {
            prefix.push(field.column);
            match field.kind {
                FieldKind::Scalar(_) if prefix.len() == 1 => out.push(quote_ident(field.column)),
                FieldKind::Scalar(_) => {
                    let alias = quote_ident(&prefix.join("."));
                    out.push(format!("{} as {alias}", render_path(prefix)));
                }
                FieldKind::Nested(schema) => schema().collect_deep(prefix, out),
            }
            prefix.pop();
        }
    }
}

/// A field path resolved to its column chain.
#[derive(Clone)]
pub struct ResolvedField {
    pub columns: Vec<&'static str>,
    pub type_name: &'static str,
    /// `None` for nested (composite) fields.
    pub decode: Option<DecodeFn>,
}

impl ResolvedField {
    /// `"a"` for a top-level column, `("a")."b"` for a nested one.
    pub fn to_sql(&self) -> String {
        render_path(&self.columns)
    }

    pub fn is_nested(&self) -> bool {
        self.columns.len() > 1
    }
}

impl fmt::Debug for ResolvedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedField")
            .field("columns", &self.columns)
            .field("type_name", &self.type_name)
            .field("castable", &self.decode.is_some())
            .finish()
    }
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn render_path(columns: &[&str]) -> String {
    match columns {
        [] => String::new(),
        [single] => quote_ident(single),
        [first, rest @ ..] => {
            let mut out = format!("({})", quote_ident(first));
            for column in rest {
                out.push('.');
                out.push_str(&quote_ident(column));
            }
            out
        }
    }
}

/// Column list of a [`Schema`] type as an expression.
#[derive(Debug, Clone)]
pub struct Cols {
    schema: Arc<SchemaDesc>,
    deep: bool,
}

impl Cols {
    /// Top-level columns of `T`.
    pub fn of<T: Schema>() -> Self {
        Self {
            schema: T::schema(),
            deep: false,
        }
    }

    /// Every scalar column of `T`, nested fields flattened.
    pub fn deep<T: Schema>() -> Self {
        Self {
            schema: T::schema(),
            deep: true,
        }
    }
}

impl SqlExpr for Cols {
    fn append_to(&self, out: &mut Builder) -> WeaveResult<()> {
        let list = if self.deep {
            self.schema.deep_columns()
        } else {
            self.schema.columns()
        };
        out.text(list);
        Ok(())
    }
}

impl IntoArg for Cols {
    fn into_arg(self) -> Arg {
        Arg::expr(self)
    }
}
