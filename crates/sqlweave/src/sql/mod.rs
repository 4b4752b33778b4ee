//! SQL composition.
//!
//! Templates are plain SQL with either `$1, $2, ...` or `:name` placeholders.
//! Composing a template against an [`ArgDict`](crate::ArgDict) renumbers its
//! placeholders into the output, binds each distinct value once, and inlines
//! expression arguments (sub-queries, JEL filters, column lists) in place.
//!
//! # Example
//!
//! ```ignore
//! use sqlweave::{args, sql, Sql};
//!
//! let mut q = Sql::compose("select * from users where a = $1 and b = $2", args![1, 2]);
//! q.append("and c = $1 and d = $1", args![3]);
//!
//! let built = q.build()?;
//! assert_eq!(built.sql, "select * from users where a = $1 and b = $2 and c = $3 and d = $3");
//! ```

mod builder;
mod compose;
mod expr;
mod options;
mod query;
mod resolver;

#[cfg(test)]
mod tests;

pub use builder::{Builder, Mark};
pub use expr::{Join, Paren, Raw, SqlExpr};
pub use options::ComposeOptions;
pub use query::{Built, Sql};

/// Start a statement from a template without parameters.
pub fn sql(template: &str) -> Sql {
    Sql::new(template)
}

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
