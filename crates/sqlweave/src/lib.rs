//! # sqlweave
//!
//! Compose plain SQL fragments into one parameterized statement.
//!
//! ## Features
//!
//! - **SQL first**: templates are ordinary SQL with `$1` or `:name` placeholders
//! - **Renumbering**: placeholders from many fragments become one contiguous `$1..$N`
//! - **Deduplication**: a value referenced twice in a template is bound once
//! - **Sub-queries**: pass a [`Sql`] (or any [`SqlExpr`]) as an argument and it is flattened in place
//! - **Validation**: missing and unused arguments are reported, never silently ignored
//! - **JEL**: a whitelisted JSON filter language checked against a [`Schema`]
//!
//! No SQL is ever executed: [`Sql::build`] returns the text and the bind values in
//! the shape `tokio-postgres` expects.
//!
//! ```ignore
//! use sqlweave::{args, named, Jel, Sql};
//!
//! let recent = Sql::compose(
//!     "select user_id from orders where created_at > :since",
//!     named! { "since" => since },
//! );
//! let filter = Jel::parse::<User>(&request_body)?;
//!
//! let mut q = Sql::compose("select * from users where id in ($1)", args![recent]);
//! q.append("and $1 limit $2", args![filter, 50_i64]);
//!
//! let built = q.build()?;
//! let rows = client.query(&built.sql, &built.params_ref()).await?;
//! ```

pub mod dict;
pub mod error;
pub mod jel;
pub mod param;
pub mod schema;
pub mod sql;
pub mod template;

pub use dict::{ArgDict, Args, FieldArgs, NamedArgs, ParamKind, StructArgs};
pub use error::{ErrorKind, WeaveError, WeaveResult};
pub use jel::Jel;
pub use param::{Arg, IntoArg, Param, SqlNull};
pub use schema::{Cols, FieldDesc, FieldKind, ResolvedField, Schema, SchemaDesc};
pub use sql::{Builder, Built, ComposeOptions, Join, Paren, Raw, Sql, SqlExpr, sql};
pub use template::Template;

#[cfg(feature = "derive")]
pub use sqlweave_derive::{FieldArgs, Schema};
