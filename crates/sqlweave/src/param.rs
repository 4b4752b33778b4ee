//! Bound parameters and composition arguments.
//!
//! [`Param`] is a clone-friendly `ToSql` value. [`Arg`] is what an argument
//! dictionary hands to the composition engine: either a scalar to bind, or an
//! expression (sub-query, JEL filter, ...) to inline.

use crate::sql::SqlExpr;
use bytes::BytesMut;
use std::fmt;
use std::sync::Arc;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

/// A clone-friendly parameter wrapper using Arc.
///
/// Cloning a `Param` never copies the underlying value, so the same argument
/// can be folded into several composed statements cheaply.
#[derive(Clone)]
pub struct Param(pub(crate) Arc<dyn ToSql + Send + Sync>);

impl Param {
    /// Create a new parameter from any ToSql value.
    pub fn new<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Param(Arc::new(value))
    }

    /// Get a reference to the inner value as a ToSql trait object.
    pub fn as_ref(&self) -> &(dyn ToSql + Sync) {
        &*self.0 as &(dyn ToSql + Sync)
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// An untyped SQL `NULL`.
///
/// `Option::<T>::None` only binds against columns that accept `T`; `SqlNull`
/// accepts every type, which is what a bare JSON `null` needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SqlNull;

impl ToSql for SqlNull {
    fn to_sql(
        &self,
        _ty: &Type,
        _out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        Ok(IsNull::Yes)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

/// A single composition argument.
#[derive(Clone)]
pub enum Arg {
    /// Scalar bound as `$n`.
    Value(Param),
    /// Expression inlined in place of the placeholder that references it.
    Expr(Arc<dyn SqlExpr>),
}

impl Arg {
    /// Wrap a scalar value.
    pub fn value<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Arg::Value(Param::new(value))
    }

    /// Wrap an expression.
    pub fn expr<E: SqlExpr + 'static>(expr: E) -> Self {
        Arg::Expr(Arc::new(expr))
    }

    pub fn is_expr(&self) -> bool {
        matches!(self, Arg::Expr(_))
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Value(p) => f.debug_tuple("Value").field(p).finish(),
            Arg::Expr(_) => f.debug_tuple("Expr").field(&"<dyn SqlExpr>").finish(),
        }
    }
}

/// Conversion into an [`Arg`].
///
/// Every `ToSql` value becomes [`Arg::Value`]; sqlweave's own expression types
/// ([`Sql`](crate::Sql), [`Jel`](crate::Jel), [`Cols`](crate::Cols), ...)
/// become [`Arg::Expr`].
pub trait IntoArg {
    fn into_arg(self) -> Arg;
}

impl<T: ToSql + Send + Sync + 'static> IntoArg for T {
    fn into_arg(self) -> Arg {
        Arg::Value(Param::new(self))
    }
}

impl IntoArg for Arg {
    fn into_arg(self) -> Arg {
        self
    }
}

impl IntoArg for Param {
    fn into_arg(self) -> Arg {
        Arg::Value(self)
    }
}
