use super::builder::Builder;
use super::expr::SqlExpr;
use super::options::ComposeOptions;
use crate::dict::ArgDict;
use crate::error::{WeaveError, WeaveResult};
use crate::param::{Arg, IntoArg, Param};
use tokio_postgres::types::ToSql;

#[cfg(feature = "tracing")]
const TRACE_SQL_BYTES: usize = 200;

/// A composable SQL statement.
///
/// `Sql` wraps a [`Builder`] with chainable methods. The first failure is
/// recorded and every later call becomes a no-op; [`Sql::build`] is where it
/// surfaces as an `Err`.
///
/// # Example
///
/// ```ignore
/// use sqlweave::{args, named, sql, Sql};
///
/// let active = Sql::compose(
///     "select id from users where status = :status",
///     named! { "status" => "active" },
/// )
/// .tagged("users.active");
///
/// let mut q = sql("select * from orders");
/// q.append("where user_id in ($1) and total > $2", args![active, 100_i64]);
/// let built = q.build()?;
/// client.query(&built.sql, &built.params_ref()).await?;
/// ```
#[must_use]
#[derive(Debug, Clone, Default)]
pub struct Sql {
    builder: Builder,
    error: Option<WeaveError>,
    tag: Option<String>,
}

impl Sql {
    /// Start from a template that has no parameters.
    pub fn new(template: &str) -> Self {
        let mut sql = Self::empty();
        sql.append_with(template, None);
        sql
    }

    /// Create an empty statement.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Start from `template` composed against `args`.
    pub fn compose<D: ArgDict>(template: &str, args: D) -> Self {
        let mut sql = Self::empty();
        sql.append(template, args);
        sql
    }

    /// Replace the composition options for every later append.
    pub fn with_options(mut self, options: ComposeOptions) -> Self {
        self.builder.set_options(options);
        self
    }

    /// Turn off unused-argument validation for every later append.
    pub fn lenient(self) -> Self {
        self.with_options(ComposeOptions::lenient())
    }

    pub fn set_options(&mut self, options: ComposeOptions) -> &mut Self {
        self.builder.set_options(options);
        self
    }

    /// Associate a tag for observability.
    pub fn tag(&mut self, tag: impl Into<String>) -> &mut Self {
        self.tag = Some(tag.into());
        self
    }

    /// Consuming counterpart of [`Sql::tag`].
    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Compose `template` against `args` and append the result.
    pub fn append<D: ArgDict>(&mut self, template: &str, args: D) -> &mut Self {
        self.record(|b| b.append(template, Some(&args)).map(drop))
    }

    /// Like [`Sql::append`], with an optional argument source.
    pub fn append_with(&mut self, template: &str, args: Option<&dyn ArgDict>) -> &mut Self {
        self.record(|b| b.append(template, args).map(drop))
    }

    /// Append trusted text. Placeholders inside it are not renumbered.
    pub fn push(&mut self, text: &str) -> &mut Self {
        self.record(|b| {
            b.text(text);
            Ok(())
        })
    }

    /// Bind `value` and append its placeholder.
    pub fn push_bind<T>(&mut self, value: T) -> &mut Self
    where
        T: ToSql + Send + Sync + 'static,
    {
        self.record(|b| {
            b.arg(Param::new(value));
            Ok(())
        })
    }

    /// Append an expression.
    pub fn push_expr(&mut self, expr: impl SqlExpr) -> &mut Self {
        self.record(|b| b.expr(&expr).map(drop))
    }

    /// Append an expression inside parentheses.
    pub fn push_sub(&mut self, expr: impl SqlExpr) -> &mut Self {
        self.record(|b| b.sub_expr(&expr).map(drop))
    }

    /// Inline an expression or bind a value.
    pub fn push_any(&mut self, value: impl IntoArg) -> &mut Self {
        let arg: Arg = value.into_arg();
        self.record(|b| b.any(&arg).map(drop))
    }

    /// The first recorded failure, if any.
    pub fn error(&self) -> Option<&WeaveError> {
        self.error.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.builder.is_empty()
    }

    pub fn builder(&self) -> &Builder {
        &self.builder
    }

    /// Render SQL with `$1, $2, ...` placeholders, ignoring any recorded error.
    pub fn to_sql(&self) -> String {
        self.builder.to_sql()
    }

    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.builder.params_ref()
    }

    /// Render the final statement, or return the first recorded failure.
    pub fn build(&self) -> WeaveResult<Built> {
        if let Some(err) = &self.error {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                target: "sqlweave.sql",
                tag = self.tag.as_deref().unwrap_or("-"),
                kind = %err.kind(),
                "build failed"
            );
            return Err(err.clone());
        }

        let built = Built {
            sql: self.builder.to_sql(),
            params: self.builder.params().to_vec(),
        };

        #[cfg(feature = "tracing")]
        {
            let sql = if built.sql.len() > TRACE_SQL_BYTES {
                format!("{}...", super::truncate_sql_bytes(&built.sql, TRACE_SQL_BYTES))
            } else {
                built.sql.clone()
            };
            tracing::debug!(
                target: "sqlweave.sql",
                tag = self.tag.as_deref().unwrap_or("-"),
                param_count = built.params.len(),
                sql = %sql,
                "built sql"
            );
        }

        Ok(built)
    }

    fn record(&mut self, f: impl FnOnce(&mut Builder) -> WeaveResult<()>) -> &mut Self {
        if self.error.is_none() {
            if let Err(err) = f(&mut self.builder) {
                self.error = Some(err);
            }
        }
        self
    }
}

impl SqlExpr for Sql {
    fn append_to(&self, out: &mut Builder) -> WeaveResult<()> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        out.inline(&self.builder);
        Ok(())
    }
}

impl IntoArg for Sql {
    fn into_arg(self) -> Arg {
        Arg::expr(self)
    }
}

/// A finished statement: SQL text plus aligned bind values.
#[derive(Debug, Clone)]
pub struct Built {
    pub sql: String,
    pub params: Vec<Param>,
}

impl Built {
    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(Param::as_ref).collect()
    }
}
