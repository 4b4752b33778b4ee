use super::builder::Builder;
use crate::error::WeaveResult;
use crate::param::{Arg, IntoArg};
use std::sync::Arc;

/// A composition unit that appends its own text and arguments.
///
/// Implementations should append their first fragment through
/// [`Builder::text`] (or another spaced primitive) so spacing stays
/// associative.
pub trait SqlExpr: Send + Sync {
    fn append_to(&self, out: &mut Builder) -> WeaveResult<()>;
}

impl<T: SqlExpr + ?Sized> SqlExpr for &T {
    fn append_to(&self, out: &mut Builder) -> WeaveResult<()> {
        (**self).append_to(out)
    }
}

impl<T: SqlExpr + ?Sized> SqlExpr for Box<T> {
    fn append_to(&self, out: &mut Builder) -> WeaveResult<()> {
        (**self).append_to(out)
    }
}

impl<T: SqlExpr + ?Sized> SqlExpr for Arc<T> {
    fn append_to(&self, out: &mut Builder) -> WeaveResult<()> {
        (**self).append_to(out)
    }
}

/// Trusted SQL text, appended as is (spaced, never parsed for placeholders).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raw(pub String);

impl Raw {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }
}

impl SqlExpr for Raw {
    fn append_to(&self, out: &mut Builder) -> WeaveResult<()> {
        out.text(&self.0);
        Ok(())
    }
}

impl IntoArg for Raw {
    fn into_arg(self) -> Arg {
        Arg::expr(self)
    }
}

/// Wraps an expression in parentheses.
#[derive(Debug, Clone)]
pub struct Paren<E>(pub E);

impl<E: SqlExpr> SqlExpr for Paren<E> {
    fn append_to(&self, out: &mut Builder) -> WeaveResult<()> {
        out.sub_expr(&self.0)?;
        Ok(())
    }
}

impl<E: SqlExpr + 'static> IntoArg for Paren<E> {
    fn into_arg(self) -> Arg {
        Arg::expr(self)
    }
}

/// Expressions joined by a separator.
///
/// Items that append nothing are skipped together with their separator, so an
/// empty item never leaves a dangling `and` or `,` behind.
#[derive(Clone)]
pub struct Join {
    sep: String,
    items: Vec<Arc<dyn SqlExpr>>,
}

impl Join {
    pub fn new(sep: impl Into<String>) -> Self {
        Self {
            sep: sep.into(),
            items: Vec::new(),
        }
    }

    /// `a and b and ...`
    pub fn and() -> Self {
        Self::new("and")
    }

    /// `a or b or ...`
    pub fn or() -> Self {
        Self::new("or")
    }

    /// `a, b, ...`
    pub fn comma() -> Self {
        Self::new(",")
    }

    pub fn push(&mut self, item: impl SqlExpr + 'static) -> &mut Self {
        self.items.push(Arc::new(item));
        self
    }

    /// Consuming counterpart of [`Join::push`].
    pub fn with(mut self, item: impl SqlExpr + 'static) -> Self {
        self.items.push(Arc::new(item));
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl std::fmt::Debug for Join {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Join")
            .field("sep", &self.sep)
            .field("items", &self.items.len())
            .finish()
    }
}

impl SqlExpr for Join {
    fn append_to(&self, out: &mut Builder) -> WeaveResult<()> {
        let mut wrote_any = false;
        for item in &self.items {
            let before_sep = out.mark();
            if wrote_any {
                out.text(&self.sep);
            }
            let before_item = out.mark();
            item.append_to(out)?;
            if out.mark() == before_item {
                out.truncate(before_sep);
            } else {
                wrote_any = true;
            }
        }
        Ok(())
    }
}

impl IntoArg for Join {
    fn into_arg(self) -> Arg {
        Arg::expr(self)
    }
}
