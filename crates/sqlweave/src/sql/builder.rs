use super::compose;
use super::expr::SqlExpr;
use super::options::ComposeOptions;
use crate::dict::ArgDict;
use crate::error::WeaveResult;
use crate::param::{Arg, Param};
use crate::template::Template;
use tokio_postgres::types::ToSql;

#[derive(Debug, Clone)]
enum SqlPart {
    Raw(String),
    /// 1-based index into `Builder::params`
    Param(usize),
}

/// Rollback point returned by [`Builder::mark`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    parts: usize,
    raw_len: Option<usize>,
    params: usize,
}

/// Output accumulator shared by every expression.
///
/// `Builder` stores text and placeholders separately from the bound values and
/// renders `$1, $2, ...` in [`Builder::to_sql`]. Every emitted ordinal refers
/// to a value in [`Builder::params`], so the two always line up.
///
/// Text appended through [`Builder::text`] is spaced: exactly one space is
/// inserted between two fragments unless the buffer is empty, already ends in
/// whitespace or an opening bracket, or the new fragment starts with
/// whitespace, a closing bracket, `,` or `;`.
#[derive(Debug, Clone, Default)]
pub struct Builder {
    parts: Vec<SqlPart>,
    params: Vec<Param>,
    options: ComposeOptions,
}

impl Builder {
    /// Create an empty builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty builder with the given options.
    pub fn with_options(options: ComposeOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> ComposeOptions {
        self.options
    }

    pub fn set_options(&mut self, options: ComposeOptions) -> &mut Self {
        self.options = options;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Number of bound values (equals the highest emitted ordinal).
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Append `text` with a separating space where needed.
    pub fn text(&mut self, text: &str) -> &mut Self {
        let Some(head) = text.chars().next() else {
            return self;
        };
        if self.needs_space(head) {
            self.raw(" ");
        }
        self.raw(text)
    }

    /// Append `text` exactly as given.
    pub(crate) fn raw(&mut self, text: &str) -> &mut Self {
        if text.is_empty() {
            return self;
        }
        match self.parts.last_mut() {
            Some(SqlPart::Raw(last)) => last.push_str(text),
            _ => self.parts.push(SqlPart::Raw(text.to_string())),
        }
        self
    }

    /// Bind `value` and append its spaced placeholder.
    pub fn arg(&mut self, value: Param) -> &mut Self {
        let ordinal = self.push_param(value);
        self.placeholder(ordinal, true)
    }

    /// Bind any `ToSql` value and append its spaced placeholder.
    pub fn bind<T>(&mut self, value: T) -> &mut Self
    where
        T: ToSql + Send + Sync + 'static,
    {
        self.arg(Param::new(value))
    }

    /// Store a value without emitting a placeholder. Returns its ordinal.
    pub(crate) fn push_param(&mut self, value: Param) -> usize {
        self.params.push(value);
        self.params.len()
    }

    pub(crate) fn placeholder(&mut self, ordinal: usize, spaced: bool) -> &mut Self {
        if spaced && self.needs_space('$') {
            self.raw(" ");
        }
        self.parts.push(SqlPart::Param(ordinal));
        self
    }

    /// Let `expr` append itself.
    pub fn expr(&mut self, expr: &dyn SqlExpr) -> WeaveResult<&mut Self> {
        expr.append_to(self)?;
        Ok(self)
    }

    /// Let `expr` append itself inside parentheses.
    pub fn sub_expr(&mut self, expr: &dyn SqlExpr) -> WeaveResult<&mut Self> {
        self.text("(");
        expr.append_to(self)?;
        Ok(self.text(")"))
    }

    /// Inline an expression argument, bind a value argument.
    pub fn any(&mut self, arg: &Arg) -> WeaveResult<&mut Self> {
        match arg {
            Arg::Value(param) => Ok(self.arg(param.clone())),
            Arg::Expr(expr) => self.expr(&**expr),
        }
    }

    /// Compose `template` against `args`, using the template cache.
    pub fn append(&mut self, template: &str, args: Option<&dyn ArgDict>) -> WeaveResult<&mut Self> {
        let template = Template::preparse(template)?;
        self.append_template(&template, args)
    }

    /// Compose an already parsed template against `args`.
    ///
    /// On failure the builder is rolled back to its state before the call.
    pub fn append_template(
        &mut self,
        template: &Template,
        args: Option<&dyn ArgDict>,
    ) -> WeaveResult<&mut Self> {
        let mark = self.mark();
        if let Err(err) = compose::compose(self, template, args) {
            self.truncate(mark);
            return Err(err);
        }
        Ok(self)
    }

    /// Flatten `other` into this builder, re-basing its placeholders past the
    /// values already bound here. Its first fragment is spaced.
    pub fn inline(&mut self, other: &Builder) -> &mut Self {
        self.splice(other, true)
    }

    /// Like [`Builder::inline`]; with `spaced` false the first fragment is
    /// copied verbatim as well.
    pub(crate) fn splice(&mut self, other: &Builder, spaced: bool) -> &mut Self {
        let base = self.params.len();
        self.params.extend(other.params.iter().cloned());
        for (i, part) in other.parts.iter().enumerate() {
            let first = spaced && i == 0;
            match part {
                SqlPart::Raw(text) if first => self.text(text),
                SqlPart::Raw(text) => self.raw(text),
                SqlPart::Param(ordinal) => self.placeholder(base + ordinal, first),
            };
        }
        self
    }

    /// Remember the current length so it can be restored with [`Builder::truncate`].
    pub fn mark(&self) -> Mark {
        Mark {
            parts: self.parts.len(),
            raw_len: match self.parts.last() {
                Some(SqlPart::Raw(text)) => Some(text.len()),
                _ => None,
            },
            params: self.params.len(),
        }
    }

    /// Drop everything appended since `mark` was taken.
    pub fn truncate(&mut self, mark: Mark) -> &mut Self {
        self.parts.truncate(mark.parts);
        if let (Some(len), Some(SqlPart::Raw(text))) = (mark.raw_len, self.parts.last_mut()) {
            text.truncate(len);
        }
        self.params.truncate(mark.params);
        self
    }

    /// Render SQL with `$1, $2, ...` placeholders.
    pub fn to_sql(&self) -> String {
        #[inline]
        fn decimal_digits(n: usize) -> usize {
            if n < 10 {
                1
            } else if n < 100 {
                2
            } else {
                (n.ilog10() as usize) + 1
            }
        }

        #[inline]
        fn push_usize(out: &mut String, mut n: usize) {
            if n < 10 {
                out.push(char::from(b'0' + n as u8));
                return;
            }
            let mut buf = [0u8; 20];
            let mut pos = buf.len();
            while n > 0 {
                pos -= 1;
                buf[pos] = b'0' + (n % 10) as u8;
                n /= 10;
            }
            out.extend(buf[pos..].iter().map(|&b| char::from(b)));
        }

        // Pre-size to avoid repeated reallocations.
        let cap = self
            .parts
            .iter()
            .map(|part| match part {
                SqlPart::Raw(s) => s.len(),
                SqlPart::Param(ordinal) => 1 + decimal_digits(*ordinal),
            })
            .sum();

        let mut out = String::with_capacity(cap);
        for part in &self.parts {
            match part {
                SqlPart::Raw(s) => out.push_str(s),
                SqlPart::Param(ordinal) => {
                    out.push('$');
                    push_usize(&mut out, *ordinal);
                }
            }
        }
        out
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(Param::as_ref).collect()
    }

    fn needs_space(&self, head: char) -> bool {
        let tail = match self.parts.last() {
            None => return false,
            Some(SqlPart::Raw(text)) => match text.chars().next_back() {
                Some(c) => c,
                None => return false,
            },
            // Placeholders end in a digit.
            Some(SqlPart::Param(_)) => '0',
        };
        let tail_open = tail.is_whitespace() || matches!(tail, '(' | '[' | '{');
        let head_close = head.is_whitespace() || matches!(head, ')' | ']' | '}' | ',' | ';');
        !tail_open && !head_close
    }
}
