//! JEL: a restricted JSON expression language compiled to boolean SQL.
//!
//! A JEL node is one of:
//!
//! - a list whose head is a whitelisted operator: `["and", a, b]`, `["not", a]`,
//!   `["is null", a]`, `["any", a, b]`, `["between", a, lo, hi]`, ...
//! - a list whose head is a field path: a **cast** `["created", "2024-01-01T00:00:00Z"]`,
//!   binding the value decoded as the field's declared type
//! - a string: a field path (`"name"`, `"address.city"`) rendered as a quoted column
//! - a number, boolean or `null`: bound as a parameter
//!
//! Field paths are checked against a [`Schema`], so only known columns ever
//! reach the SQL text.
//!
//! ```ignore
//! let filter = Jel::parse::<User>(r#"["and", ["=", "name", ["name", "x"]], ["<", "age", 10]]"#)?;
//! let built = Sql::compose("select * from users where $1", args![filter]).build()?;
//! assert_eq!(built.sql, r#"select * from users where ("name" = $1) and ("age" < $2)"#);
//! ```

mod ops;

#[cfg(test)]
mod tests;

pub use ops::{Arity, Fixity, OPERATORS, Operator};

use crate::error::{WeaveError, WeaveResult};
use crate::param::{Arg, IntoArg, Param, SqlNull};
use crate::schema::{Schema, SchemaDesc};
use crate::sql::{Builder, SqlExpr};
use serde_json::Value;

const CONTEXT: &str = "compiling JEL";

#[derive(Debug, Clone)]
enum Node {
    Apply {
        op: &'static Operator,
        args: Vec<Node>,
    },
    /// Rendered column reference.
    Field(String),
    Bind(Param),
}

/// A compiled JEL filter.
///
/// An empty document (or a top-level `null`) compiles to `true`.
#[derive(Debug, Clone)]
pub struct Jel {
    root: Option<Node>,
}

impl Jel {
    /// Parse JEL text against the schema of `T`.
    pub fn parse<T: Schema>(json: &str) -> WeaveResult<Self> {
        Self::parse_with(&T::schema(), json)
    }

    /// Parse JEL text against an explicit schema.
    pub fn parse_with(schema: &SchemaDesc, json: &str) -> WeaveResult<Self> {
        if json.trim().is_empty() {
            return Ok(Self { root: None });
        }
        let value: Value = serde_json::from_str(json)
            .map_err(|err| WeaveError::from(err).with_context("parsing JEL"))?;
        Self::from_value_with(schema, &value)
    }

    /// Compile an already parsed JSON value against the schema of `T`.
    pub fn from_value<T: Schema>(value: &Value) -> WeaveResult<Self> {
        Self::from_value_with(&T::schema(), value)
    }

    pub fn from_value_with(schema: &SchemaDesc, value: &Value) -> WeaveResult<Self> {
        if value.is_null() {
            return Ok(Self { root: None });
        }
        Ok(Self {
            root: Some(compile(schema, value)?),
        })
    }

    /// Whether this filter renders as the constant `true`.
    pub fn is_trivial(&self) -> bool {
        self.root.is_none()
    }
}

fn compile(schema: &SchemaDesc, value: &Value) -> WeaveResult<Node> {
    match value {
        Value::Null => Ok(Node::Bind(Param::new(SqlNull))),
        Value::Bool(b) => Ok(Node::Bind(Param::new(*b))),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Node::Bind(Param::new(i)))
            } else if n.is_f64() {
                let f = n.as_f64().ok_or_else(|| {
                    WeaveError::internal(CONTEXT, format!("number {n} has no f64 form"))
                })?;
                Ok(Node::Bind(Param::new(f)))
            } else {
                Err(WeaveError::invalid_input(
                    CONTEXT,
                    format!("integer {n} does not fit in i64"),
                ))
            }
        }
        Value::String(path) => Ok(Node::Field(schema.resolve(path)?.to_sql())),
        Value::Object(_) => Err(WeaveError::invalid_input(
            CONTEXT,
            "objects are not valid JEL nodes",
        )),
        Value::Array(items) => {
            let Some((head, rest)) = items.split_first() else {
                return Err(WeaveError::invalid_input(CONTEXT, "empty list"));
            };
            let Value::String(head) = head else {
                return Err(WeaveError::invalid_input(
                    CONTEXT,
                    format!("list head must be a string, got `{head}`"),
                ));
            };
            match ops::lookup(head) {
                Some(op) => apply(schema, op, rest),
                None => cast(schema, head, rest),
            }
        }
    }
}

fn apply(schema: &SchemaDesc, op: &'static Operator, rest: &[Value]) -> WeaveResult<Node> {
    if !op.arity.accepts(rest.len()) {
        return Err(WeaveError::invalid_input(
            CONTEXT,
            format!("`{}` takes {}, got {}", op.name, op.arity, rest.len()),
        ));
    }
    let args = rest
        .iter()
        .map(|arg| compile(schema, arg))
        .collect::<WeaveResult<Vec<_>>>()?;
    Ok(Node::Apply { op, args })
}

fn cast(schema: &SchemaDesc, head: &str, rest: &[Value]) -> WeaveResult<Node> {
    // Not an operator: resolving it as a field reports unknown heads.
    let field = schema.resolve(head)?;
    let [value] = rest else {
        return Err(WeaveError::invalid_input(
            CONTEXT,
            format!("cast to `{head}` takes exactly 1 value, got {}", rest.len()),
        ));
    };
    let Some(decode) = field.decode else {
        return Err(WeaveError::invalid_input(
            CONTEXT,
            format!("`{head}` is a nested field and cannot be cast"),
        ));
    };
    Ok(Node::Bind(decode(value)?))
}

fn render(node: &Node, out: &mut Builder) {
    match node {
        Node::Field(column) => {
            out.text(column);
        }
        Node::Bind(param) => {
            out.arg(param.clone());
        }
        Node::Apply { op, args } => match (op.fixity, args.as_slice()) {
            (Fixity::Prefix, [arg]) => {
                out.text(op.name);
                operand(arg, out);
            }
            (Fixity::Postfix, [arg]) => {
                operand(arg, out);
                out.text(op.name);
            }
            (Fixity::Any, [lhs, rhs]) => {
                operand(lhs, out);
                out.text("= any(");
                render(rhs, out);
                out.text(")");
            }
            (Fixity::Between, [arg, low, high]) => {
                operand(arg, out);
                out.text("between");
                operand(low, out);
                out.text("and");
                operand(high, out);
            }
            // Infix, and any shape the arity check already let through.
            (_, args) => {
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        out.text(op.name);
                    }
                    operand(arg, out);
                }
            }
        },
    }
}

/// Operator applications used as operands are parenthesized.
fn operand(node: &Node, out: &mut Builder) {
    if matches!(node, Node::Apply { .. }) {
        out.text("(");
        render(node, out);
        out.text(")");
    } else {
        render(node, out);
    }
}

impl SqlExpr for Jel {
    fn append_to(&self, out: &mut Builder) -> WeaveResult<()> {
        match &self.root {
            None => {
                out.text("true");
            }
            Some(node) => render(node, out),
        }
        Ok(())
    }
}

impl IntoArg for Jel {
    fn into_arg(self) -> Arg {
        Arg::expr(self)
    }
}
