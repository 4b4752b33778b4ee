//! The JEL operator whitelist.

/// Where an operator sits relative to its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixity {
    /// `a op b op c`
    Infix,
    /// `op a`
    Prefix,
    /// `a op`
    Postfix,
    /// `a = any(b)`
    Any,
    /// `a between b and c`
    Between,
}

/// Accepted operand counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exactly(n) => count == n,
            Self::AtLeast(n) => count >= n,
        }
    }
}

impl std::fmt::Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exactly(1) => f.write_str("exactly 1 argument"),
            Self::Exactly(n) => write!(f, "exactly {n} arguments"),
            Self::AtLeast(n) => write!(f, "at least {n} arguments"),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Operator {
    pub name: &'static str,
    pub fixity: Fixity,
    pub arity: Arity,
}

const fn op(name: &'static str, fixity: Fixity, arity: Arity) -> Operator {
    Operator {
        name,
        fixity,
        arity,
    }
}

pub static OPERATORS: &[Operator] = &[
    op("and", Fixity::Infix, Arity::AtLeast(2)),
    op("or", Fixity::Infix, Arity::AtLeast(2)),
    op("not", Fixity::Prefix, Arity::Exactly(1)),
    op("is null", Fixity::Postfix, Arity::Exactly(1)),
    op("is not null", Fixity::Postfix, Arity::Exactly(1)),
    op("is true", Fixity::Postfix, Arity::Exactly(1)),
    op("is not true", Fixity::Postfix, Arity::Exactly(1)),
    op("is false", Fixity::Postfix, Arity::Exactly(1)),
    op("is not false", Fixity::Postfix, Arity::Exactly(1)),
    op("is unknown", Fixity::Postfix, Arity::Exactly(1)),
    op("is not unknown", Fixity::Postfix, Arity::Exactly(1)),
    op("is distinct from", Fixity::Infix, Arity::Exactly(2)),
    op("is not distinct from", Fixity::Infix, Arity::Exactly(2)),
    op("=", Fixity::Infix, Arity::AtLeast(2)),
    op("~", Fixity::Infix, Arity::AtLeast(2)),
    op("~*", Fixity::Infix, Arity::AtLeast(2)),
    op("~=", Fixity::Infix, Arity::AtLeast(2)),
    op("<>", Fixity::Infix, Arity::AtLeast(2)),
    op("<", Fixity::Infix, Arity::AtLeast(2)),
    op(">", Fixity::Infix, Arity::AtLeast(2)),
    op(">=", Fixity::Infix, Arity::AtLeast(2)),
    op("<=", Fixity::Infix, Arity::AtLeast(2)),
    op("@@", Fixity::Infix, Arity::AtLeast(2)),
    op("any", Fixity::Any, Arity::Exactly(2)),
    op("between", Fixity::Between, Arity::Exactly(3)),
];

/// Find a whitelisted operator by its exact name.
pub fn lookup(name: &str) -> Option<&'static Operator> {
    OPERATORS.iter().find(|op| op.name == name)
}
