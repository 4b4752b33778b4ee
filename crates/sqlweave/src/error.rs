//! Error types for sqlweave

use std::fmt;
use thiserror::Error;

/// Result type alias for sqlweave operations
pub type WeaveResult<T> = Result<T, WeaveError>;

/// Classification of a composition failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed template or JSON, arity or type violations
    InvalidInput,
    /// A parameter with no matching argument
    MissingArgument,
    /// Ordinal and named parameters mixed, or a dictionary of the wrong kind
    UnexpectedParameter,
    /// A supplied argument that no parameter referenced
    UnusedArgument,
    /// `$N` past the end of the positional arguments
    OrdinalOutOfBounds,
    /// Identifier or path that does not resolve through a schema
    UnknownField,
    /// Unterminated quote or block comment
    UnexpectedEof,
    /// Invariant violation inside sqlweave itself
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidInput => "invalid input",
            Self::MissingArgument => "missing argument",
            Self::UnexpectedParameter => "unexpected parameter",
            Self::UnusedArgument => "unused argument",
            Self::OrdinalOutOfBounds => "ordinal out of bounds",
            Self::UnknownField => "unknown field",
            Self::UnexpectedEof => "unexpected end of input",
            Self::Internal => "internal error",
        };
        f.write_str(name)
    }
}

/// Error produced while tokenizing, composing or transpiling SQL.
///
/// Every error carries its [`ErrorKind`], the operation that was running
/// (`context`) and the underlying cause.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} while {context}: {cause}")]
pub struct WeaveError {
    kind: ErrorKind,
    context: String,
    cause: String,
}

impl WeaveError {
    /// Create an error of an arbitrary kind
    pub fn new(kind: ErrorKind, context: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            kind,
            context: context.into(),
            cause: cause.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(context: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, context, cause)
    }

    /// Create a missing argument error
    pub fn missing_argument(context: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingArgument, context, cause)
    }

    /// Create an unexpected parameter error
    pub fn unexpected_parameter(context: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnexpectedParameter, context, cause)
    }

    /// Create an unused argument error
    pub fn unused_argument(context: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnusedArgument, context, cause)
    }

    /// Create an ordinal out of bounds error
    pub fn ordinal_out_of_bounds(ordinal: usize, len: usize, context: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::OrdinalOutOfBounds,
            context,
            format!("${ordinal} referenced but only {len} positional argument(s) supplied"),
        )
    }

    /// Create an unknown field error
    pub fn unknown_field(context: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownField, context, cause)
    }

    /// Create an unexpected end of input error
    pub fn unexpected_eof(context: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnexpectedEof, context, cause)
    }

    /// Create an internal error
    pub fn internal(context: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, context, cause)
    }

    /// Replace the context, keeping kind and cause.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn cause(&self) -> &str {
        &self.cause
    }

    /// Check if this is an invalid input error
    pub fn is_invalid_input(&self) -> bool {
        self.kind == ErrorKind::InvalidInput
    }

    /// Check if this is a missing argument error
    pub fn is_missing_argument(&self) -> bool {
        self.kind == ErrorKind::MissingArgument
    }

    /// Check if this is an unused argument error
    pub fn is_unused_argument(&self) -> bool {
        self.kind == ErrorKind::UnusedArgument
    }

    /// Check if this is an unknown field error
    pub fn is_unknown_field(&self) -> bool {
        self.kind == ErrorKind::UnknownField
    }
}

impl From<serde_json::Error> for WeaveError {
    fn from(err: serde_json::Error) -> Self {
        Self::invalid_input("decoding JSON", err.to_string())
    }
}
