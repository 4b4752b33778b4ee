use proc_macro2::Span;
use syn::{Error, Result};

pub(crate) fn is_valid_sql_ident(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validate a column name.
pub(crate) fn parse_sql_ident_with_span(s: &str, span: Span, what: &str) -> Result<String> {
    let s = s.trim();
    if s.is_empty() {
        return Err(Error::new(span, format!("{what} must not be empty")));
    }
    if !is_valid_sql_ident(s) {
        return Err(Error::new(
            span,
            format!(
                "{what} '{s}' must be a valid SQL identifier (expected [A-Za-z_][A-Za-z0-9_]*)"
            ),
        ));
    }
    Ok(s.to_string())
}

/// Validate an external (field path) name: non-empty, no `.` separator.
pub(crate) fn parse_external_name(s: &str, span: Span) -> Result<String> {
    if s.is_empty() {
        return Err(Error::new(span, "external field name must not be empty"));
    }
    if s.contains('.') {
        return Err(Error::new(
            span,
            format!("external field name '{s}' must not contain '.'"),
        ));
    }
    Ok(s.to_string())
}
