//! `#[sql(...)]` attribute parsing shared by both derives.

use crate::sql_ident::{parse_external_name, parse_sql_ident_with_span};
use heck::{ToKebabCase, ToLowerCamelCase, ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};
use std::collections::HashSet;
use syn::ext::IdentExt;
use syn::punctuated::Punctuated;
use syn::{Data, DeriveInput, Expr, ExprLit, Field, Fields, Lit, LitStr, Meta, Result, Token};

#[derive(Clone, Copy)]
pub(crate) enum RenameRule {
    Snake,
    LowerCamel,
    UpperCamel,
    ShoutySnake,
    Kebab,
    Lower,
    Upper,
}

impl RenameRule {
    fn parse(lit: &LitStr) -> Result<Self> {
        Ok(match lit.value().as_str() {
            "snake_case" => Self::Snake,
            "camelCase" => Self::LowerCamel,
            "PascalCase" => Self::UpperCamel,
            "SCREAMING_SNAKE_CASE" => Self::ShoutySnake,
            "kebab-case" => Self::Kebab,
            "lowercase" => Self::Lower,
            "UPPERCASE" => Self::Upper,
            other => {
                return Err(syn::Error::new(
                    lit.span(),
                    format!("unknown rename_all rule '{other}'"),
                ));
            }
        })
    }

    fn apply(self, name: &str) -> String {
        match self {
            Self::Snake => name.to_snake_case(),
            Self::LowerCamel => name.to_lower_camel_case(),
            Self::UpperCamel => name.to_upper_camel_case(),
            Self::ShoutySnake => name.to_shouty_snake_case(),
            Self::Kebab => name.to_kebab_case(),
            Self::Lower => name.to_lowercase(),
            Self::Upper => name.to_uppercase(),
        }
    }
}

/// One struct field after attribute processing.
pub(crate) struct SqlField<'a> {
    pub field: &'a Field,
    pub ident: &'a syn::Ident,
    /// External name (field paths, JEL, `:name` placeholders).
    pub name: String,
    pub column: String,
    pub nested: bool,
}

#[derive(Default)]
struct FieldAttrs {
    column: Option<LitStr>,
    rename: Option<LitStr>,
    nested: bool,
    skip: bool,
}

fn sql_attr_items(attrs: &[syn::Attribute]) -> Result<Vec<Meta>> {
    let mut items = Vec::new();
    for attr in attrs {
        if !attr.path().is_ident("sql") {
            continue;
        }
        let nested = attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)?;
        items.extend(nested);
    }
    Ok(items)
}

fn string_value(meta: &Meta, what: &str) -> Result<LitStr> {
    if let Meta::NameValue(nv) = meta {
        if let Expr::Lit(ExprLit {
            lit: Lit::Str(lit), ..
        }) = &nv.value
        {
            return Ok(lit.clone());
        }
    }
    Err(syn::Error::new_spanned(
        meta,
        format!("sql({what} = \"...\") expects a string literal"),
    ))
}

fn parse_rename_all(input: &DeriveInput) -> Result<Option<RenameRule>> {
    let mut rule = None;
    for meta in sql_attr_items(&input.attrs)? {
        if meta.path().is_ident("rename_all") {
            rule = Some(RenameRule::parse(&string_value(&meta, "rename_all")?)?);
        } else {
            return Err(syn::Error::new_spanned(
                meta.path(),
                "unknown struct attribute, expected sql(rename_all = \"...\")",
            ));
        }
    }
    Ok(rule)
}

fn parse_field_attrs(field: &Field) -> Result<FieldAttrs> {
    let mut attrs = FieldAttrs::default();
    for meta in sql_attr_items(&field.attrs)? {
        let path = meta.path();
        if path.is_ident("column") {
            attrs.column = Some(string_value(&meta, "column")?);
        } else if path.is_ident("rename") {
            attrs.rename = Some(string_value(&meta, "rename")?);
        } else if path.is_ident("nested") && matches!(meta, Meta::Path(_)) {
            attrs.nested = true;
        } else if path.is_ident("skip") && matches!(meta, Meta::Path(_)) {
            attrs.skip = true;
        } else {
            return Err(syn::Error::new_spanned(
                &meta,
                "unknown field attribute, expected one of: column, rename, nested, skip",
            ));
        }
    }
    Ok(attrs)
}

/// Named fields of a struct with `#[sql(...)]` applied; skipped fields are
/// dropped. Rejects duplicate external names and invalid columns.
pub(crate) fn sql_fields<'a>(input: &'a DeriveInput, derive: &str) -> Result<Vec<SqlField<'a>>> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    format!("{derive} can only be derived for structs with named fields"),
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                format!("{derive} can only be derived for structs"),
            ));
        }
    };

    let rename_all = parse_rename_all(input)?;
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let attrs = parse_field_attrs(field)?;
        if attrs.skip {
            continue;
        }

        let rust_name = ident.unraw().to_string();
        let name = match (&attrs.rename, rename_all) {
            (Some(lit), _) => parse_external_name(&lit.value(), lit.span())?,
            (None, Some(rule)) => parse_external_name(&rule.apply(&rust_name), ident.span())?,
            (None, None) => rust_name.clone(),
        };
        let column = match &attrs.column {
            Some(lit) => parse_sql_ident_with_span(&lit.value(), lit.span(), "sql(column)")?,
            None => parse_sql_ident_with_span(&rust_name, ident.span(), "column")?,
        };

        if !seen.insert(name.clone()) {
            return Err(syn::Error::new_spanned(
                field,
                format!("duplicate external field name '{name}'"),
            ));
        }

        out.push(SqlField {
            field,
            ident,
            name,
            column,
            nested: attrs.nested,
        });
    }

    Ok(out)
}
