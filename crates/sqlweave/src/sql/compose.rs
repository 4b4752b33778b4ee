//! Template composition: renumbering, deduplication and sub-query flattening.
//!
//! Every distinct source parameter is resolved once per call. A value argument
//! is bound at `1 + (values already in the output)` and every later reference
//! to the same source parameter reuses that ordinal. An expression argument is
//! inlined at each reference site with its own placeholders re-based, and
//! takes no ordinal of its own.

use super::builder::Builder;
use super::resolver::{Resolver, Slot};
use super::truncate_sql_bytes;
use crate::dict::{ArgDict, ParamKind};
use crate::error::{WeaveError, WeaveResult};
use crate::param::Arg;
use crate::template::{Piece, Template};

const CONTEXT_SQL_BYTES: usize = 80;

pub(super) fn compose(
    out: &mut Builder,
    template: &Template,
    args: Option<&dyn ArgDict>,
) -> WeaveResult<()> {
    let context = || {
        let source = template.source();
        if source.len() > CONTEXT_SQL_BYTES {
            format!(
                "composing `{}...`",
                truncate_sql_bytes(source, CONTEXT_SQL_BYTES)
            )
        } else {
            format!("composing `{source}`")
        }
    };

    if !template.has_params() {
        if args.is_some_and(|args| !args.is_empty()) {
            return Err(WeaveError::invalid_input(
                context(),
                "arguments supplied to a template without parameters",
            ));
        }
        append_text(out, template);
        return Ok(());
    }

    if template.has_ordinal() && template.has_named() {
        return Err(WeaveError::unexpected_parameter(
            context(),
            "template mixes ordinal ($N) and named (:name) parameters",
        ));
    }
    let kind = if template.has_ordinal() {
        ParamKind::Ordinal
    } else {
        ParamKind::Named
    };

    let Some(args) = args else {
        return Err(WeaveError::missing_argument(
            context(),
            "template has parameters but no arguments were supplied",
        ));
    };
    if !args.accepts(kind) {
        let cause = match kind {
            ParamKind::Ordinal => "ordinal parameters need a positional argument source",
            ParamKind::Named => "named parameters need a named argument source",
        };
        return Err(WeaveError::unexpected_parameter(context(), cause));
    }

    let mut resolver = Resolver::acquire();
    scan(out, template, args, &mut resolver, &context)?;

    if out.options().validate_unused {
        check_unused(args, &resolver, &context)?;
    }
    Ok(())
}

fn append_text(out: &mut Builder, template: &Template) {
    for (i, piece) in template.pieces().iter().enumerate() {
        if let Piece::Text(text) = piece {
            if i == 0 {
                out.text(text);
            } else {
                out.raw(text);
            }
        }
    }
}

fn scan(
    out: &mut Builder,
    template: &Template,
    args: &dyn ArgDict,
    resolver: &mut Resolver,
    context: &dyn Fn() -> String,
) -> WeaveResult<()> {
    for (i, piece) in template.pieces().iter().enumerate() {
        // Only the first fragment is spaced against what is already there.
        let spaced = i == 0;
        match piece {
            Piece::Text(text) if spaced => {
                out.text(text);
            }
            Piece::Text(text) => {
                out.raw(text);
            }
            Piece::Ordinal(ordinal) => {
                if let Some(Slot::Bound(target)) = resolver.ordinal(*ordinal) {
                    out.placeholder(target, spaced);
                    continue;
                }
                let arg = lookup_ordinal(args, *ordinal, context)?;
                let slot = emit(out, arg, spaced)?;
                resolver.set_ordinal(*ordinal, slot);
            }
            Piece::Named(name) => {
                if let Some(Slot::Bound(target)) = resolver.named(name) {
                    out.placeholder(target, spaced);
                    continue;
                }
                let arg = args.by_named(name).ok_or_else(|| {
                    WeaveError::missing_argument(context(), format!("no argument named `{name}`"))
                })?;
                let slot = emit(out, arg, spaced)?;
                resolver.set_named(name, slot);
            }
        }
    }
    Ok(())
}

fn lookup_ordinal(
    args: &dyn ArgDict,
    ordinal: usize,
    context: &dyn Fn() -> String,
) -> WeaveResult<Arg> {
    if ordinal > args.len() {
        return Err(WeaveError::ordinal_out_of_bounds(
            ordinal,
            args.len(),
            context(),
        ));
    }
    // A hole below the length.
    args.by_ordinal(ordinal - 1).ok_or_else(|| {
        WeaveError::missing_argument(context(), format!("no argument supplied for ${ordinal}"))
    })
}

fn emit(out: &mut Builder, arg: Arg, spaced: bool) -> WeaveResult<Slot> {
    match arg {
        Arg::Value(param) => {
            let target = out.push_param(param);
            out.placeholder(target, spaced);
            Ok(Slot::Bound(target))
        }
        Arg::Expr(expr) if spaced => {
            expr.append_to(out)?;
            Ok(Slot::Inlined)
        }
        // Mid-template: glued to the preceding text like a placeholder would be.
        Arg::Expr(expr) => {
            let mut inner = Builder::with_options(out.options());
            expr.append_to(&mut inner)?;
            out.splice(&inner, false);
            Ok(Slot::Inlined)
        }
    }
}

fn check_unused(
    args: &dyn ArgDict,
    resolver: &Resolver,
    context: &dyn Fn() -> String,
) -> WeaveResult<()> {
    if let Some(mut ordinals) = args.ordinals() {
        if let Some(index) = ordinals.find(|i| resolver.ordinal(i + 1).is_none()) {
            return Err(WeaveError::unused_argument(
                context(),
                format!("argument ${} was never referenced", index + 1),
            ));
        }
    }
    if let Some(keys) = args.named_keys() {
        if let Some(key) = keys.into_iter().find(|key| resolver.named(key).is_none()) {
            return Err(WeaveError::unused_argument(
                context(),
                format!("argument `{key}` was never referenced"),
            ));
        }
    }
    Ok(())
}
