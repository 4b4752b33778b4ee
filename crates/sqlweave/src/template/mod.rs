//! Parsed SQL templates.
//!
//! A [`Template`] is the minimized, parameter-aware form of one SQL fragment:
//! comments are dropped, whitespace runs collapse to one space (and vanish at
//! either end) and adjacent text is merged, leaving only text, `$N` and
//! `:name` pieces.
//!
//! [`Template::preparse`] memoizes parsing per source string for the lifetime
//! of the process.

mod cache;
mod tokenizer;


pub use cache::{cache_len, clear_cache};
pub use tokenizer::{Token, TokenKind, Tokenizer};

use crate::error::WeaveResult;
use std::sync::Arc;

/// One piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    Text(String),
    /// 1-based
    Ordinal(usize),
    Named(String),
}

/// Parsed form of a SQL fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    pieces: Vec<Piece>,
    has_ordinal: bool,
    has_named: bool,
}

impl Template {
    /// Tokenize and minimize `source`. Prefer [`Template::preparse`], which
    /// caches the result.
    pub fn parse(source: &str) -> WeaveResult<Self> {
        let mut pieces = Vec::new();
        let mut text = String::new();
        let mut pending_space = false;
        let mut has_ordinal = false;
        let mut has_named = false;

        for token in Tokenizer::new(source) {
            let token = token?;
            // A dropped comment still separates the words around it.
            // Leading and trailing separators are trimmed; `Builder::text`
            // re-inserts them when fragments are joined.
            if token.kind == TokenKind::Whitespace || token.is_comment() {
                pending_space = !(pieces.is_empty() && text.is_empty());
                continue;
            }

            if pending_space {
                text.push(' ');
                pending_space = false;
            }

            match token.kind {
                TokenKind::OrdinalParam => {
                    let ordinal = token.ordinal()?;
                    flush_text(&mut text, &mut pieces);
                    pieces.push(Piece::Ordinal(ordinal));
                    has_ordinal = true;
                }
                TokenKind::NamedParam => {
                    let name = token.name()?;
                    flush_text(&mut text, &mut pieces);
                    pieces.push(Piece::Named(name.to_string()));
                    has_named = true;
                }
                _ => text.push_str(token.text),
            }
        }

        flush_text(&mut text, &mut pieces);

        Ok(Self {
            source: source.to_string(),
            pieces,
            has_ordinal,
            has_named,
        })
    }

    /// Return the cached template for `source`, parsing it on first use.
    pub fn preparse(source: &str) -> WeaveResult<Arc<Self>> {
        cache::preparse(source)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn has_params(&self) -> bool {
        self.has_ordinal || self.has_named
    }

    pub fn has_ordinal(&self) -> bool {
        self.has_ordinal
    }

    pub fn has_named(&self) -> bool {
        self.has_named
    }
}

fn flush_text(text: &mut String, pieces: &mut Vec<Piece>) {
    if !text.is_empty() {
        pieces.push(Piece::Text(std::mem::take(text)));
    }
}
