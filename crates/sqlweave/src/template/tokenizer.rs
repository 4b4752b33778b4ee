//! Hand-written lexer for SQL-like text.
//!
//! The lexer only distinguishes what composition cares about: whitespace,
//! quoted runs, comments, the `::` cast operator and `$N` / `:name`
//! placeholders. Everything else is opaque text.

use crate::error::{WeaveError, WeaveResult};
use std::iter::FusedIterator;

const CONTEXT: &str = "tokenizing SQL";

/// Kind of a lexed [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Text,
    Whitespace,
    /// `'...'`
    QuotedSingle,
    /// `"..."`
    QuotedDouble,
    /// `` `...` ``
    QuotedGrave,
    /// `-- ...` up to (not including) the newline
    CommentLine,
    /// `/* ... */`, non-nesting
    CommentBlock,
    /// `::`
    DoubleColon,
    /// `$` followed by one or more ASCII digits
    OrdinalParam,
    /// `:` followed by an identifier
    NamedParam,
}

/// A slice of the source together with its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub kind: TokenKind,
}

impl<'a> Token<'a> {
    pub fn is_comment(&self) -> bool {
        matches!(self.kind, TokenKind::CommentLine | TokenKind::CommentBlock)
    }

    /// The 1-based index of an ordinal parameter (`$3` → `3`).
    pub fn ordinal(&self) -> WeaveResult<usize> {
        if self.kind != TokenKind::OrdinalParam {
            return Err(WeaveError::internal(
                "reading ordinal parameter",
                format!("token `{}` is {:?}", self.text, self.kind),
            ));
        }
        let ordinal: usize = self.text[1..].parse().map_err(|_| {
            WeaveError::invalid_input(
                "reading ordinal parameter",
                format!("`{}` does not fit in an ordinal", self.text),
            )
        })?;
        if ordinal == 0 {
            return Err(WeaveError::invalid_input(
                "reading ordinal parameter",
                "ordinal parameters start at $1",
            ));
        }
        Ok(ordinal)
    }

    /// The key of a named parameter (`:user_id` → `user_id`).
    pub fn name(&self) -> WeaveResult<&'a str> {
        if self.kind != TokenKind::NamedParam {
            return Err(WeaveError::internal(
                "reading named parameter",
                format!("token `{}` is {:?}", self.text, self.kind),
            ));
        }
        Ok(&self.text[1..])
    }
}

/// Lazy tokenizer over a source string.
///
/// Yields `Err` at most once (unterminated quote or comment) and is fused
/// afterwards. Concatenating the text of every yielded token gives back the
/// source.
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    src: &'a str,
    cursor: usize,
    /// Special token found right after a run of plain text.
    stash: Option<Token<'a>>,
    done: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            cursor: 0,
            stash: None,
            done: false,
        }
    }

    fn stash(&mut self, token: Token<'a>) -> WeaveResult<()> {
        if let Some(prev) = self.stash {
            return Err(WeaveError::internal(
                CONTEXT,
                format!(
                    "lookahead already holds `{}` while stashing `{}`",
                    prev.text, token.text
                ),
            ));
        }
        self.stash = Some(token);
        Ok(())
    }

    fn emit(&mut self, end: usize, kind: TokenKind) -> Token<'a> {
        let token = Token {
            text: &self.src[self.cursor..end],
            kind,
        };
        self.cursor = end;
        token
    }

    /// Try to lex a non-text token at the cursor. Advances only on success.
    fn special(&mut self) -> WeaveResult<Option<Token<'a>>> {
        let src = self.src;
        let bytes = src.as_bytes();
        let start = self.cursor;
        let next = bytes.get(start + 1).copied();

        let token = match bytes[start] {
            b if b.is_ascii_whitespace() => {
                let len = bytes[start..]
                    .iter()
                    .take_while(|b| b.is_ascii_whitespace())
                    .count();
                self.emit(start + len, TokenKind::Whitespace)
            }
            b'\'' => self.quoted(b'\'', TokenKind::QuotedSingle)?,
            b'"' => self.quoted(b'"', TokenKind::QuotedDouble)?,
            b'`' => self.quoted(b'`', TokenKind::QuotedGrave)?,
            b'-' if next == Some(b'-') => {
                let end = src[start..]
                    .find('\n')
                    .map_or(src.len(), |pos| start + pos);
                self.emit(end, TokenKind::CommentLine)
            }
            b'/' if next == Some(b'*') => match src[start + 2..].find("*/") {
                Some(pos) => self.emit(start + 2 + pos + 2, TokenKind::CommentBlock),
                None => {
                    return Err(WeaveError::unexpected_eof(
                        CONTEXT,
                        format!("unterminated block comment starting at byte {start}"),
                    ));
                }
            },
            b':' if next == Some(b':') => self.emit(start + 2, TokenKind::DoubleColon),
            b'$' => {
                let digits = bytes[start + 1..]
                    .iter()
                    .take_while(|b| b.is_ascii_digit())
                    .count();
                if digits == 0 {
                    return Ok(None);
                }
                self.emit(start + 1 + digits, TokenKind::OrdinalParam)
            }
            b':' => {
                let ident = ident_len(&bytes[start + 1..]);
                if ident == 0 {
                    return Ok(None);
                }
                self.emit(start + 1 + ident, TokenKind::NamedParam)
            }
            _ => return Ok(None),
        };
        Ok(Some(token))
    }

    fn quoted(&mut self, quote: u8, kind: TokenKind) -> WeaveResult<Token<'a>> {
        let start = self.cursor;
        let close = self.src.as_bytes()[start + 1..]
            .iter()
            .position(|&b| b == quote);
        match close {
            Some(pos) => Ok(self.emit(start + 1 + pos + 1, kind)),
            None => Err(WeaveError::unexpected_eof(
                CONTEXT,
                format!(
                    "unterminated {} quote starting at byte {start}",
                    quote as char
                ),
            )),
        }
    }
}

/// Length of a `[A-Za-z_][A-Za-z0-9_]*` identifier at the start of `bytes`.
fn ident_len(bytes: &[u8]) -> usize {
    match bytes.first() {
        Some(b) if b.is_ascii_alphabetic() || *b == b'_' => {
            1 + bytes[1..]
                .iter()
                .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
                .count()
        }
        _ => 0,
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = WeaveResult<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(token) = self.stash.take() {
            return Some(Ok(token));
        }
        if self.done {
            return None;
        }

        let text_start = self.cursor;
        while self.cursor < self.src.len() {
            let at = self.cursor;
            match self.special() {
                Ok(Some(token)) if at == text_start => return Some(Ok(token)),
                Ok(Some(token)) => {
                    if let Err(err) = self.stash(token) {
                        self.done = true;
                        return Some(Err(err));
                    }
                    return Some(Ok(Token {
                        text: &self.src[text_start..at],
                        kind: TokenKind::Text,
                    }));
                }
                Ok(None) => {
                    self.cursor += self.src[at..].chars().next().map_or(1, char::len_utf8);
                }
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }

        self.done = true;
        (self.cursor > text_start).then(|| {
            Ok(Token {
                text: &self.src[text_start..self.cursor],
                kind: TokenKind::Text,
            })
        })
    }
}

impl FusedIterator for Tokenizer<'_> {}
