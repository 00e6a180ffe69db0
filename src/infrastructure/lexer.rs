//! Relapse Tokenizer
//!
//! Splits grammar text into tokens with a `logos` scanner. Whitespace and
//! comments are real tokens: they are folded into the `before` space of the
//! token that follows them, and the trivia at the very end is carried by the
//! `Eof` token.

use logos::Logos;

use crate::domain::ast::Space;
use crate::domain::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Int,
    Float,
    /// `"..."` or a backtick raw string
    Str,
    /// `$int`, `$[]byte`, ...
    Variable,
    /// Punctuation and operators
    Symbol,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token
    pub text: String,
    /// Decoded value of string tokens
    pub value: Option<String>,
    pub before: Option<Space>,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn is_symbol(&self, s: &str) -> bool {
        self.kind == TokenKind::Symbol && self.text == s
    }

    /// Human readable form for error messages.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("'{}'", self.text),
        }
    }
}

/// Comparison operators that start a leaf pattern.
pub const BUILTINS: &[&str] = &["==", "!=", "<=", ">=", "<", ">", "~=", "*=", "^=", "$=", "::"];

/// Logos-based scanner token.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum LogosToken {
    #[regex(r"\s+")]
    Whitespace,
    #[regex(r"//[^\n]*")]
    LineComment,
    #[token("/*", block_comment)]
    BlockComment,

    #[regex(r"[\p{L}_][\p{L}\p{N}_]*")]
    Ident,
    #[regex(r"-?[0-9]+")]
    Int,
    #[regex(r"-?[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?|-?[0-9]+[eE][+-]?[0-9]+")]
    Float,
    #[regex(r#""(?:[^"\n\\]|\\.)*""#)]
    String,
    #[regex(r"`[^`]*`")]
    RawString,
    #[regex(r"\$(\[\])?[\p{L}\p{N}_]+")]
    Variable,

    #[token("<empty>")]
    #[token("->")]
    #[token("==")]
    #[token("!=")]
    #[token("<=")]
    #[token(">=")]
    #[token("~=")]
    #[token("*=")]
    #[token("^=")]
    #[token("$=")]
    #[token("::")]
    #[token("[]")]
    #[token("#")]
    #[token("=")]
    #[token("(")]
    #[token(")")]
    #[token("[")]
    #[token("]")]
    #[token("{")]
    #[token("}")]
    #[token("|")]
    #[token("&")]
    #[token(",")]
    #[token(";")]
    #[token(":")]
    #[token(".")]
    #[token("*")]
    #[token("?")]
    #[token("!")]
    #[token("@")]
    #[token("<")]
    #[token(">")]
    Symbol,
}

/// Consume the rest of a block comment; fails when it is never closed.
fn block_comment(lex: &mut logos::Lexer<LogosToken>) -> bool {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            true
        }
        None => false,
    }
}

/// Byte offset to 1-based line and column (in characters).
struct LineIndex<'a> {
    src: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(src: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(src.match_indices('\n').map(|(i, _)| i + 1));
        Self { src, line_starts }
    }

    fn position(&self, offset: usize) -> (usize, usize) {
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let start = self.line_starts[line - 1];
        (line, self.src[start..offset].chars().count() + 1)
    }
}

pub fn tokenize(src: &str) -> Result<Vec<Token>, ParseError> {
    let lines = LineIndex::new(src);
    let mut lexer = LogosToken::lexer(src);
    let mut tokens = Vec::new();
    let mut trivia = Vec::new();

    while let Some(result) = lexer.next() {
        let start = lexer.span().start;
        let slice = lexer.slice();
        let (line, column) = lines.position(start);
        let Ok(raw) = result else {
            return Err(scan_error(&src[start..], line, column));
        };
        let (kind, text, value) = match raw {
            LogosToken::Whitespace | LogosToken::LineComment | LogosToken::BlockComment => {
                trivia.push(slice.to_string());
                continue;
            }
            LogosToken::Ident => (TokenKind::Ident, slice.to_string(), None),
            LogosToken::Int => (TokenKind::Int, slice.to_string(), None),
            LogosToken::Float => (TokenKind::Float, slice.replace('E', "e"), None),
            LogosToken::String => {
                let value = unescape(&slice[1..slice.len() - 1]);
                (TokenKind::Str, slice.to_string(), Some(value))
            }
            LogosToken::RawString => {
                let value = slice[1..slice.len() - 1].to_string();
                (TokenKind::Str, slice.to_string(), Some(value))
            }
            LogosToken::Variable => (TokenKind::Variable, slice.to_string(), None),
            LogosToken::Symbol => (TokenKind::Symbol, slice.to_string(), None),
        };
        tokens.push(Token {
            kind,
            text,
            value,
            before: take_space(&mut trivia),
            line,
            column,
        });
    }

    let (line, column) = lines.position(src.len());
    tokens.push(Token {
        kind: TokenKind::Eof,
        text: String::new(),
        value: None,
        before: take_space(&mut trivia),
        line,
        column,
    });
    Ok(tokens)
}

fn take_space(trivia: &mut Vec<String>) -> Option<Space> {
    if trivia.is_empty() {
        None
    } else {
        Some(Space {
            space: std::mem::take(trivia),
        })
    }
}

/// Classify input the scanner rejected. `rest` starts at the failure.
fn scan_error(rest: &str, line: usize, column: usize) -> ParseError {
    if rest.starts_with("/*") {
        return ParseError::Unterminated { line, column, what: "comment" };
    }
    match rest.chars().next() {
        Some('"') => ParseError::Unterminated { line, column, what: "string" },
        Some('`') => ParseError::Unterminated { line, column, what: "raw string" },
        Some(found) => ParseError::UnexpectedChar { line, column, found },
        None => ParseError::UnexpectedChar { line, column, found: '\0' },
    }
}

/// Resolve backslash escapes in the body of a quoted string.
fn unescape(body: &str) -> String {
    let mut value = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => value.push('\n'),
            Some('t') => value.push('\t'),
            Some('r') => value.push('\r'),
            Some('0') => value.push('\0'),
            Some(other) => value.push(other),
            None => value.push('\\'),
        }
    }
    value
}
