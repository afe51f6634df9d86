//! KeyValues text parser
//!
//! Grammar:
//!
//! ```text
//! document  := pair*
//! pair      := token (token | '{' pair* '}') condition?
//! token     := '"' chars '"' | bare
//! condition := '[' expr ']'
//! ```
//!
//! `//` starts a comment that runs to the end of the line. Top-level
//! `#base` / `#include` directives are skipped; this parser never follows
//! them into other files.
//!
//! Conditions such as `[$WIN32]` or `[!$X360]` are evaluated against the
//! desktop platform set, so console-only duplicates drop out instead of
//! colliding with their desktop counterparts.

use std::borrow::Cow;
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use crate::document::{Document, Node, Value};

/// Platform symbols a `[$...]` condition treats as true
const DESKTOP_PLATFORMS: &[&str] = &["WIN32", "WIN64", "WINDOWS", "PC", "DECK"];

/// Parser options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Decode `\n`, `\t`, `\\` and `\"` inside quoted tokens
    pub escape_sequences: bool,
}

/// Parse failure with a 1-based source position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at line {}, column {}",
            self.message, self.line, self.column
        )
    }
}

impl std::error::Error for ParseError {}

/// Decode raw bytes (UTF-8 with or without BOM, or UTF-16 LE with BOM) and parse
pub fn parse_bytes(bytes: &[u8], options: ParseOptions) -> Result<Document, ParseError> {
    let text = decode_text(bytes)?;
    parse(&text, options)
}

/// Parse KV text into a document
pub fn parse(text: &str, options: ParseOptions) -> Result<Document, ParseError> {
    let mut parser = Parser {
        lexer: Lexer::new(text, options.escape_sequences),
        peeked: None,
    };
    let roots = parser.pairs(0)?;
    Ok(Document { roots })
}

fn decode_text(bytes: &[u8]) -> Result<Cow<'_, str>, ParseError> {
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return std::str::from_utf8(rest)
            .map(Cow::Borrowed)
            .map_err(|e| encoding_error(e.to_string()));
    }

    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        if rest.len() % 2 != 0 {
            return Err(encoding_error("odd byte count in UTF-16 text".to_string()));
        }
        let units = rest
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
        return char::decode_utf16(units)
            .collect::<Result<String, _>>()
            .map(Cow::Owned)
            .map_err(|e| encoding_error(e.to_string()));
    }

    std::str::from_utf8(bytes)
        .map(Cow::Borrowed)
        .map_err(|e| encoding_error(e.to_string()))
}

fn encoding_error(message: String) -> ParseError {
    ParseError {
        line: 0,
        column: 0,
        message: format!("invalid text encoding: {}", message),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Text(String),
    Open,
    Close,
    Condition(String),
}

#[derive(Debug, Clone, Copy)]
struct Pos {
    line: usize,
    column: usize,
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
    escapes: bool,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str, escapes: bool) -> Self {
        Self {
            chars: text.chars().peekable(),
            line: 1,
            column: 1,
            escapes,
        }
    }

    fn pos(&self) -> Pos {
        Pos {
            line: self.line,
            column: self.column,
        }
    }

    fn error(&self, pos: Pos, message: impl Into<String>) -> ParseError {
        ParseError {
            line: pos.line,
            column: pos.column,
            message: message.into(),
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Skip whitespace and `//` comments
    fn skip_trivia(&mut self) {
        loop {
            match self.chars.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') => {
                    let mut ahead = self.chars.clone();
                    ahead.next();
                    if ahead.peek() != Some(&'/') {
                        return;
                    }
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                _ => return,
            }
        }
    }

    fn next_token(&mut self) -> Result<Option<(Token, Pos)>, ParseError> {
        self.skip_trivia();
        let pos = self.pos();
        let Some(&c) = self.chars.peek() else {
            return Ok(None);
        };

        let token = match c {
            '{' => {
                self.bump();
                Token::Open
            }
            '}' => {
                self.bump();
                Token::Close
            }
            '"' => {
                self.bump();
                Token::Text(self.quoted(pos)?)
            }
            '[' => {
                self.bump();
                Token::Condition(self.condition(pos)?)
            }
            _ => Token::Text(self.bare()),
        };

        Ok(Some((token, pos)))
    }

    fn quoted(&mut self, start: Pos) -> Result<String, ParseError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error(start, "unterminated string")),
                Some('"') => return Ok(out),
                Some('\\') if self.escapes => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('\\') => out.push('\\'),
                    Some('"') => out.push('"'),
                    Some(other) => {
                        out.push('\\');
                        out.push(other);
                    }
                    None => return Err(self.error(start, "unterminated string")),
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn condition(&mut self, start: Pos) -> Result<String, ParseError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => return Err(self.error(start, "unterminated condition")),
                Some(']') => return Ok(out.trim().to_string()),
                Some(c) => out.push(c),
            }
        }
    }

    fn bare(&mut self) -> String {
        let mut out = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() || matches!(c, '"' | '{' | '}') {
                break;
            }
            out.push(c);
            self.bump();
        }
        out
    }
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    peeked: Option<(Token, Pos)>,
}

impl Parser<'_> {
    fn next(&mut self) -> Result<Option<(Token, Pos)>, ParseError> {
        match self.peeked.take() {
            Some(t) => Ok(Some(t)),
            None => self.lexer.next_token(),
        }
    }

    fn peek(&mut self) -> Result<Option<&(Token, Pos)>, ParseError> {
        if self.peeked.is_none() {
            self.peeked = self.lexer.next_token()?;
        }
        Ok(self.peeked.as_ref())
    }

    fn pairs(&mut self, depth: usize) -> Result<Vec<Node>, ParseError> {
        let mut nodes = Vec::new();

        loop {
            let Some((token, pos)) = self.next()? else {
                if depth > 0 {
                    let end = self.lexer.pos();
                    return Err(self.lexer.error(end, "unexpected end of input, missing '}'"));
                }
                return Ok(nodes);
            };

            let key = match token {
                Token::Text(key) => key,
                Token::Close if depth > 0 => return Ok(nodes),
                Token::Close => return Err(self.lexer.error(pos, "unexpected '}'")),
                Token::Open => return Err(self.lexer.error(pos, "expected key, found '{'")),
                Token::Condition(_) => {
                    return Err(self.lexer.error(pos, "expected key, found condition"))
                }
            };

            let value = match self.next()? {
                Some((Token::Text(text), _)) => Value::Text(text),
                Some((Token::Open, _)) => Value::Children(self.pairs(depth + 1)?),
                Some((_, value_pos)) => {
                    return Err(self
                        .lexer
                        .error(value_pos, format!("missing value for key '{}'", key)))
                }
                None => {
                    return Err(self
                        .lexer
                        .error(pos, format!("missing value for key '{}'", key)))
                }
            };

            let mut included = true;
            let has_condition = matches!(self.peek()?, Some((Token::Condition(_), _)));
            if has_condition {
                if let Some((Token::Condition(expr), _)) = self.next()? {
                    included = evaluate_condition(&expr);
                }
            }

            if depth == 0 && key.starts_with('#') {
                tracing::debug!(directive = %key, "skipping KV directive");
                continue;
            }

            if included {
                nodes.push(Node { name: key, value });
            }
        }
    }
}

/// Evaluate `$A || !$B` style platform conditions
fn evaluate_condition(expr: &str) -> bool {
    expr.split("||").any(|term| {
        let term = term.trim();
        let (negated, symbol) = match term.strip_prefix('!') {
            Some(rest) => (true, rest.trim()),
            None => (false, term),
        };
        let symbol = symbol.trim_start_matches('$');
        let matched = DESKTOP_PLATFORMS
            .iter()
            .any(|p| p.eq_ignore_ascii_case(symbol));
        matched != negated
    })
}
