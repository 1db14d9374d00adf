//! Directive tokenizer.
//!
//! # Responsibilities
//! - Split a byte buffer into statements ending in `;`, `{` or `}`
//! - Strip `#` comments, honour single/double quotes and backslash escapes
//! - Track line numbers for diagnostics
//!
//! # Design Decisions
//! - Pure function of the remaining input; the only state is the cursor
//! - A `#` starts a comment only at the beginning of a token
//! - Unknown escapes are kept verbatim, backslash included
//! - Input must be UTF-8 inside tokens

use std::sync::Arc;

use crate::error::{ConfError, ConfResult, ErrorKind, Location};

/// How a statement ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    /// `;`
    Directive,
    /// `{`
    BlockOpen,
    /// `}` on its own
    BlockClose,
}

/// A single argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    pub line: usize,
    pub quoted: bool,
}

/// One argument group. `args[0]` is the directive name; empty for `}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub args: Vec<Token>,
    pub terminator: Terminator,
    pub location: Location,
}

impl Statement {
    pub fn name(&self) -> &str {
        self.args.first().map(|t| t.value.as_str()).unwrap_or("")
    }

    /// Arguments after the name.
    pub fn values(&self) -> &[Token] {
        self.args.get(1..).unwrap_or(&[])
    }
}

/// Cursor over one configuration source.
#[derive(Debug)]
pub struct Tokenizer {
    file: Arc<str>,
    input: Vec<u8>,
    pos: usize,
    line: usize,
}

impl Tokenizer {
    pub fn new(file: impl Into<Arc<str>>, input: impl Into<Vec<u8>>) -> Self {
        Self {
            file: file.into(),
            input: input.into(),
            pos: 0,
            line: 1,
        }
    }

    pub fn file(&self) -> &Arc<str> {
        &self.file
    }

    /// Current position.
    pub fn location(&self) -> Location {
        self.location_at(self.line)
    }

    fn location_at(&self, line: usize) -> Location {
        Location {
            file: self.file.clone(),
            line,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
        }
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if !ch.is_ascii_whitespace() {
                break;
            }
            self.bump();
        }
    }

    fn skip_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == b'\n' {
                break;
            }
            self.bump();
        }
    }

    /// Read the next statement, or `None` at a clean end of input.
    pub fn next_statement(&mut self) -> ConfResult<Option<Statement>> {
        let mut args: Vec<Token> = Vec::new();

        loop {
            self.skip_whitespace();

            let Some(ch) = self.peek() else {
                if args.is_empty() {
                    return Ok(None);
                }
                return Err(ConfError::at(ErrorKind::UnexpectedEof, self.location()));
            };

            match ch {
                b'#' => self.skip_comment(),
                b';' | b'{' => {
                    let terminator = if ch == b';' {
                        Terminator::Directive
                    } else {
                        Terminator::BlockOpen
                    };
                    if args.is_empty() {
                        return Err(ConfError::syntax(
                            format!("unexpected \"{}\"", ch as char),
                            self.location(),
                        ));
                    }
                    self.bump();
                    let location = self.location_at(args[0].line);
                    return Ok(Some(Statement {
                        args,
                        terminator,
                        location,
                    }));
                }
                b'}' => {
                    if !args.is_empty() {
                        return Err(ConfError::syntax("unexpected \"}\"", self.location()));
                    }
                    let location = self.location();
                    self.bump();
                    return Ok(Some(Statement {
                        args,
                        terminator: Terminator::BlockClose,
                        location,
                    }));
                }
                b'"' | b'\'' => {
                    let token = self.read_quoted(ch)?;
                    match self.peek() {
                        None | Some(b';') | Some(b'{') => {}
                        Some(c) if c.is_ascii_whitespace() => {}
                        Some(c) => {
                            return Err(ConfError::syntax(
                                format!("unexpected \"{}\" after quoted argument", c as char),
                                self.location(),
                            ));
                        }
                    }
                    args.push(token);
                }
                _ => args.push(self.read_word()?),
            }
        }
    }

    /// Consume a backslash escape; the backslash itself is already consumed.
    fn read_escape(&mut self, out: &mut Vec<u8>) {
        match self.bump() {
            Some(b'"') => out.push(b'"'),
            Some(b'\'') => out.push(b'\''),
            Some(b'\\') => out.push(b'\\'),
            Some(b't') => out.push(b'\t'),
            Some(b'r') => out.push(b'\r'),
            Some(b'n') => out.push(b'\n'),
            Some(other) => {
                out.push(b'\\');
                out.push(other);
            }
            None => out.push(b'\\'),
        }
    }

    fn read_quoted(&mut self, quote: u8) -> ConfResult<Token> {
        let line = self.line;
        self.bump();
        let mut out = Vec::new();

        loop {
            match self.bump() {
                None => return Err(ConfError::at(ErrorKind::UnexpectedEof, self.location_at(line))),
                Some(b'\\') => self.read_escape(&mut out),
                Some(ch) if ch == quote => break,
                Some(ch) => out.push(ch),
            }
        }

        Ok(Token {
            value: self.utf8(out, line)?,
            line,
            quoted: true,
        })
    }

    fn read_word(&mut self) -> ConfResult<Token> {
        let line = self.line;
        let mut out = Vec::new();

        while let Some(ch) = self.peek() {
            if ch.is_ascii_whitespace() || matches!(ch, b';' | b'{' | b'}') {
                break;
            }
            self.bump();
            if ch == b'\\' {
                self.read_escape(&mut out);
            } else {
                out.push(ch);
            }
        }

        Ok(Token {
            value: self.utf8(out, line)?,
            line,
            quoted: false,
        })
    }

    fn utf8(&self, bytes: Vec<u8>, line: usize) -> ConfResult<String> {
        String::from_utf8(bytes)
            .map_err(|_| ConfError::syntax("invalid UTF-8 in argument", self.location_at(line)))
    }
}
