//! Lexer (tokenizer) for the Java-like subset
//!
//! Converts raw source text into a flat [`Token`] stream consumed by the
//! predictive parser. Unlike a fail-fast scanner, errors are collected next to
//! the tokens: an illegal character is reported and skipped, and only an
//! unterminated block comment stops the scan.
//!
//! Overlapping prefixes are resolved in a fixed order: block comment, line
//! comment, integer literal, identifier/keyword, `==`, newline, whitespace,
//! punctuation, single-character operator, and finally the illegal-character
//! fallback.

use super::grammar::{Symbol, END_MARKER, ID, NUMBER};
use std::fmt;
use thiserror::Error;

/// Keywords are reclassified from identifiers to their literal terminal.
pub const KEYWORDS: [Symbol; 4] = ["class", "int", "void", "return"];

/// 1-based line and column of a token or error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{} C{}", self.line, self.column)
    }
}

/// A lexeme classified by the terminal symbol it stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Terminal symbol (`id`, `number`, a keyword, operator or punctuation)
    pub kind: Symbol,
    pub lexeme: String,
    pub location: SourceLocation,
}

impl Token {
    pub fn new(kind: Symbol, lexeme: impl Into<String>, location: SourceLocation) -> Self {
        Token {
            kind,
            lexeme: lexeme.into(),
            location,
        }
    }

    /// The `$` token the parser appends after the last real token.
    pub fn end_of_input(location: SourceLocation) -> Self {
        Token::new(END_MARKER, END_MARKER, location)
    }

    pub fn is_end_of_input(&self) -> bool {
        self.kind == END_MARKER
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind == self.lexeme {
            write!(f, "'{}'", self.lexeme)
        } else {
            write!(f, "{} '{}'", self.kind, self.lexeme)
        }
    }
}

/// What went wrong while scanning
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexErrorKind {
    #[error("illegal character '{0}'")]
    IllegalCharacter(char),

    #[error("unterminated block comment")]
    UnterminatedComment,
}

/// A scan error anchored at the offending character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub location: SourceLocation,
}

impl LexError {
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Lexer error at line {}, column {}: {}",
            self.location.line, self.location.column, self.kind
        )
    }
}

impl std::error::Error for LexError {}

/// Everything a scan produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexOutput {
    pub tokens: Vec<Token>,
    pub errors: Vec<LexError>,
    /// Total processed lines (newline count plus one)
    pub lines: usize,
}

/// Lexer for the Java-like subset
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    /// Index of the first character of the current line
    line_start: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            line_start: 0,
        }
    }

    /// Tokenize the entire input, collecting errors instead of stopping at them
    pub fn tokenize(&mut self) -> LexOutput {
        let mut tokens: Vec<Token> = Vec::new();
        let mut errors: Vec<LexError> = Vec::new();

        while let Some(ch) = self.peek() {
            let loc = self.location();

            match ch {
                '/' if self.peek_ahead(1) == Some('*') => {
                    if !self.skip_block_comment() {
                        errors.push(LexError {
                            kind: LexErrorKind::UnterminatedComment,
                            location: loc,
                        });
                        break;
                    }
                }
                '/' if self.peek_ahead(1) == Some('/') => self.skip_line_comment(),
                '0'..='9' => tokens.push(self.number_literal(loc)),
                'a'..='z' | 'A'..='Z' | '_' => tokens.push(self.identifier_or_keyword(loc)),
                '=' if self.peek_ahead(1) == Some('=') => {
                    self.advance();
                    self.advance();
                    tokens.push(Token::new("==", "==", loc));
                }
                '\n' | ' ' | '\t' | '\r' => {
                    self.advance();
                }
                _ => {
                    self.advance();
                    match single_char_terminal(ch) {
                        Some(kind) => tokens.push(Token::new(kind, kind, loc)),
                        None => {
                            log::trace!("illegal character {:?} at {}", ch, loc);
                            errors.push(LexError {
                                kind: LexErrorKind::IllegalCharacter(ch),
                                location: loc,
                            });
                        }
                    }
                }
            }
        }

        let lines = self.input.iter().filter(|&&c| c == '\n').count() + 1;
        log::debug!(
            "lexed {} tokens with {} errors over {} lines",
            tokens.len(),
            errors.len(),
            lines
        );

        LexOutput {
            tokens,
            errors,
            lines,
        }
    }

    fn number_literal(&mut self, loc: SourceLocation) -> Token {
        let mut digits = String::new();
        while let Some(ch) = self.peek().filter(char::is_ascii_digit) {
            digits.push(ch);
            self.advance();
        }
        Token::new(NUMBER, digits, loc)
    }

    /// Keywords are recognized after the whole word is read.
    fn identifier_or_keyword(&mut self, loc: SourceLocation) -> Token {
        let mut word = String::new();
        while let Some(ch) = self
            .peek()
            .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
        {
            word.push(ch);
            self.advance();
        }

        let kind = KEYWORDS
            .iter()
            .copied()
            .find(|keyword| *keyword == word)
            .unwrap_or(ID);
        Token::new(kind, word, loc)
    }

    /// Stops before the newline so line tracking sees it.
    fn skip_line_comment(&mut self) {
        while self.peek().is_some_and(|ch| ch != '\n') {
            self.advance();
        }
    }

    /// False when input ends before `*/`.
    fn skip_block_comment(&mut self) -> bool {
        self.position += 2;

        while self.position < self.input.len() {
            if self.input[self.position..].starts_with(&['*', '/']) {
                self.advance();
                self.advance();
                return true;
            }
            self.advance();
        }
        false
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Consumes one character; a newline starts a new line.
    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;
        if ch == '\n' {
            self.line += 1;
            self.line_start = self.position;
        }
        Some(ch)
    }

    /// Column is the offset from the most recent newline
    fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.position - self.line_start + 1)
    }
}

/// Punctuation `{ } ( ) , ;` and operators `+ - * / = < >`
fn single_char_terminal(ch: char) -> Option<Symbol> {
    let kind = match ch {
        '{' => "{",
        '}' => "}",
        '(' => "(",
        ')' => ")",
        ',' => ",",
        ';' => ";",
        '+' => "+",
        '-' => "-",
        '*' => "*",
        '/' => "/",
        '=' => "=",
        '<' => "<",
        '>' => ">",
        _ => return None,
    };
    Some(kind)
}

/// Convenience wrapper around [`Lexer::tokenize`]
pub fn tokenize(source: &str) -> LexOutput {
    Lexer::new(source).tokenize()
}
