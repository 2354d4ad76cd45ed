//! Parser Types
//!
//! Shared error types used by the lexer and parser. Both carry a source
//! position so the embedding layer can point at the offending input.

use std::fmt;
use thiserror::Error;

/// Error thrown when the lexer encounters invalid input.
#[derive(Debug, Clone, Error)]
pub struct LexerError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for LexerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl LexerError {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

/// Error produced when parsing fails.
#[derive(Debug, Clone, Error)]
pub struct ParseException {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for ParseException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "parse error at {}:{}: {}",
            self.line, self.column, self.message
        )
    }
}

impl ParseException {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

impl From<LexerError> for ParseException {
    fn from(e: LexerError) -> Self {
        ParseException::new(e.message, e.line, e.column)
    }
}
