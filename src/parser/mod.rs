//! Parser module for shell programs
//!
//! This module contains the lexer and the recursive-descent parser.

pub mod types;
pub mod lexer;
pub mod parser;

pub use lexer::{Lexer, Token, TokenType};
pub use parser::{parse, Parser};
pub use types::{LexerError, ParseException};
