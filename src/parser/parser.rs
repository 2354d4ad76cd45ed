//! Recursive-Descent Parser for the Shell Grammar
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! list     := and_or ((';' | '&' | newline) and_or)* [';' | '&']
//! and_or   := pipeline (('&&' | '||') pipeline)*     (left-associative)
//! pipeline := ['!'] command ('|' command)*
//! command  := simple | '(' list ')' | '{' list '}' | '{#' tag text '}'
//! simple   := word+
//! ```
//!
//! A trailing `&` marks the preceding and_or item as `Background`. The
//! parser produces one [`Program`] per call; feeding it one line at a
//! time is the caller's business.

use log::debug;

use crate::ast::{Command, InterpreterKind, Program, Word};
use crate::parser::lexer::{Lexer, Token, TokenType};
use crate::parser::types::ParseException;

/// Parse one unit of shell text into a [`Program`].
pub fn parse(input: &str) -> Result<Program, ParseException> {
    Parser::new(input)?.parse_program()
}

impl Program {
    /// Parse shell text with the primary grammar.
    pub fn parse(input: &str) -> Result<Program, ParseException> {
        parse(input)
    }
}

/// The parser owns the token stream and a cursor into it.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(input: &str) -> Result<Self, ParseException> {
        let tokens = Lexer::new(input).tokenize()?;
        Ok(Self { tokens, pos: 0 })
    }

    fn peek(&self) -> &Token {
        // The lexer guarantees a trailing Eof token.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_type(&self) -> TokenType {
        self.peek().token_type
    }

    fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn skip_newlines(&mut self) {
        while self.peek_type() == TokenType::Newline {
            self.bump();
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseException {
        let token = self.peek();
        ParseException::new(message, token.line, token.column)
    }

    fn expect(&mut self, expected: TokenType) -> Result<Token, ParseException> {
        if self.peek_type() == expected {
            Ok(self.bump())
        } else {
            Err(self.error(format!(
                "expected '{}', found '{}'",
                expected.as_str(),
                self.peek().raw
            )))
        }
    }

    /// Parse the whole input as one program.
    pub fn parse_program(&mut self) -> Result<Program, ParseException> {
        let commands = self.parse_list(None)?;
        debug!("parsed {} top-level command(s)", commands.len());
        Ok(Program::new(commands))
    }

    /// Parse a command list, stopping at `terminator` (or EOF when none).
    /// The terminator token is consumed.
    fn parse_list(
        &mut self,
        terminator: Option<TokenType>,
    ) -> Result<Vec<Command>, ParseException> {
        let mut commands = Vec::new();
        loop {
            self.skip_newlines();
            match self.peek_type() {
                TokenType::Eof => break,
                t if Some(t) == terminator => break,
                _ => {}
            }

            let command = self.parse_and_or()?;
            if self.peek_type() == TokenType::Amp {
                self.bump();
                commands.push(Command::Background(Box::new(command)));
                continue;
            }
            commands.push(command);

            match self.peek_type() {
                TokenType::Semi | TokenType::Newline => {
                    self.bump();
                }
                TokenType::Eof => {}
                t if Some(t) == terminator => {}
                _ => {
                    return Err(self.error(format!(
                        "unexpected token '{}'",
                        self.peek().raw
                    )))
                }
            }
        }
        if let Some(t) = terminator {
            self.expect(t)?;
        }
        Ok(commands)
    }

    /// `pipeline (('&&' | '||') pipeline)*`, folded left to right.
    fn parse_and_or(&mut self) -> Result<Command, ParseException> {
        let mut left = self.parse_pipeline()?;
        loop {
            match self.peek_type() {
                TokenType::AndAnd => {
                    self.bump();
                    self.skip_newlines();
                    let right = self.parse_pipeline()?;
                    left = Command::And(Box::new(left), Box::new(right));
                }
                TokenType::OrOr => {
                    self.bump();
                    self.skip_newlines();
                    let right = self.parse_pipeline()?;
                    left = Command::Or(Box::new(left), Box::new(right));
                }
                _ => break,
            }
        }
        Ok(left)
    }

    /// `['!'] command ('|' command)*`; a leading `!` negates the whole
    /// pipeline.
    fn parse_pipeline(&mut self) -> Result<Command, ParseException> {
        let negated = if self.peek_type() == TokenType::Bang {
            self.bump();
            true
        } else {
            false
        };

        let mut stages = vec![self.parse_command()?];
        while self.peek_type() == TokenType::Pipe {
            self.bump();
            self.skip_newlines();
            stages.push(self.parse_command()?);
        }

        let command = if stages.len() == 1 {
            stages.remove(0)
        } else {
            Command::Pipeline(stages)
        };
        Ok(if negated {
            Command::Not(Box::new(command))
        } else {
            command
        })
    }

    fn parse_command(&mut self) -> Result<Command, ParseException> {
        match self.peek_type() {
            TokenType::LParen => {
                self.bump();
                let commands = self.parse_list(Some(TokenType::RParen))?;
                Ok(Command::Subshell(Box::new(Program::new(commands))))
            }
            TokenType::LBrace => {
                self.bump();
                let commands = self.parse_list(Some(TokenType::RBrace))?;
                Ok(Command::Compound(Box::new(Program::new(commands))))
            }
            TokenType::BridgeTag => {
                let tag = self.bump().value;
                let text = if self.peek_type() == TokenType::BridgeText {
                    self.bump().value
                } else {
                    String::new()
                };
                self.expect(TokenType::RBrace)?;
                Ok(Command::Bridgeshell(InterpreterKind::from_tag(&tag), text))
            }
            TokenType::Word => self.parse_simple(),
            TokenType::Eof => Err(self.error("unexpected end of input, expected a command")),
            _ => Err(self.error(format!(
                "expected a command, found '{}'",
                self.peek().raw
            ))),
        }
    }

    fn parse_simple(&mut self) -> Result<Command, ParseException> {
        let mut words = Vec::new();
        while self.peek_type() == TokenType::Word {
            let token = self.bump();
            words.push(Word {
                text: token.value,
                raw: token.raw,
                quoted: token.quoted,
                single_quoted: token.single_quoted,
            });
        }
        Ok(Command::Simple(words))
    }
}
